//! Legacy modules state schema (Terraform < 0.12): a flat module list with a
//! `path` breadcrumb and string-keyed resource maps.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::resource::ResolveConfig;

use super::state::{self, FormatError, Output, UniformView};

#[derive(Debug, Deserialize)]
pub(super) struct LegacyState {
    modules: Option<Vec<Module>>,
}

#[derive(Debug, Deserialize)]
struct Module {
    #[serde(default)]
    path: Vec<String>,
    #[serde(default)]
    resources: BTreeMap<String, ResourceState>,
    #[serde(default)]
    outputs: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ResourceState {
    primary: InstanceState,
}

#[derive(Debug, Deserialize)]
struct InstanceState {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

pub(super) fn parse(raw: &[u8]) -> Result<LegacyState, FormatError> {
    let parsed: LegacyState = serde_json::from_slice(raw)?;
    match &parsed.modules {
        Some(modules) if !modules.is_empty() => Ok(parsed),
        _ => Err(FormatError::NoModules),
    }
}

impl LegacyState {
    pub(super) fn normalize(&self, config: &ResolveConfig) -> UniformView {
        let mut view = UniformView::default();
        let modules = self.modules.as_deref().unwrap_or_default();

        for module in modules {
            // BTreeMap iteration visits keys in sorted order, keeping the
            // per-module encounter order stable.
            for (key, rs) in &module.resources {
                if key.starts_with(state::DATA_SOURCE_PREFIX) {
                    continue;
                }
                let full_key = qualify_key(key, &module.path);
                if let Some(resource) =
                    state::build_resource(&full_key, rs.primary.attributes.clone(), config)
                {
                    view.resources.push(resource);
                }
            }

            for (key, value) in &module.outputs {
                view.outputs.push(Output {
                    key: key.clone(),
                    value: state::unwrap_output_value(value),
                    module_path: module.path.join("."),
                });
            }

            // Aliases deliberately include data sources: a data.vsphere_tag's
            // name is what tag groups get remapped to.
            for rs in module.resources.values() {
                let id = &rs.primary.id;
                if let Some(name) = rs.primary.attributes.get("name") {
                    if !id.is_empty() && !name.is_empty() {
                        view.id_names.insert(id.to_lowercase(), name.clone());
                    }
                }
            }
        }

        view.resources.sort_by(|a, b| a.base_name.cmp(&b.base_name));
        view
    }
}

/// Injects nested module path segments into the key's name portion,
/// innermost-first, so two instantiations of the same child module cannot
/// produce clashing keys. A root-only path (`["root"]`) adds nothing.
///
/// `aws_instance.host` inside `["root", "application1"]` becomes
/// `aws_instance.application1_host`.
fn qualify_key(key: &str, path: &[String]) -> String {
    let Some(dot) = key.find('.') else {
        return key.to_string();
    };
    if path.len() <= 1 {
        return key.to_string();
    }

    let mut name = key[dot + 1..].to_string();
    for segment in path.iter().skip(1).rev() {
        name = format!("{}_{}", segment.replace('.', "_"), name);
    }
    format!("{}.{}", &key[..dot], name)
}
