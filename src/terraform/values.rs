//! Values state schema (Terraform >= 0.12): a recursive module graph under
//! `values.root_module`, with arbitrary-JSON resource values.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::resource::ResolveConfig;

use super::state::{self, FormatError, Output, UniformView};

#[derive(Debug, Deserialize)]
pub(super) struct ValuesState {
    values: Option<ValuesRoot>,
}

#[derive(Debug, Deserialize)]
struct ValuesRoot {
    root_module: Option<Module>,
    #[serde(default)]
    outputs: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Module {
    #[serde(default)]
    resources: Vec<ResourceNode>,
    #[serde(default)]
    child_modules: Vec<Module>,
    /// Empty for the root module, else e.g. `module.mymodulename`.
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
struct ResourceNode {
    #[serde(default)]
    address: String,
    /// Set only for counted resources.
    index: Option<Value>,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    resource_type: String,
    #[serde(default, rename = "values")]
    raw_values: Map<String, Value>,
}

pub(super) fn parse(raw: &[u8]) -> Result<ValuesState, FormatError> {
    let parsed: ValuesState = serde_json::from_slice(raw)?;
    if parsed.root_module().is_none() {
        return Err(FormatError::NoRootModule);
    }
    Ok(parsed)
}

impl ValuesState {
    fn root_module(&self) -> Option<&Module> {
        self.values.as_ref()?.root_module.as_ref()
    }

    pub(super) fn normalize(&self, config: &ResolveConfig) -> UniformView {
        let mut view = UniformView::default();
        let Some(root) = self.root_module() else {
            return view;
        };

        let mut modules = Vec::new();
        collect_modules(&mut modules, root);

        view.id_names = id_names(&modules);

        for module in &modules {
            for node in &module.resources {
                // Nodes without a string id are not materialized resources.
                let Some(Value::String(_)) = node.raw_values.get("id") else {
                    continue;
                };
                if node.address.starts_with(state::DATA_SOURCE_PREFIX) {
                    continue;
                }
                let key = node.key(&module.address);
                let attributes = flatten_values(&node.raw_values);
                if let Some(resource) = state::build_resource(&key, attributes, config) {
                    view.resources.push(resource);
                }
            }
        }

        if let Some(values) = &self.values {
            for (key, value) in &values.outputs {
                view.outputs.push(Output {
                    key: key.clone(),
                    value: state::unwrap_output_value(value),
                    module_path: String::new(),
                });
            }
        }

        view.resources.sort_by(|a, b| a.base_name.cmp(&b.base_name));
        view
    }
}

fn collect_modules<'a>(out: &mut Vec<&'a Module>, module: &'a Module) {
    out.push(module);
    for child in &module.child_modules {
        collect_modules(out, child);
    }
}

impl ResourceNode {
    /// Builds a legacy-style resource key: `type.<module-prefix><name>` plus
    /// the node's counter segment when indexed. The module address supplies
    /// the same disambiguation the legacy schema gets from its path.
    fn key(&self, module_address: &str) -> String {
        let prefix = if module_address.is_empty() {
            String::new()
        } else {
            format!("{}_", module_address.replace('.', "_"))
        };
        let mut key = format!("{}.{}{}", self.resource_type, prefix, self.name);

        match &self.index {
            None => {}
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)) {
                    key.push_str(&format!(".{i}"));
                }
            }
            Some(Value::String(s)) => {
                key.push_str(&format!(".{}", s.replace('.', "_")));
            }
            Some(other) => {
                tracing::warn!(index = %other, address = %self.address, "unknown index type");
            }
        }

        key
    }
}

/// Flattens arbitrary-JSON resource values into the legacy flat string map.
/// Maps and lists gain a `key.#` count marker plus stringified entries;
/// values that are not strings become the error sentinel.
fn flatten_values(values: &Map<String, Value>) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();

    for (key, value) in values {
        match value {
            Value::String(s) => {
                attrs.insert(key.clone(), s.clone());
            }
            Value::Object(map) => {
                attrs.insert(format!("{key}.#"), map.len().to_string());
                for (sub, nested) in map {
                    attrs.insert(format!("{key}.{sub}"), string_or_error(nested));
                }
            }
            Value::Array(items) => {
                attrs.insert(format!("{key}.#"), items.len().to_string());
                for (i, item) in items.iter().enumerate() {
                    if let Value::Object(map) = item {
                        for (sub, nested) in map {
                            attrs.insert(format!("{key}.{i}.{sub}"), string_or_error(nested));
                        }
                    } else {
                        attrs.insert(format!("{key}.{i}"), string_or_error(item));
                    }
                }
            }
            _ => {
                attrs.insert(key.clone(), state::ERROR_SENTINEL.to_string());
            }
        }
    }

    attrs
}

fn string_or_error(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        _ => state::ERROR_SENTINEL.to_string(),
    }
}

/// Lowercased id mapped to resource name, across all modules. A vsphere_tag
/// whose `category_id` matches another resource renders as
/// `<categoryName>_<name>` so tag groups read as qualified names.
fn id_names(modules: &[&Module]) -> BTreeMap<String, String> {
    let mut names = BTreeMap::new();

    let name_of_id = |wanted: &str| -> Option<&str> {
        modules
            .iter()
            .flat_map(|m| &m.resources)
            .find_map(|node| match node.raw_values.get("id") {
                Some(Value::String(id)) if id == wanted && !node.name.is_empty() => {
                    Some(node.name.as_str())
                }
                _ => None,
            })
    };

    for node in modules.iter().flat_map(|m| &m.resources) {
        let Some(Value::String(id)) = node.raw_values.get("id") else {
            continue;
        };
        if id.is_empty() || node.name.is_empty() {
            continue;
        }

        if node.resource_type == "vsphere_tag" {
            if let Some(Value::String(category_id)) = node.raw_values.get("category_id") {
                if let Some(category_name) = name_of_id(category_id) {
                    names.insert(
                        id.to_lowercase(),
                        format!("{}_{}", category_name, node.name),
                    );
                    continue;
                }
            }
        }

        names.insert(id.to_lowercase(), node.name.clone());
    }

    names
}
