//! Inventory rendering: JSON list mode, INI-like inventory mode, and
//! single-host attribute lookup.
//!
//! All three render from already-sorted structures (`BTreeMap` keys,
//! pre-sorted host lists), so identical input bytes always produce identical
//! output bytes.

use std::collections::BTreeMap;

use crate::groups::Group;
use crate::terraform::UniformView;

/// Serializes the whole group map as one JSON object. The `all` group
/// renders as `{"hosts": [...], "vars": {...}}`, every other group as a
/// plain array of addresses.
pub fn render_list(groups: &BTreeMap<String, Group>) -> Result<String, serde_json::Error> {
    serde_json::to_string(groups)
}

/// Renders INI-style inventory text: lexically ordered `[name]` sections,
/// one host per line, and a `[all:vars]` section with JSON-encoded values.
pub fn render_inventory(groups: &BTreeMap<String, Group>) -> Result<String, serde_json::Error> {
    let mut out = String::new();

    for (name, group) in groups {
        out.push_str(&format!("[{name}]\n"));
        for host in group.hosts() {
            out.push_str(host);
            out.push('\n');
        }

        if let Group::All(all) = group {
            out.push('\n');
            out.push_str(&format!("[{name}:vars]\n"));
            for (key, value) in &all.vars {
                let encoded = serde_json::to_string(value)?;
                out.push_str(&format!("{key}={encoded}\n"));
            }
        }

        out.push('\n');
    }

    Ok(out)
}

/// Serves a single-host lookup: the matching resource's full attribute map
/// plus `ansible_host` set to the resolved address. `Ok(None)` when no
/// resource's hostname matches.
pub fn render_host(
    view: &UniformView,
    hostname: &str,
) -> Result<Option<String>, serde_json::Error> {
    let Some(resource) = view.resources.iter().find(|r| r.hostname == hostname) else {
        return Ok(None);
    };

    let mut attributes = resource.attributes.clone();
    attributes.insert("ansible_host".to_string(), resource.address.clone());
    serde_json::to_string(&attributes).map(Some)
}
