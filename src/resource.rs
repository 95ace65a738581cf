//! Canonical resource identity derived from raw state entries.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::providers;

/// Grammar for resource keys: `type.name` with an optional numeric or
/// free-form counter segment. Anchored at both ends so ambiguous keys are
/// rejected rather than partially matched.
static NAME_PARSER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w-]+)\.([\w-]+)(?:\.(\d+|\S+))?$").expect("name grammar is valid"));

/// A resource key that does not match the naming grammar. Recoverable: the
/// caller logs and skips the resource.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("couldn't parse resource key: {0}")]
pub struct NameParseError(pub String);

/// Resolution overrides, passed in explicitly rather than read from the
/// environment inside the core.
#[derive(Debug, Clone, Default)]
pub struct ResolveConfig {
    /// Attribute key that bypasses the built-in address fallback list.
    pub address_key: Option<String>,
    /// Attribute key used as the group-membership name instead of the
    /// resolved address.
    pub hostname_key: Option<String>,
}

/// A provisioned resource, normalized from either state schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub resource_type: String,
    pub base_name: String,
    /// Numeric counter from the key's third segment; zero when the segment
    /// is absent or non-numeric.
    pub counter: u64,
    /// String counter from the key's third segment; empty when the segment
    /// is absent or numeric.
    pub counter_str: String,
    /// Flat attribute map, in the legacy string-to-string encoding.
    pub attributes: BTreeMap<String, String>,
    /// Resolved reachable address. Never empty: resources that fail to
    /// resolve an address are dropped during normalization.
    pub address: String,
    /// Group-membership key: the hostname-key override when it resolves to a
    /// non-empty attribute, else the address.
    pub hostname: String,
    pub tags: BTreeMap<String, String>,
}

impl Resource {
    /// Builds a canonical resource from a raw key and attribute map.
    ///
    /// Returns `Ok(None)` when no address resolves, which marks the resource
    /// unsupported; it must not appear in any group.
    pub fn new(
        key: &str,
        attributes: BTreeMap<String, String>,
        config: &ResolveConfig,
    ) -> Result<Option<Resource>, NameParseError> {
        let caps = NAME_PARSER
            .captures(key)
            .ok_or_else(|| NameParseError(key.to_string()))?;

        let resource_type = caps[1].to_string();
        let base_name = caps[2].to_string();
        let (counter, counter_str) = match caps.get(3) {
            Some(m) => match m.as_str().parse::<u64>() {
                Ok(n) => (n, String::new()),
                Err(_) => (0, m.as_str().to_string()),
            },
            None => (0, String::new()),
        };

        let Some(address) = providers::resolve_address(&attributes, config.address_key.as_deref())
        else {
            return Ok(None);
        };

        let hostname = config
            .hostname_key
            .as_deref()
            .and_then(|key| attributes.get(key))
            .filter(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| address.clone());

        let tags = providers::extract_tags(&resource_type, &attributes);

        Ok(Some(Resource {
            resource_type,
            base_name,
            counter,
            counter_str,
            attributes,
            address,
            hostname,
            tags,
        }))
    }

    /// The base name qualified with its counter segment, e.g. `web.0` or
    /// `web.primary`. Resources created without a count still get `.0`.
    pub fn name_with_counter(&self) -> String {
        if self.counter_str.is_empty() {
            format!("{}.{}", self.base_name, self.counter)
        } else {
            format!("{}.{}", self.base_name, self.counter_str)
        }
    }
}
