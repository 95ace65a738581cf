//! Provider-specific attribute conventions.
//!
//! Terraform providers disagree about where a machine's reachable address
//! lives and how tags are encoded in the flattened attribute map. This module
//! is the registry of those conventions: an ordered address-key fallback list
//! and a per-resource-type table of tag extraction rules. Supporting a new
//! provider means adding entries here, not new branches elsewhere.

use std::collections::BTreeMap;

/// Attribute keys checked, in order, to resolve a resource's address. The
/// first key present with a non-empty value wins.
pub const ADDRESS_KEYS: &[&str] = &[
    "ipv4_address",                                        // DigitalOcean, SoftLayer
    "public_ip",                                           // AWS
    "public_ipv6",                                         // Scaleway
    "ipaddress",                                           // CloudStack
    "ip_address",                                          // VMware, Docker
    "private_ip",                                          // AWS
    "network_interface.0.access_config.0.nat_ip",          // GCE
    "network_interface.0.access_config.0.assigned_nat_ip", // GCE
    "network_interface.0.address",                         // GCE
    "primaryip",                                           // Triton
    "networks.0.ip4address",                               // Exoscale
    "access_ip_v4",                                        // OpenStack
    "floating_ip",                                         // OpenStack
    "network_interface.0.ipv4_address",                    // vSphere
    "default_ip_address",                                  // vSphere >= 1.x
    "ipv4_address_private",                                // SoftLayer
    "network.0.address",                                   // Packet
    "network_interface.0.addresses.0",                     // libvirt
    "primary_ip",                                          // ProfitBricks
];

/// Resolves a resource's reachable address from its attribute map.
///
/// An explicit override key wins when it is present with a non-empty value;
/// otherwise the first non-empty [`ADDRESS_KEYS`] match is returned. `None`
/// means the resource exposes no known address and is unsupported.
pub fn resolve_address(
    attrs: &BTreeMap<String, String>,
    override_key: Option<&str>,
) -> Option<String> {
    if let Some(key) = override_key {
        if let Some(value) = attrs.get(key) {
            if !value.is_empty() {
                return Some(value.clone());
            }
        }
    }

    ADDRESS_KEYS
        .iter()
        .filter_map(|key| attrs.get(*key))
        .find(|value| !value.is_empty())
        .cloned()
}

/// How a provider encodes tags in the flattened attribute map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStyle {
    /// `prefix.Key = Value` pairs, e.g. AWS `tags.Role = "Web"`.
    KeyValue,
    /// `prefix.N = Value` lists with no meaningful key, e.g. DigitalOcean
    /// `tags.0 = "staging"`. Extracted as a tag key with an empty value.
    Valueless,
}

/// One tag extraction rule: scan attribute keys under `prefix.`.
#[derive(Debug, Clone, Copy)]
pub struct TagRule {
    pub prefix: &'static str,
    pub style: TagStyle,
}

const fn kv(prefix: &'static str) -> TagRule {
    TagRule {
        prefix,
        style: TagStyle::KeyValue,
    }
}

const fn valueless(prefix: &'static str) -> TagRule {
    TagRule {
        prefix,
        style: TagStyle::Valueless,
    }
}

/// Tag extraction rules per resource type.
const TAG_RULES: &[(&str, &[TagRule])] = &[
    ("aws_instance", &[kv("tags")]),
    ("aws_spot_instance_request", &[kv("tags")]),
    ("triton_machine", &[kv("tags")]),
    ("openstack_compute_instance_v2", &[kv("metadata")]),
    (
        "vsphere_virtual_machine",
        &[kv("custom_configuration_parameters"), kv("tags")],
    ),
    ("digitalocean_droplet", &[valueless("tags")]),
    ("google_compute_instance", &[valueless("tags")]),
    ("scaleway_server", &[valueless("tags")]),
];

/// Looks up the tag rules registered for a resource type. Unknown types get
/// an empty slice, which extraction treats as "no tags".
pub fn tag_rules(resource_type: &str) -> &'static [TagRule] {
    TAG_RULES
        .iter()
        .find(|(name, _)| *name == resource_type)
        .map_or(&[], |(_, rules)| rules)
}

/// Extracts tags from a resource's attribute map using the rules registered
/// for its type.
///
/// Keys and values are lowercased for stable group naming. The `#` and `%`
/// suffixes Terraform emits as collection-length markers are skipped; they
/// encode counts, not data.
pub fn extract_tags(
    resource_type: &str,
    attrs: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();

    for rule in tag_rules(resource_type) {
        for (key, value) in attrs {
            let Some((prefix, rest)) = key.split_once('.') else {
                continue;
            };
            if prefix != rule.prefix || rest == "#" || rest == "%" {
                continue;
            }
            match rule.style {
                TagStyle::KeyValue => {
                    tags.insert(rest.to_lowercase(), value.to_lowercase());
                }
                TagStyle::Valueless => {
                    tags.insert(value.to_lowercase(), String::new());
                }
            }
        }
    }

    tags
}
