//! Inventory group aggregation.
//!
//! Five group families are computed independently and merged into one flat
//! namespace: the umbrella `all` group, per-`base.counter` individual groups,
//! per-base ordered groups, per-type groups, and per-tag groups. The merge is
//! last-write-wins in that order; every overwrite is reported as a collision
//! record so the caller can decide how loudly to complain.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::resource::Resource;
use crate::terraform::UniformView;

/// The umbrella group: every host plus state outputs as variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllGroup {
    pub hosts: Vec<String>,
    pub vars: Map<String, Value>,
}

/// A named inventory group. Everything except `all` is a plain host list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Group {
    All(AllGroup),
    Hosts(Vec<String>),
}

impl Group {
    pub fn hosts(&self) -> &[String] {
        match self {
            Group::All(all) => &all.hosts,
            Group::Hosts(hosts) => hosts,
        }
    }
}

/// Which family asserted a name; reported alongside collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFamily {
    Vars,
    Individual,
    Ordered,
    Type,
    Tag,
}

impl fmt::Display for GroupFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupFamily::Vars => "all:vars",
            GroupFamily::Individual => "individual",
            GroupFamily::Ordered => "ordered",
            GroupFamily::Type => "type",
            GroupFamily::Tag => "tag",
        })
    }
}

/// A name overwritten during aggregation. The later entry always wins; these
/// records exist so the caller can log or ignore the overwrite.
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub family: GroupFamily,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateOptions {
    /// Remap a tag group's name to another resource's name when the tag
    /// value equals that resource's id. A narrow heuristic for reference-type
    /// tags (vSphere tag urns); off unless explicitly enabled.
    pub resolve_tag_aliases: bool,
}

#[derive(Debug, Default)]
pub struct Aggregation {
    pub groups: BTreeMap<String, Group>,
    pub collisions: Vec<Collision>,
}

/// Computes every group family from the uniform view and merges them.
///
/// Set-like families (all, individual, type, tag) hold deduplicated,
/// lexically sorted host lists; ordered groups keep ascending counter order
/// with ties broken by encounter order.
pub fn aggregate(view: &UniformView, options: AggregateOptions) -> Aggregation {
    let mut collisions = Vec::new();

    let mut all_hosts: BTreeSet<String> = BTreeSet::new();
    let mut individual: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_base: BTreeMap<String, Vec<&Resource>> = BTreeMap::new();
    let mut types: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut tags: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for resource in &view.resources {
        let host = resource.hostname.clone();

        all_hosts.insert(host.clone());

        types
            .entry(format!("type_{}", resource.resource_type))
            .or_default()
            .insert(host.clone());

        by_base
            .entry(resource.base_name.clone())
            .or_default()
            .push(resource);

        let name = resource.name_with_counter();
        if individual
            .insert(name.clone(), vec![host.clone()])
            .is_some()
        {
            collisions.push(Collision {
                family: GroupFamily::Individual,
                name,
            });
        }

        for (key, value) in &resource.tags {
            let mut name = if value.is_empty() {
                key.clone()
            } else {
                format!("{key}_{value}")
            };
            if options.resolve_tag_aliases {
                if let Some(alias) = view.id_names.get(value) {
                    name = alias.clone();
                }
            }
            tags.entry(name).or_default().insert(host.clone());
        }
    }

    let mut vars = Map::new();
    for output in &view.outputs {
        if vars
            .insert(output.key.clone(), output.value.clone())
            .is_some()
        {
            collisions.push(Collision {
                family: GroupFamily::Vars,
                name: output.key.clone(),
            });
        }
    }

    let mut ordered: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (base, mut members) in by_base {
        members.sort_by_key(|r| r.counter); // stable: ties keep encounter order
        ordered.insert(base, members.iter().map(|r| r.hostname.clone()).collect());
    }

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    groups.insert(
        "all".to_string(),
        Group::All(AllGroup {
            hosts: all_hosts.into_iter().collect(),
            vars,
        }),
    );

    merge_family(
        &mut groups,
        GroupFamily::Individual,
        individual.into_iter().map(|(n, h)| (n, Group::Hosts(h))),
        &mut collisions,
    );
    merge_family(
        &mut groups,
        GroupFamily::Ordered,
        ordered.into_iter().map(|(n, h)| (n, Group::Hosts(h))),
        &mut collisions,
    );
    merge_family(
        &mut groups,
        GroupFamily::Type,
        types
            .into_iter()
            .map(|(n, h)| (n, Group::Hosts(h.into_iter().collect()))),
        &mut collisions,
    );
    merge_family(
        &mut groups,
        GroupFamily::Tag,
        tags.into_iter()
            .map(|(n, h)| (n, Group::Hosts(h.into_iter().collect()))),
        &mut collisions,
    );

    Aggregation { groups, collisions }
}

/// Merges one family into the flat namespace. Later entries win; each
/// overwrite is recorded with the family that fired it.
fn merge_family(
    groups: &mut BTreeMap<String, Group>,
    family: GroupFamily,
    family_groups: impl IntoIterator<Item = (String, Group)>,
    collisions: &mut Vec<Collision>,
) {
    for (name, group) in family_groups {
        if groups.insert(name.clone(), group).is_some() {
            collisions.push(Collision { family, name });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResolveConfig;
    use crate::terraform::normalize;

    fn aggregate_doc(doc: &str) -> Aggregation {
        let view = normalize(doc.as_bytes(), &ResolveConfig::default()).unwrap();
        aggregate(
            &view,
            AggregateOptions {
                resolve_tag_aliases: true,
            },
        )
    }

    fn hosts<'a>(agg: &'a Aggregation, name: &str) -> &'a [String] {
        agg.groups
            .get(name)
            .unwrap_or_else(|| panic!("missing group {name}"))
            .hosts()
    }

    const TWO_INSTANCE_DOC: &str = r#"{"modules": [{"path": ["root"], "resources": {
        "aws_instance.one.0": {"type": "aws_instance", "primary": {
            "id": "i-aaaaaaaa",
            "attributes": {"id": "i-aaaaaaaa", "private_ip": "10.0.0.1", "tags.#": "1", "tags.Role": "Web"}}},
        "aws_instance.one.1": {"type": "aws_instance", "primary": {
            "id": "i-a1a1a1a1",
            "attributes": {"id": "i-a1a1a1a1", "private_ip": "10.0.1.1"}}}
    }}]}"#;

    #[test]
    fn test_aggregate_two_instances() {
        let agg = aggregate_doc(TWO_INSTANCE_DOC);

        assert_eq!(hosts(&agg, "all"), ["10.0.0.1", "10.0.1.1"]);
        assert_eq!(hosts(&agg, "one"), ["10.0.0.1", "10.0.1.1"]);
        assert_eq!(hosts(&agg, "one.0"), ["10.0.0.1"]);
        assert_eq!(hosts(&agg, "one.1"), ["10.0.1.1"]);
        assert_eq!(hosts(&agg, "type_aws_instance"), ["10.0.0.1", "10.0.1.1"]);
        assert_eq!(hosts(&agg, "role_web"), ["10.0.0.1"]);
        assert!(agg.collisions.is_empty());
    }

    #[test]
    fn test_ordered_group_counter_order() {
        // Encounter order 0, 2, 1; ordered group must list 0, 1, 2.
        let agg = aggregate_doc(
            r#"{"modules": [{"path": ["root"], "resources": {
                "aws_instance.base.0": {"type": "aws_instance", "primary": {"id": "a", "attributes": {"public_ip": "10.0.0.0"}}},
                "aws_instance.base.2": {"type": "aws_instance", "primary": {"id": "b", "attributes": {"public_ip": "10.0.0.2"}}},
                "aws_instance.base.1": {"type": "aws_instance", "primary": {"id": "c", "attributes": {"public_ip": "10.0.0.1"}}}
            }}]}"#,
        );
        assert_eq!(hosts(&agg, "base"), ["10.0.0.0", "10.0.0.1", "10.0.0.2"]);
    }

    #[test]
    fn test_individual_collision_keeps_latest() {
        // Module paths collapse to the same base.counter.
        let agg = aggregate_doc(
            r#"{"modules": [
                {"path": ["root"], "resources": {
                    "aws_instance.dup.0": {"type": "aws_instance", "primary": {"id": "a", "attributes": {"public_ip": "1.1.1.1"}}}}},
                {"path": ["root"], "resources": {
                    "aws_instance.dup.0": {"type": "aws_instance", "primary": {"id": "b", "attributes": {"public_ip": "2.2.2.2"}}}}}
            ]}"#,
        );
        assert_eq!(hosts(&agg, "dup.0"), ["2.2.2.2"]);
        assert!(agg
            .collisions
            .iter()
            .any(|c| c.family == GroupFamily::Individual && c.name == "dup.0"));
    }

    #[test]
    fn test_output_vars_last_write_wins() {
        let agg = aggregate_doc(
            r#"{"modules": [
                {"path": ["root"], "resources": {}, "outputs": {"env": "first"}},
                {"path": ["root", "sub"], "resources": {}, "outputs": {"env": "second"}}
            ]}"#,
        );
        let Some(Group::All(all)) = agg.groups.get("all") else {
            panic!("missing all group");
        };
        assert_eq!(all.vars.get("env"), Some(&serde_json::json!("second")));
        assert!(agg
            .collisions
            .iter()
            .any(|c| c.family == GroupFamily::Vars && c.name == "env"));
    }

    #[test]
    fn test_valueless_and_key_value_tag_names() {
        let agg = aggregate_doc(
            r#"{"modules": [{"path": ["root"], "resources": {
                "digitalocean_droplet.three": {"type": "digitalocean_droplet", "primary": {
                    "id": "d", "attributes": {"ipv4_address": "192.168.0.3", "tags.#": "1", "tags.0": "Webserver"}}},
                "aws_instance.one": {"type": "aws_instance", "primary": {
                    "id": "i", "attributes": {"private_ip": "10.0.0.1", "tags.Role": "Web"}}}
            }}]}"#,
        );
        assert_eq!(hosts(&agg, "webserver"), ["192.168.0.3"]);
        assert_eq!(hosts(&agg, "role_web"), ["10.0.0.1"]);
    }

    #[test]
    fn test_tag_alias_resolution() {
        let doc = r#"{"modules": [{"path": ["root"], "resources": {
            "vsphere_virtual_machine.twelve": {"type": "vsphere_virtual_machine", "primary": {
                "id": "422cfa4a", "attributes": {
                    "default_ip_address": "10.20.30.50",
                    "tags.#": "1",
                    "tags.1357913579": "urn:vmomi:Tag:GLOBAL"}}},
            "data.vsphere_tag.testTag1": {"type": "vsphere_tag", "primary": {
                "id": "urn:vmomi:Tag:GLOBAL", "attributes": {"name": "testTag1"}}}
        }}]}"#;

        let agg = aggregate_doc(doc);
        assert_eq!(hosts(&agg, "testTag1"), ["10.20.30.50"]);

        // Disabled, the raw key_value name is kept.
        let view = normalize(doc.as_bytes(), &ResolveConfig::default()).unwrap();
        let agg = aggregate(&view, AggregateOptions::default());
        assert!(agg.groups.contains_key("1357913579_urn:vmomi:tag:global"));
        assert!(!agg.groups.contains_key("testTag1"));
    }

    #[test]
    fn test_all_hosts_deduplicated_and_sorted() {
        let agg = aggregate_doc(
            r#"{"modules": [{"path": ["root"], "resources": {
                "aws_instance.one.0": {"type": "aws_instance", "primary": {"id": "a", "attributes": {"public_ip": "10.0.0.1"}}},
                "aws_instance.two.0": {"type": "aws_instance", "primary": {"id": "b", "attributes": {"public_ip": "10.0.0.1"}}},
                "aws_instance.zzz.0": {"type": "aws_instance", "primary": {"id": "c", "attributes": {"public_ip": "1.0.0.1"}}}
            }}]}"#,
        );
        assert_eq!(hosts(&agg, "all"), ["1.0.0.1", "10.0.0.1"]);
    }

    #[test]
    fn test_vars_empty_when_no_outputs() {
        let agg = aggregate_doc(TWO_INSTANCE_DOC);
        let Some(Group::All(all)) = agg.groups.get("all") else {
            panic!("missing all group");
        };
        assert!(all.vars.is_empty());
    }
}
