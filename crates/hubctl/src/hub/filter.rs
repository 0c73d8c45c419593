//! Narrowing listings for display.

use std::collections::BTreeMap;

use super::protocol::Entity;
use super::protocol::ServiceCapability;

/// Domain to sorted member names, as printed by `hubctl list`.
pub type Tree = BTreeMap<String, Vec<String>>;

/// Keep entities in any of `domains`. An empty filter keeps everything.
pub fn filter_states_by_domains<'a>(states: &'a [Entity], domains: &[String]) -> Vec<&'a Entity> {
    states
        .iter()
        .filter(|e| domains.is_empty() || domains.iter().any(|d| d == e.domain()))
        .collect()
}

/// Keep the listed domains and, within them, the listed services.
///
/// Either filter may be empty to keep everything on that level. Domains left
/// without services are dropped.
pub fn filter_services(
    capabilities: &[ServiceCapability],
    domains: &[String],
    services: &[String],
) -> Vec<ServiceCapability> {
    capabilities
        .iter()
        .filter(|c| domains.is_empty() || domains.contains(&c.domain))
        .filter_map(|c| {
            let mut c = c.clone();
            if !services.is_empty() {
                c.services.retain(|name, _| services.contains(name));
                if c.services.is_empty() {
                    return None;
                }
            }
            Some(c)
        })
        .collect()
}

/// Group entities by domain. With `short_names` members are listed without
/// their domain prefix.
pub fn states_tree<'a>(states: impl IntoIterator<Item = &'a Entity>, short_names: bool) -> Tree {
    let mut tree = Tree::new();
    for entity in states {
        let member = if short_names {
            entity.name()
        } else {
            entity.entity_id.as_str()
        };
        tree.entry(entity.domain().to_string())
            .or_default()
            .push(member.to_string());
    }
    tree.values_mut().for_each(|names| names.sort());
    tree
}

pub fn services_tree<'a>(services: impl IntoIterator<Item = &'a ServiceCapability>) -> Tree {
    services
        .into_iter()
        .map(|c| (c.domain.clone(), c.services.keys().cloned().collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states() -> Vec<Entity> {
        serde_json::from_str(include_str!("../../tests/testdata/states.json")).unwrap()
    }

    fn services() -> Vec<ServiceCapability> {
        serde_json::from_str(include_str!("../../tests/testdata/services.json")).unwrap()
    }

    #[test]
    fn test_filter_states_by_domains() {
        let states = states();
        assert_eq!(filter_states_by_domains(&states, &[]).len(), states.len());

        let climate = filter_states_by_domains(&states, &["climate".to_string()]);
        assert_eq!(climate.len(), 1);
        assert_eq!(climate[0].entity_id, "climate.hallway");
    }

    #[test]
    fn test_filter_services() {
        let services = services();
        let filtered = filter_services(&services, &[], &["volume_set".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].domain, "media_player");
        assert_eq!(filtered[0].services.len(), 1);

        let filtered = filter_services(&services, &["light".to_string()], &[]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].services.len(), 3);
    }

    #[test]
    fn test_states_tree_sorted() {
        let states = states();
        let tree = states_tree(&states, true);
        assert_eq!(
            tree["light"],
            vec!["bedroom_main", "bedroom_other", "livingroom_other"]
        );
        assert_eq!(tree.keys().next().map(String::as_str), Some("climate"));

        let tree = states_tree(&states, false);
        assert_eq!(tree["climate"], vec!["climate.hallway"]);
    }

    #[test]
    fn test_services_tree() {
        let services = services();
        let tree = services_tree(&services);
        assert_eq!(tree["climate"], vec!["set_temperature", "turn_off", "turn_on"]);
    }
}
