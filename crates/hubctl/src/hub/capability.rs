//! Queries over the service and entity listings.

use std::collections::BTreeSet;

use super::protocol::Entity;
use super::protocol::Service;
use super::protocol::ServiceCapability;

/// A read-only view of one pair of listings.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities<'a> {
    services: &'a [ServiceCapability],
    entities: &'a [Entity],
}

impl<'a> Capabilities<'a> {
    pub fn new(services: &'a [ServiceCapability], entities: &'a [Entity]) -> Self {
        Self { services, entities }
    }

    /// Whether `domain` exists and exposes `service`. An unknown domain is
    /// simply `false`.
    pub fn domain_has_service(&self, domain: &str, service: Service) -> bool {
        self.services
            .iter()
            .find(|c| c.domain == domain)
            .is_some_and(|c| c.services.contains_key(service.as_ref()))
    }

    pub fn domains_with_service(&self, service: Service) -> BTreeSet<&'a str> {
        self.services
            .iter()
            .filter(|c| c.services.contains_key(service.as_ref()))
            .map(|c| c.domain.as_str())
            .collect()
    }

    /// Whether the entity listing contains exactly `domain.name`.
    pub fn entity_belongs_to_domain(&self, name: &str, domain: &str) -> bool {
        self.entities
            .iter()
            .any(|e| e.domain() == domain && e.name() == name)
    }

    /// Entities whose domain offers `service`, in listing order.
    pub fn entities_with_service(&self, service: Service) -> impl Iterator<Item = &'a Entity> {
        let domains = self.domains_with_service(service);
        self.entities
            .iter()
            .filter(move |e| domains.contains(e.domain()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (Vec<ServiceCapability>, Vec<Entity>) {
        let services =
            serde_json::from_str(include_str!("../../tests/testdata/services.json")).unwrap();
        let entities =
            serde_json::from_str(include_str!("../../tests/testdata/states.json")).unwrap();
        (services, entities)
    }

    #[test]
    fn test_domain_has_service() {
        let (services, entities) = fixtures();
        let caps = Capabilities::new(&services, &entities);
        assert!(caps.domain_has_service("light", Service::TurnOn));
        assert!(caps.domain_has_service("media_player", Service::VolumeSet));
        assert!(!caps.domain_has_service("sensor", Service::TurnOn));
        assert!(!caps.domain_has_service("light", Service::VolumeSet));
        assert!(!caps.domain_has_service("no_such_domain", Service::TurnOn));
    }

    #[test]
    fn test_domains_with_service() {
        let (services, entities) = fixtures();
        let caps = Capabilities::new(&services, &entities);
        let domains: Vec<_> = caps.domains_with_service(Service::TurnOn).into_iter().collect();
        assert_eq!(domains, vec!["climate", "light", "media_player", "switch"]);
        let domains: Vec<_> = caps.domains_with_service(Service::SetTemperature).into_iter().collect();
        assert_eq!(domains, vec!["climate"]);
    }

    #[test]
    fn test_entity_belongs_to_domain() {
        let (services, entities) = fixtures();
        let caps = Capabilities::new(&services, &entities);
        assert!(caps.entity_belongs_to_domain("bedroom_main", "light"));
        assert!(!caps.entity_belongs_to_domain("bedroom_main", "switch"));
        assert!(!caps.entity_belongs_to_domain("bedroom", "light"));
    }

    #[test]
    fn test_entities_with_service() {
        let (services, entities) = fixtures();
        let caps = Capabilities::new(&services, &entities);
        let ids: Vec<_> = caps
            .entities_with_service(Service::VolumeSet)
            .map(|e| e.entity_id.as_str())
            .collect();
        assert_eq!(ids, vec!["media_player.living_room_speaker", "media_player.kitchen_radio"]);
    }

    #[test]
    fn test_empty_listings() {
        let caps = Capabilities::new(&[], &[]);
        assert!(!caps.domain_has_service("light", Service::TurnOn));
        assert!(caps.domains_with_service(Service::TurnOn).is_empty());
        assert_eq!(caps.entities_with_service(Service::TurnOn).count(), 0);
    }
}
