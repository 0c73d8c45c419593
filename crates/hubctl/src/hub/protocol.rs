//! Wire types of the hub's REST API.
//!
//! - `GET /states` returns a list of [`Entity`]
//! - `GET /services` returns a list of [`ServiceCapability`]
//! - `POST /services/{domain}/{service}` returns a list of [`ServiceResult`]

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Split `domain.name` on the first dot.
///
/// Without a dot the whole string is the name and the domain is empty. The
/// name keeps any further dots.
pub fn split_entity_id(id: &str) -> (&str, &str) {
    match id.split_once('.') {
        Some((domain, name)) => (domain, name),
        None => ("", id),
    }
}

/// Services the executors invoke.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum Service {
    TurnOn,
    TurnOff,
    Toggle,
    VolumeSet,
    SetTemperature,
    PlayMedia,
}

/// An entity as listed by `GET /states`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Entity {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    pub fn domain(&self) -> &str {
        split_entity_id(&self.entity_id).0
    }

    pub fn name(&self) -> &str {
        split_entity_id(&self.entity_id).1
    }

    /// Attribute value, treating an explicit `null` like a missing attribute.
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }
}

/// The services a domain exposes, as listed by `GET /services`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceCapability {
    pub domain: String,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServiceInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One changed entity in the response to a service call.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceResult {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: ResultAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ResultAttributes {
    #[serde(default)]
    pub friendly_name: Option<String>,
}
