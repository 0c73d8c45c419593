//! One executor per verb.
//!
//! Every executor resolves its target, checks that the domain offers the
//! service and that the entity exists there, builds the payload and calls
//! the hub once. Nothing is sent if any of these checks fail.

mod climate;
mod light;
mod media;
mod power;

pub use light::BrightnessLevel;
pub use light::LightOptions;
pub use media::MEDIA_GRACE;

use hubctl_config::Config;
use hubctl_config::ServeConfig;
use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::hub::HttpTransport;
use crate::hub::HubClient;
use crate::hub::Service;
use crate::hub::Transport;
use crate::resolve::Resolved;
use crate::resolve::Resolver;
use crate::resolve::Target;

/// Outcome of a successful command, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub entity: String,
    pub state: String,
    pub domain: String,
}

impl CommandResult {
    fn new(resolved: Resolved, state: impl Into<String>) -> Self {
        Self {
            entity: resolved.name,
            state: state.into(),
            domain: resolved.domain,
        }
    }
}

pub struct Controller<T: Transport = HttpTransport> {
    hub: HubClient<T>,
    resolver: Resolver,
    serve: ServeConfig,
}

impl Controller<HttpTransport> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            HubClient::from_config(&config.hub)?,
            Resolver::from_config(config),
            config.serve.clone(),
        ))
    }
}

impl<T: Transport> Controller<T> {
    pub fn new(hub: HubClient<T>, resolver: Resolver, serve: ServeConfig) -> Self {
        Self {
            hub,
            resolver,
            serve,
        }
    }

    pub fn hub(&self) -> &HubClient<T> {
        &self.hub
    }

    /// Resolve `target` and make sure it can perform `service`.
    async fn prepare(&self, target: &Target, service: Service) -> Result<Resolved> {
        let resolved = self.resolver.resolve(&self.hub, target, service).await?;
        debug!("Resolved {} to {}", target, resolved.entity_id());

        if !self.hub.domain_has_service(&resolved.domain, service).await? {
            return Err(Error::DomainLacksService {
                domain: resolved.domain,
                service,
            });
        }
        if !self
            .hub
            .entity_belongs_to_domain(&resolved.name, &resolved.domain)
            .await?
        {
            return Err(Error::EntityNotInDomain {
                name: resolved.name,
                domain: resolved.domain,
            });
        }
        Ok(resolved)
    }

    /// Invoke `service` on the resolved entity with any extra `fields`.
    async fn call(&self, resolved: &Resolved, service: Service, fields: Map<String, Value>) -> Result<()> {
        let mut payload = Map::new();
        payload.insert("entity_id".to_string(), Value::String(resolved.entity_id()));
        payload.extend(fields);
        self.hub
            .invoke(&resolved.domain, service, Value::Object(payload))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;

    use hubctl_config::ServeConfig;
    use serde_json::Value;

    use super::Controller;
    use crate::hub::HubClient;
    use crate::hub::MockTransport;
    use crate::resolve::Resolver;

    pub const OK: &str = r#"[]"#;

    pub fn controller(transport: MockTransport) -> Controller<MockTransport> {
        let aliases = BTreeMap::from([("tv".to_string(), "media_player.living_room_speaker".to_string())]);
        Controller::new(
            HubClient::new(transport, "http://hub.test/api", "secret"),
            Resolver::new(aliases, true),
            ServeConfig {
                ip: "127.0.0.1".to_string(),
                port: 0,
            },
        )
    }

    /// The body of the only service call sent.
    pub fn sent(controller: &Controller<MockTransport>) -> (String, Value) {
        let posts = controller.hub().transport().posts();
        assert_eq!(posts.len(), 1, "expected exactly one service call");
        let post = posts.into_iter().next().unwrap();
        (post.url, post.body.unwrap())
    }
}
