use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::debug;
use tracing::info;

use super::capability::Capabilities;
use super::protocol::Entity;
use super::protocol::Service;
use super::protocol::ServiceCapability;
use super::protocol::ServiceResult;
use super::transport::HttpTransport;
use super::transport::Method;
use super::transport::Request;
use super::transport::Transport;
use crate::error::Error;
use crate::error::Result;

/// Client for one hub, caching its listings for its own lifetime.
///
/// `states()` and `services()` fetch at most once per client; there is no
/// expiry and no invalidation.
pub struct HubClient<T: Transport = HttpTransport> {
    transport: T,
    url: String,
    token: String,
    states: OnceCell<Vec<Entity>>,
    services: OnceCell<Vec<ServiceCapability>>,
}

impl HubClient<HttpTransport> {
    /// Build a client talking HTTP to the hub named in the config.
    pub fn from_config(config: &hubctl_config::HubConfig) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout))?;
        Ok(Self::new(transport, &config.url, &config.token))
    }
}

impl<T: Transport> HubClient<T> {
    pub fn new(transport: T, url: &str, token: &str) -> Self {
        Self {
            transport,
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            states: OnceCell::new(),
            services: OnceCell::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Every entity the hub knows, in listing order.
    pub async fn states(&self) -> Result<&[Entity]> {
        if self.states.initialized() {
            info!("Using cached states.");
        }
        let states = self
            .states
            .get_or_try_init(|| self.get::<Vec<Entity>>("states"))
            .await?;
        Ok(states)
    }

    /// Every domain and the services it exposes.
    pub async fn services(&self) -> Result<&[ServiceCapability]> {
        if self.services.initialized() {
            info!("Using cached services.");
        }
        let services = self
            .services
            .get_or_try_init(|| self.get::<Vec<ServiceCapability>>("services"))
            .await?;
        Ok(services)
    }

    /// Both listings, for use with the pure capability queries.
    pub async fn capabilities(&self) -> Result<Capabilities<'_>> {
        let services = self.services().await?;
        let entities = self.states().await?;
        Ok(Capabilities::new(services, entities))
    }

    /// Call `domain.service` with `payload` and return the changed entities.
    pub async fn invoke(
        &self,
        domain: &str,
        service: Service,
        payload: serde_json::Value,
    ) -> Result<Vec<ServiceResult>> {
        debug!("Payload: {}", payload);
        let path = format!("services/{}/{}", domain, service);
        let body = self.send(Method::Post, &path, Some(payload)).await?;
        let results: Vec<ServiceResult> = serde_json::from_slice(&body)?;
        debug!("Result: {:?}", results);
        Ok(results)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let body = self.send(Method::Get, path, None).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<u8>> {
        self.preflight()?;
        let url = format!("{}/{}", self.url, path);
        info!("{} {}", method, url);
        self.transport
            .send(Request {
                method,
                url,
                token: self.token.clone(),
                body,
            })
            .await
    }

    fn preflight(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(Error::MissingUrl);
        }
        if self.token.is_empty() {
            return Err(Error::MissingToken);
        }
        Ok(())
    }

    pub async fn domain_has_service(&self, domain: &str, service: Service) -> Result<bool> {
        let services = self.services().await?;
        Ok(Capabilities::new(services, &[]).domain_has_service(domain, service))
    }

    pub async fn entity_belongs_to_domain(&self, name: &str, domain: &str) -> Result<bool> {
        let entities = self.states().await?;
        Ok(Capabilities::new(&[], entities).entity_belongs_to_domain(name, domain))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::hub::transport::MockTransport;

    fn client() -> HubClient<MockTransport> {
        HubClient::new(MockTransport::with_fixtures(), "http://hub.test/api/", "secret")
    }

    #[tokio::test]
    async fn test_states_are_cached() {
        let hub = client();
        let first = hub.states().await.unwrap().len();
        let second = hub.states().await.unwrap().len();
        assert_eq!(first, second);

        let requests = hub.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, "http://hub.test/api/states");
        assert_eq!(requests[0].token, "secret");
    }

    #[tokio::test]
    async fn test_services_are_cached() {
        let hub = client();
        hub.services().await.unwrap();
        hub.domain_has_service("light", Service::TurnOn).await.unwrap();
        assert_eq!(hub.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_url_is_checked_before_sending() {
        let hub = HubClient::new(MockTransport::with_fixtures(), "", "secret");
        let err = hub.states().await.unwrap_err();
        assert!(matches!(err, Error::MissingUrl));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(hub.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token_is_checked_before_sending() {
        let hub = HubClient::new(MockTransport::with_fixtures(), "http://hub.test/api", "");
        let err = hub
            .invoke("light", Service::TurnOn, json!({"entity_id": "light.desk"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingToken));
        assert!(hub.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_posts_payload() {
        let transport = MockTransport::new().with_response(
            "/services/light/turn_on",
            r#"[{"entity_id": "light.desk", "state": "on", "attributes": {"friendly_name": "Desk"}}]"#,
        );
        let hub = HubClient::new(transport, "http://hub.test/api", "secret");
        let results = hub
            .invoke("light", Service::TurnOn, json!({"entity_id": "light.desk"}))
            .await
            .unwrap();

        assert_eq!(results[0].attributes.friendly_name.as_deref(), Some("Desk"));
        let posts = hub.transport().posts();
        assert_eq!(posts[0].url, "http://hub.test/api/services/light/turn_on");
        assert_eq!(posts[0].body, Some(json!({"entity_id": "light.desk"})));
    }

    #[tokio::test]
    async fn test_invoke_rejects_undecodable_body() {
        let transport = MockTransport::new().with_response("/services/light/toggle", "OK");
        let hub = HubClient::new(transport, "http://hub.test/api", "secret");
        let err = hub
            .invoke("light", Service::Toggle, json!({"entity_id": "light.desk"}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_failed_listing_is_retried_on_next_call() {
        let hub = HubClient::new(MockTransport::new(), "http://hub.test/api", "secret");
        assert!(hub.states().await.is_err());
        assert!(hub.states().await.is_err());
        assert_eq!(hub.transport().requests().len(), 2);
    }
}
