mod capability;
mod client;
pub mod filter;
mod protocol;
mod transport;

pub use capability::Capabilities;
pub use client::HubClient;
pub use protocol::split_entity_id;
pub use protocol::Entity;
pub use protocol::ResultAttributes;
pub use protocol::Service;
pub use protocol::ServiceCapability;
pub use protocol::ServiceInfo;
pub use protocol::ServiceResult;
pub use transport::HttpTransport;
pub use transport::Method;
pub use transport::Request;
pub use transport::Transport;

#[cfg(test)]
pub(crate) use transport::MockTransport;
