//! Control a Home Assistant hub from the command line.
//!
//! [`commands::Controller`] is the entry point: it resolves what the user
//! typed to a hub entity via [`resolve::Resolver`], validates the request
//! against the hub's capabilities and calls the service through
//! [`hub::HubClient`].

pub mod commands;
pub mod convert;
mod error;
pub mod hub;
pub mod output;
pub mod resolve;
pub mod serve;

pub use commands::CommandResult;
pub use commands::Controller;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
