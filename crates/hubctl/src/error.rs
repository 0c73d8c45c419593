use std::path::PathBuf;

use crate::hub::Service;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of [`Error`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Hub URL or token missing; detected before any request.
    Configuration,
    /// No entity could be matched for the requested service.
    Resolution,
    /// Bad user input or a target that can't perform the service.
    Validation,
    /// The request was sent (or attempted) and failed.
    Transport,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no Hub URL found: run `hubctl init` or set hub.url")]
    MissingUrl,

    #[error("no Hub Token found: run `hubctl init` or set hub.token")]
    MissingToken,

    #[error("no entity {token} capable of {service}")]
    NotFound { token: String, service: Service },

    #[error("no such domain with service: {domain} with {service}")]
    DomainLacksService { domain: String, service: Service },

    #[error("no such entity in domain: {name} in {domain}")]
    EntityNotInDomain { name: String, domain: String },

    #[error("invalid {what}: {message}")]
    InvalidInput { what: &'static str, message: String },

    #[error("color and color temperature cannot be set at the same time")]
    ColorConflict,

    #[error("cannot serve media file '{}': {error}", path.display())]
    Media { path: PathBuf, error: std::io::Error },

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("request to {url} failed: {error}")]
    Http { url: String, error: reqwest::Error },

    #[error("hub returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode hub response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("local media server failed: {0}")]
    Serve(std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingUrl | Error::MissingToken | Error::Client(_) => ErrorKind::Configuration,
            Error::NotFound { .. } => ErrorKind::Resolution,
            Error::DomainLacksService { .. }
            | Error::EntityNotInDomain { .. }
            | Error::InvalidInput { .. }
            | Error::ColorConflict
            | Error::Media { .. } => ErrorKind::Validation,
            Error::Http { .. } | Error::Status { .. } | Error::Decode(_) | Error::Serve(_) => {
                ErrorKind::Transport
            }
        }
    }

    pub(crate) fn invalid(what: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            what,
            message: message.into(),
        }
    }
}
