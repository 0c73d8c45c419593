//! Configuration for hubctl.
//!
//! The configuration is a TOML file with a fixed schema. Every scalar option
//! and every entry of the alias maps can be read and written by its dotted
//! path (e.g. `hub.url`, `device_map.tv`), which is what `hubctl config`
//! and the `HUBCTL_*` environment overrides are built on.

mod config;
mod diagnostics;
mod path;
mod validate;

pub use config::CompletionConfig;
pub use config::Config;
pub use config::HandlingConfig;
pub use config::HubConfig;
pub use config::HubType;
pub use config::LogLevel;
pub use config::LoggingConfig;
pub use config::ServeConfig;
pub use config::CONFIG_FILE_NAME;
pub use config::ENV_PREFIX;
pub use diagnostics::format_load_error;
pub use diagnostics::LoadError;
pub use path::PathError;
