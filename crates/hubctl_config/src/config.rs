use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::level_filters::LevelFilter;

use crate::diagnostics::LoadError;
use crate::path::PathError;

/// File name looked up in the working directory and the user config dir.
pub const CONFIG_FILE_NAME: &str = "hubctl.toml";

/// Prefix of environment variables overriding config options.
pub const ENV_PREFIX: &str = "HUBCTL";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub hub: HubConfig,
    pub completion: CompletionConfig,
    pub handling: HandlingConfig,
    pub logging: LoggingConfig,
    pub serve: ServeConfig,

    /// Short alias -> `domain.name`
    pub device_map: BTreeMap<String, String>,

    /// Short alias -> media URL or local path
    pub media_map: BTreeMap<String, String>,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HubType {
    /// Home Assistant REST API
    #[default]
    Hass,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HubConfig {
    #[serde(rename = "type")]
    pub kind: HubType,

    /// Base URL of the REST API, e.g. `http://hass.local:8123/api`
    pub url: String,

    /// Long-lived access token sent as bearer token
    pub token: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            kind: HubType::Hass,
            url: String::new(),
            token: String::new(),
            timeout: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub short_names: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self { short_names: true }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlingConfig {
    /// Fall back to fuzzy matching when no entity name matches exactly
    pub fuzz: bool,
}

impl Default for HandlingConfig {
    fn default() -> Self {
        Self { fuzz: true }
    }
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[strum(to_string = "warn", serialize = "warning")]
    Warn,
    #[default]
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,
}

/// Local HTTP server used to hand local media files to the hub.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Address to bind and advertise; empty means auto-detect
    pub ip: String,

    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            ip: String::new(),
            port: 1337,
        }
    }
}

impl Config {
    /// Find the config file to use.
    ///
    /// An explicit path always wins, even if it does not exist (loading will
    /// then report the IO error). Otherwise the first existing file of
    /// `./hubctl.toml`, `$XDG_CONFIG_HOME/hubctl/hubctl.toml` and
    /// `$HOME/.config/hubctl/hubctl.toml` is used.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(dir).join("hubctl").join(CONFIG_FILE_NAME));
        }
        if let Some(path) = Self::default_path() {
            candidates.push(path);
        }

        candidates.into_iter().find(|p| p.is_file())
    }

    /// `$HOME/.config/hubctl/hubctl.toml`, where new config files are created.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("hubctl")
                .join(CONFIG_FILE_NAME)
        })
    }

    /// Load the configuration and apply `HUBCTL_*` environment overrides.
    ///
    /// Without a path the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, LoadError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                debug!("No config file found, using defaults. Run `hubctl init` to create one");
                Self::default()
            }
        };

        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|error| LoadError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        let config = Self::from_toml(path, content)?;
        info!("Config file in use: {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML source; `path` is only used for diagnostics.
    pub fn from_toml(path: &Path, content: String) -> Result<Self, LoadError> {
        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(error) => Err(LoadError::Parse {
                path: path.to_path_buf(),
                content,
                error,
            }),
        }
    }

    /// Apply overrides from `HUBCTL_<SECTION>_<OPTION>` variables.
    ///
    /// Only scalar options can be overridden; the value is validated the same
    /// way as `hubctl config set`.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), LoadError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let known: Vec<(String, &'static str)> = crate::path::scalar_paths()
            .map(|p| (env_var_name(p), p))
            .collect();

        for (var, value) in vars {
            let Some((_, path)) = known.iter().find(|(name, _)| *name == var) else {
                continue;
            };
            debug!("Overriding `{}` from ${}", path, var);
            self.set(path, &value)
                .map_err(|error: PathError| LoadError::Env { var, error })?;
        }
        Ok(())
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|error| LoadError::Write {
                path: path.to_path_buf(),
                error,
            })?;
        }
        std::fs::write(path, content).map_err(|error| LoadError::Write {
            path: path.to_path_buf(),
            error,
        })?;
        info!("Config written to {}", path.display());
        Ok(())
    }

    /// Create a fresh config file with the given hub credentials.
    ///
    /// Refuses to overwrite an existing file.
    pub fn init(path: &Path, url: &str, token: &str) -> Result<Self, LoadError> {
        if path.exists() {
            return Err(LoadError::Exists {
                path: path.to_path_buf(),
            });
        }

        let mut config = Self::default();
        config.hub.url = url.to_string();
        config.hub.token = token.to_string();
        config.save(path)?;
        Ok(config)
    }
}

/// `hub.url` -> `HUBCTL_HUB_URL`
pub(crate) fn env_var_name(path: &str) -> String {
    format!("{}_{}", ENV_PREFIX, path.replace('.', "_").to_uppercase())
}
