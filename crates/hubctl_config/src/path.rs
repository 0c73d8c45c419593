//! Dotted-path access to configuration options.
//!
//! Scalar options are listed explicitly in [`FIELDS`] together with a typed
//! getter and setter. The two alias maps accept any key below their section
//! (`device_map.<alias>`, `media_map.<alias>`). Anything else is rejected.

use std::collections::BTreeMap;

use tracing::debug;
use tracing::info;

use crate::validate;
use crate::Config;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("no such config option: {0}")]
    Unknown(String),

    #[error("cannot set value for section: {0}")]
    Section(String),

    #[error("cannot use empty key in {0}")]
    EmptyKey(String),

    #[error("invalid value for {path}: {message}")]
    Invalid { path: String, message: String },

    #[error("removing `{0}` is not supported, use set instead")]
    NotRemovable(String),
}

struct Field {
    path: &'static str,
    get: fn(&Config) -> String,
    set: fn(&mut Config, &str) -> Result<(), String>,
}

static FIELDS: &[Field] = &[
    Field {
        path: "hub.type",
        get: |c| c.hub.kind.to_string(),
        set: |c, v| {
            c.hub.kind = v
                .parse()
                .map_err(|_| format!("unknown hub type: {v} (Supported: hass)"))?;
            Ok(())
        },
    },
    Field {
        path: "hub.url",
        get: |c| c.hub.url.clone(),
        set: |c, v| {
            c.hub.url = v.to_string();
            Ok(())
        },
    },
    Field {
        path: "hub.token",
        get: |c| c.hub.token.clone(),
        set: |c, v| {
            c.hub.token = v.to_string();
            Ok(())
        },
    },
    Field {
        path: "hub.timeout",
        get: |c| c.hub.timeout.to_string(),
        set: |c, v| {
            c.hub.timeout = validate::parse_timeout(v)?;
            Ok(())
        },
    },
    Field {
        path: "completion.short_names",
        get: |c| c.completion.short_names.to_string(),
        set: |c, v| {
            c.completion.short_names = validate::parse_bool(v)?;
            Ok(())
        },
    },
    Field {
        path: "handling.fuzz",
        get: |c| c.handling.fuzz.to_string(),
        set: |c, v| {
            c.handling.fuzz = validate::parse_bool(v)?;
            Ok(())
        },
    },
    Field {
        path: "logging.level",
        get: |c| c.logging.level.to_string(),
        set: |c, v| {
            c.logging.level = v.parse().map_err(|_| {
                format!("unknown log level: {v} (Supported: trace, debug, info, warn, error)")
            })?;
            Ok(())
        },
    },
    Field {
        path: "serve.ip",
        get: |c| c.serve.ip.clone(),
        set: |c, v| {
            c.serve.ip = validate::parse_ip(v)?;
            Ok(())
        },
    },
    Field {
        path: "serve.port",
        get: |c| c.serve.port.to_string(),
        set: |c, v| {
            c.serve.port = validate::parse_port(v)?;
            Ok(())
        },
    },
];

const SECTIONS: &[&str] = &["hub", "completion", "handling", "logging", "serve"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapSection {
    Device,
    Media,
}

impl MapSection {
    const ALL: [MapSection; 2] = [MapSection::Device, MapSection::Media];

    fn name(self) -> &'static str {
        match self {
            MapSection::Device => "device_map",
            MapSection::Media => "media_map",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    fn map(self, config: &Config) -> &BTreeMap<String, String> {
        match self {
            MapSection::Device => &config.device_map,
            MapSection::Media => &config.media_map,
        }
    }

    fn map_mut(self, config: &mut Config) -> &mut BTreeMap<String, String> {
        match self {
            MapSection::Device => &mut config.device_map,
            MapSection::Media => &mut config.media_map,
        }
    }

    fn check(self, value: &str) -> Result<(), String> {
        match self {
            MapSection::Device => validate::check_device_target(value),
            MapSection::Media => validate::check_media_source(value),
        }
    }
}

/// Every scalar option path, in schema order.
pub(crate) fn scalar_paths() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.path)
}

fn field(path: &str) -> Option<&'static Field> {
    FIELDS.iter().find(|f| f.path == path)
}

/// Split `device_map.tv` into its map section and key.
fn map_entry(path: &str) -> Result<Option<(MapSection, &str)>, PathError> {
    let Some((section, key)) = path.split_once('.') else {
        return Ok(None);
    };
    let Some(section) = MapSection::from_name(section) else {
        return Ok(None);
    };
    if key.is_empty() {
        return Err(PathError::EmptyKey(section.name().to_string()));
    }
    Ok(Some((section, key)))
}

fn is_section(path: &str) -> bool {
    SECTIONS.contains(&path) || MapSection::from_name(path).is_some()
}

impl Config {
    /// Get the value of an option by its dotted path.
    pub fn get(&self, path: &str) -> Result<String, PathError> {
        info!("Getting value for `{}`", path);
        if let Some(field) = field(path) {
            return Ok((field.get)(self));
        }
        if let Some((section, key)) = map_entry(path)? {
            return section
                .map(self)
                .get(key)
                .cloned()
                .ok_or_else(|| PathError::Unknown(path.to_string()));
        }
        if is_section(path) {
            return Err(PathError::Section(path.to_string()));
        }
        Err(PathError::Unknown(path.to_string()))
    }

    /// Set an option by its dotted path, validating the value first.
    ///
    /// Map entries are created if they don't exist yet.
    pub fn set(&mut self, path: &str, value: &str) -> Result<(), PathError> {
        info!("Setting `{}`", path);
        let invalid = |message: String| PathError::Invalid {
            path: path.to_string(),
            message,
        };

        if let Some(field) = field(path) {
            return (field.set)(self, value).map_err(invalid);
        }
        if let Some((section, key)) = map_entry(path)? {
            section.check(value).map_err(invalid)?;
            section
                .map_mut(self)
                .insert(key.to_string(), value.to_string());
            debug!("{} now has {} entries", section.name(), section.map(self).len());
            return Ok(());
        }
        if is_section(path) {
            return Err(PathError::Section(path.to_string()));
        }
        Err(PathError::Unknown(path.to_string()))
    }

    /// Remove a map entry by its dotted path.
    ///
    /// Only `device_map.*` and `media_map.*` entries can be removed; scalar
    /// options always have a value.
    pub fn remove(&mut self, path: &str) -> Result<(), PathError> {
        info!("Removing option `{}`", path);
        match map_entry(path)? {
            Some((section, key)) => section
                .map_mut(self)
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| PathError::Unknown(path.to_string())),
            None if field(path).is_some() => Err(PathError::NotRemovable(path.to_string())),
            None => Err(PathError::Unknown(path.to_string())),
        }
    }

    /// Every option path that currently has a value.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = scalar_paths().map(str::to_string).collect();
        for section in MapSection::ALL {
            paths.extend(
                section
                    .map(self)
                    .keys()
                    .map(|key| format!("{}.{}", section.name(), key)),
            );
        }
        paths
    }
}
