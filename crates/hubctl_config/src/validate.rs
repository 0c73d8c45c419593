//! Value checks shared by `config set` and environment overrides.

use std::net::IpAddr;

pub(crate) fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(format!("expected true/false, got `{value}`")),
    }
}

pub(crate) fn parse_ip(value: &str) -> Result<String, String> {
    value
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| format!("`{value}` is not a valid ip address"))
}

pub(crate) fn parse_port(value: &str) -> Result<u16, String> {
    let port: u32 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number"))?;
    match port {
        0..=1023 => Err("use a non-well-known port (>1023)".to_string()),
        1024..=65535 => Ok(port as u16),
        _ => Err("use a valid port in the range 1024-65535".to_string()),
    }
}

pub(crate) fn parse_timeout(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => Err(format!("expected a positive number of seconds, got `{value}`")),
        Ok(secs) => Ok(secs),
    }
}

pub(crate) fn check_device_target(value: &str) -> Result<(), String> {
    match value.split_once('.') {
        Some((domain, name)) if !domain.is_empty() && !name.is_empty() => Ok(()),
        _ => Err(format!("expected `domain.name`, got `{value}`")),
    }
}

pub(crate) fn check_media_source(value: &str) -> Result<(), String> {
    if value.starts_with('~') {
        return Err("tilde path expansion is not supported".to_string());
    }
    Ok(())
}
