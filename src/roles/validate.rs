//! Shape checks for option arguments.
//!
//! Every check returns [`LaunchError::MalformedArgument`] naming the option,
//! so a bad value aborts the run with a single-line diagnostic.

use std::net::IpAddr;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::args::LaunchError;

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .unwrap()
});

static CONTAINER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").unwrap());

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").unwrap());

static ENV_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").unwrap());

/// `[ip:][host_port[-end]:]container_port[-end][/proto]`
static PUBLISH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((\[[0-9A-Fa-f:]+\]|[0-9.]+):)?(\d+(-\d+)?:)?\d+(-\d+)?(/(tcp|udp|sctp))?$").unwrap()
});

pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

pub fn port(option: &str, value: &str) -> Result<u16, LaunchError> {
    match value.parse::<u16>() {
        Ok(0) => Err(LaunchError::malformed(option, value, "port must be between 1 and 65535")),
        Ok(p) => Ok(p),
        Err(_) => Err(LaunchError::malformed(option, value, "not a port number")),
    }
}

/// An IP address or a DNS host name.
pub fn host(option: &str, value: &str) -> Result<(), LaunchError> {
    if value.parse::<IpAddr>().is_ok() || (value.len() <= 253 && HOSTNAME.is_match(value)) {
        return Ok(());
    }
    Err(LaunchError::malformed(option, value, "not an IP address or host name"))
}

/// A service-discovery name (DNS shaped, e.g. `sentinel-api.default.svc`).
pub fn service(option: &str, value: &str) -> Result<(), LaunchError> {
    if value.len() <= 253 && HOSTNAME.is_match(value) {
        return Ok(());
    }
    Err(LaunchError::malformed(option, value, "not a valid service name"))
}

pub fn container_name(option: &str, value: &str) -> Result<(), LaunchError> {
    if CONTAINER_NAME.is_match(value) {
        return Ok(());
    }
    Err(LaunchError::malformed(option, value, "not a valid container name"))
}

pub fn image(option: &str, value: &str) -> Result<(), LaunchError> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(LaunchError::malformed(option, value, "not a valid image reference"));
    }
    Ok(())
}

pub fn tag(option: &str, value: &str) -> Result<(), LaunchError> {
    if TAG.is_match(value) {
        return Ok(());
    }
    Err(LaunchError::malformed(option, value, "not a valid image tag"))
}

pub fn env_assignment(option: &str, value: &str) -> Result<(), LaunchError> {
    if ENV_ASSIGNMENT.is_match(value) {
        return Ok(());
    }
    Err(LaunchError::malformed(option, value, "expected KEY=VALUE"))
}

pub fn publish(option: &str, value: &str) -> Result<(), LaunchError> {
    if PUBLISH.is_match(value) {
        return Ok(());
    }
    Err(LaunchError::malformed(
        option,
        value,
        "expected [ip:][host_port:]container_port[/proto]",
    ))
}

/// `source:destination[:options]` with an absolute destination.
pub fn volume(option: &str, value: &str) -> Result<(), LaunchError> {
    let mut parts = value.splitn(3, ':');
    let source = parts.next().unwrap_or("");
    let destination = parts.next().unwrap_or("");
    if source.is_empty() || !destination.starts_with('/') {
        return Err(LaunchError::malformed(
            option,
            value,
            "expected source:/destination[:options]",
        ));
    }
    Ok(())
}

pub fn absolute_path(option: &str, value: &str) -> Result<(), LaunchError> {
    if Path::new(value).is_absolute() {
        return Ok(());
    }
    Err(LaunchError::malformed(option, value, "path must be absolute"))
}

pub fn boolean(option: &str, value: &str) -> Result<bool, LaunchError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LaunchError::malformed(option, value, "expected 1/0 or true/false")),
    }
}

pub fn log_level(option: &str, value: &str) -> Result<(), LaunchError> {
    if LOG_LEVELS.contains(&value) {
        return Ok(());
    }
    Err(LaunchError::malformed(
        option,
        value,
        format!("expected one of {}", LOG_LEVELS.join(", ")),
    ))
}

pub fn non_empty(option: &str, value: &str) -> Result<(), LaunchError> {
    if value.trim().is_empty() {
        return Err(LaunchError::malformed(option, value, "must not be empty"));
    }
    Ok(())
}
