use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::types::Config;

/// Errors from reading, parsing or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}'")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// `<config dir>/nodelaunch/config.toml`, or `./nodelaunch/config.toml`
    /// when the platform has no config directory.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nodelaunch")
            .join("config.toml")
    }

    /// Load from `explicit` if given, else from [`Config::config_path`].
    pub fn load_or_default_path(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Parse and validate the file at `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: parse_message(&e, &content),
        })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), program = %config.runtime.program, "loaded config");
        Ok(config)
    }

    /// Check values that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| ConfigError::ValidationError {
            message: message.to_string(),
        };

        if self.runtime.program.trim().is_empty() {
            return Err(invalid("runtime.program must not be empty"));
        }
        if self.peer.timeout_ms == 0 {
            return Err(invalid("peer.timeout_ms must be greater than zero"));
        }
        if self.images.network.trim().is_empty() || self.images.learning.trim().is_empty() {
            return Err(invalid("images entries must not be empty"));
        }
        Ok(())
    }
}

/// One-line description of a TOML error, with the line it starts on.
fn parse_message(error: &toml::de::Error, content: &str) -> String {
    let text = error
        .message()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    match error.span() {
        Some(span) => {
            let before = &content.as_bytes()[..span.start.min(content.len())];
            let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
            format!("line {line}: {text}")
        }
        None => text,
    }
}
