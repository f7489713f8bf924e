use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub peer: PeerConfig,
    #[serde(default)]
    pub images: ImagesConfig,
}

/// Container runtime the invocations are built for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Program placed at the head of every invocation (default: "docker").
    #[serde(default = "default_program")]
    pub program: String,
}

/// Peer address query policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Timeout for one query in milliseconds (default: 5000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after a timed-out or failed query (default: 1).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled per retry (default: 250).
    #[serde(default = "default_retry_backoff_base_ms")]
    pub retry_backoff_base_ms: u64,
}

/// Default main-target image per role. Sidecar images are never defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_network_image")]
    pub network: String,
    #[serde(default = "default_learning_image")]
    pub learning: String,
}

impl ImagesConfig {
    /// Default image for a launcher role.
    pub fn for_role(&self, role: &str) -> Option<&str> {
        match role {
            "network" => Some(&self.network),
            "learning" => Some(&self.learning),
            _ => None,
        }
    }
}

fn default_program() -> String {
    "docker".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_backoff_base_ms() -> u64 {
    250
}

fn default_network_image() -> String {
    "sn-node:latest".to_string()
}

fn default_learning_image() -> String {
    "ln-node:latest".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
        }
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_base_ms: default_retry_backoff_base_ms(),
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            network: default_network_image(),
            learning: default_learning_image(),
        }
    }
}
