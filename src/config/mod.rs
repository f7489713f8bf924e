//! Launcher configuration: container runtime, peer query policy, default images.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, ImagesConfig, PeerConfig, RuntimeConfig};
