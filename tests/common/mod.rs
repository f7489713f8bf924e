//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use std::path::PathBuf;

use nodelaunch::args::{Invocation, LaunchContext, LaunchError};
use nodelaunch::peer::StaticPeers;
use nodelaunch::roles::Role;
use tempfile::TempDir;

pub const NETWORK_IMAGE: &str = "sn-node:latest";
pub const LEARNING_IMAGE: &str = "ln-node:latest";

pub fn raw_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn default_image(role: Role) -> &'static str {
    match role {
        Role::Network => NETWORK_IMAGE,
        Role::Learning => LEARNING_IMAGE,
    }
}

/// Run a role's launcher against a fixed peer table.
pub fn launch_with(role: Role, args: &[&str], peers: &StaticPeers) -> Result<Vec<Invocation>, LaunchError> {
    let launcher = role.launcher().expect("launcher patterns compile");
    let ctx = LaunchContext {
        program: "docker",
        default_image: Some(default_image(role)),
        peers,
    };
    launcher.run(&raw_args(args), &ctx)
}

/// Run a role's launcher with a running networking node at 172.17.0.2.
pub fn launch(role: Role, args: &[&str]) -> Result<Vec<Invocation>, LaunchError> {
    launch_with(role, args, &StaticPeers::new().with_peer("sn-node", "172.17.0.2"))
}

/// Position of `needle` in an invocation's args.
pub fn position(inv: &Invocation, needle: &str) -> usize {
    inv.args
        .iter()
        .position(|a| a == needle)
        .unwrap_or_else(|| panic!("'{needle}' not in {:?}", inv.args))
}

/// Create a temporary config file with the given contents.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
