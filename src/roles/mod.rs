//! Node roles and the stages they are built from.
//!
//! Every launcher runs the shared stages first, in this order, followed by
//! its own component stage:
//!
//! | Position | Stage      | Options                                        |
//! |----------|------------|------------------------------------------------|
//! | 1        | `common`   | name, image, tag, entrypoint, cmd, host, logs  |
//! | 2        | `runtime`  | env, publish, volume, network, gpus, flags     |
//! | 3        | `license`  | API key, license file                          |
//! | 4        | `identity` | identity directory and name                    |
//! | 5        | component  | `sn` (network) or `ln` (learning)              |

use std::fmt;

use clap::ValueEnum;

use crate::args::{LaunchError, Launcher, PatternError, Stage, StageContext};

mod common;
mod identity;
mod learning;
mod license;
mod network;
mod runtime;
pub mod validate;

/// A node role; each has its own launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Role {
    /// Networking node.
    Network,
    /// Learning node, with an optional `ml` sidecar.
    Learning,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Network => network::ROLE,
            Role::Learning => learning::ROLE,
        }
    }

    /// Build the launcher for this role.
    pub fn launcher(self) -> Result<Launcher, PatternError> {
        match self {
            Role::Network => network::launcher(),
            Role::Learning => learning::launcher(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn shared_stages() -> Result<Vec<Stage>, PatternError> {
    Ok(vec![
        common::stage()?,
        runtime::stage()?,
        license::stage()?,
        identity::stage()?,
    ])
}

/// Ask the peer resolver for `peer`'s address on behalf of the current target.
fn resolve_peer(ctx: &StageContext<'_>, field: &str, peer: &str) -> Result<String, LaunchError> {
    tracing::debug!(target_name = %ctx.target.name, field, peer, "resolving peer address");
    ctx.launch
        .peers
        .resolve(peer)
        .map_err(|source| LaunchError::PeerResolution {
            target: ctx.target.name.clone(),
            field: field.to_string(),
            peer: peer.to_string(),
            source,
        })
}
