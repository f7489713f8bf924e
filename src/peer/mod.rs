//! Peer address resolution.
//!
//! When a launch needs a peer's address and the user supplied neither an
//! address nor a service name, the pipeline asks a running peer container.
//! The query is the only blocking call in a run, so it carries an explicit
//! timeout and a bounded retry.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use indexmap::IndexMap;
use thiserror::Error;
use tokio::process::Command;

use crate::config::PeerConfig;

/// Errors from a peer address query.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer '{peer}' not found")]
    NotFound { peer: String },

    #[error("query for peer '{peer}' timed out after {timeout_ms}ms")]
    Timeout { peer: String, timeout_ms: u64 },

    #[error("failed to run '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("query for peer '{peer}' failed: {message}")]
    Failed { peer: String, message: String },
}

impl PeerError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PeerError::Timeout { .. } | PeerError::Failed { .. })
    }
}

/// Resolves a peer container identifier to an address.
pub trait PeerResolver {
    fn resolve(&self, peer: &str) -> Result<String, PeerError>;
}

/// Fixed peer table, for tests and for callers that already know the answer.
#[derive(Debug, Clone, Default)]
pub struct StaticPeers {
    peers: IndexMap<String, String>,
}

impl StaticPeers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_peer(mut self, peer: impl Into<String>, address: impl Into<String>) -> Self {
        self.peers.insert(peer.into(), address.into());
        self
    }
}

impl PeerResolver for StaticPeers {
    fn resolve(&self, peer: &str) -> Result<String, PeerError> {
        self.peers.get(peer).cloned().ok_or_else(|| PeerError::NotFound {
            peer: peer.to_string(),
        })
    }
}

/// Timeout and retry policy for peer queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl QueryPolicy {
    /// Delay before retry number `attempt` (1-based): base, 2×base, 4×base, …
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl From<&PeerConfig> for QueryPolicy {
    fn from(cfg: &PeerConfig) -> Self {
        Self {
            timeout: Duration::from_millis(cfg.timeout_ms),
            max_retries: cfg.max_retries,
            backoff_base: Duration::from_millis(cfg.retry_backoff_base_ms),
        }
    }
}

/// Asks the container runtime for a running container's address
/// (`<program> inspect --format ... <peer>`).
pub struct RuntimePeerResolver {
    program: String,
    policy: QueryPolicy,
    runtime: tokio::runtime::Runtime,
}

const ADDRESS_FORMAT: &str = "{{range .NetworkSettings.Networks}}{{.IPAddress}} {{end}}";

impl RuntimePeerResolver {
    pub fn new(program: impl Into<String>, policy: QueryPolicy) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            program: program.into(),
            policy,
            runtime,
        })
    }

    async fn query_with_retry(&self, peer: &str) -> Result<String, PeerError> {
        let mut attempt = 0;
        loop {
            match self.query_once(peer).await {
                Ok(address) => return Ok(address),
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        peer,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "peer query failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn query_once(&self, peer: &str) -> Result<String, PeerError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["inspect", "--format", ADDRESS_FORMAT, peer])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.policy.timeout, cmd.output())
            .await
            .map_err(|_| PeerError::Timeout {
                peer: peer.to_string(),
                timeout_ms: self.policy.timeout.as_millis() as u64,
            })?
            .map_err(|e| PeerError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            if stderr.contains("No such") || stderr.contains("no such") {
                return Err(PeerError::NotFound {
                    peer: peer.to_string(),
                });
            }
            return Err(PeerError::Failed {
                peer: peer.to_string(),
                message: match stderr.trim() {
                    "" => output.status.to_string(),
                    msg => msg.lines().next().unwrap_or(msg).to_string(),
                },
            });
        }

        parse_address(&stdout).ok_or_else(|| PeerError::NotFound {
            peer: peer.to_string(),
        })
    }
}

impl PeerResolver for RuntimePeerResolver {
    fn resolve(&self, peer: &str) -> Result<String, PeerError> {
        tracing::debug!(peer, program = %self.program, "querying peer address");
        self.runtime.block_on(self.query_with_retry(peer))
    }
}

/// First non-empty address in the inspect output.
fn parse_address(output: &str) -> Option<String> {
    output.split_whitespace().next().map(str::to_string)
}
