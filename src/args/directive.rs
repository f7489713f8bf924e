//! Launch directives and the namespace variables they are read from.

use serde::Serialize;

use crate::args::namespace::Namespace;

/// Well-known namespace variables shared by stages and the assembler.
pub mod keys {
    /// Container name given by the user (`--name`).
    pub const NAME: &str = "name";
    /// Resolved container name, set by the common stage hook.
    pub const CONTAINER: &str = "container";
    pub const IMAGE: &str = "image";
    pub const TAG: &str = "tag";
    /// Resolved image reference (image with tag applied).
    pub const IMAGE_REF: &str = "image-ref";
    pub const ENTRYPOINT: &str = "entrypoint";
    /// List: command arguments after the image.
    pub const CMD: &str = "cmd";
    /// List: `KEY=VALUE` environment bindings.
    pub const ENV: &str = "env";
    /// List: port publications.
    pub const PUBLISH: &str = "publish";
    /// List: volume mounts.
    pub const VOLUME: &str = "volume";
    /// List: runtime and resource-sharing flags, one token each.
    pub const RUNTIME: &str = "runtime";
}

/// One atomic contribution to a target's invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LaunchDirective {
    Env { key: String, value: String },
    Publish(String),
    Volume(String),
    /// Runtime flag, including inter-container resource sharing
    /// (`--network=container:<main>`, `--volumes-from=<main>`).
    Runtime(String),
    /// A token no stage recognized, forwarded verbatim.
    Raw(String),
    Entrypoint(String),
    Image(String),
    Command(String),
}

impl LaunchDirective {
    /// Render as runtime CLI tokens.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            LaunchDirective::Env { key, value } => vec!["--env".into(), format!("{key}={value}")],
            LaunchDirective::Publish(p) => vec!["--publish".into(), p.clone()],
            LaunchDirective::Volume(v) => vec!["--volume".into(), v.clone()],
            LaunchDirective::Entrypoint(e) => vec!["--entrypoint".into(), e.clone()],
            LaunchDirective::Runtime(s)
            | LaunchDirective::Raw(s)
            | LaunchDirective::Image(s)
            | LaunchDirective::Command(s) => vec![s.clone()],
        }
    }
}

/// Bind an environment variable for the target at `prefix`.
pub fn bind_env(ns: &mut Namespace, prefix: &str, key: &str, value: &str) {
    ns.append(prefix, keys::ENV, [format!("{key}={value}")]);
}

pub fn publish(ns: &mut Namespace, prefix: &str, spec: impl Into<String>) {
    ns.append(prefix, keys::PUBLISH, [spec.into()]);
}

pub fn mount(ns: &mut Namespace, prefix: &str, spec: impl Into<String>) {
    ns.append(prefix, keys::VOLUME, [spec.into()]);
}

pub fn runtime_flag(ns: &mut Namespace, prefix: &str, flag: impl Into<String>) {
    ns.append(prefix, keys::RUNTIME, [flag.into()]);
}

/// Split a stored `KEY=VALUE` binding.
pub(crate) fn parse_env(binding: &str) -> LaunchDirective {
    let (key, value) = binding.split_once('=').unwrap_or((binding, ""));
    LaunchDirective::Env {
        key: key.to_string(),
        value: value.to_string(),
    }
}
