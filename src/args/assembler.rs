//! Argument assembler: namespace → container runtime invocation.
//!
//! Section order is fixed: header, environment, publications, mounts,
//! runtime/resource-sharing flags, forwarded tokens, then entrypoint,
//! image and command. Within a section, directives keep the order they
//! were written in.

use serde::Serialize;

use crate::args::directive::{keys, parse_env, LaunchDirective};
use crate::args::namespace::Namespace;
use crate::args::pipeline::Target;

/// A complete invocation for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    /// Role name for the main target, sidecar name otherwise.
    pub target: String,
    pub container: String,
    pub program: String,
    /// Arguments after `program`, starting with `run`.
    pub args: Vec<String>,
    #[serde(skip)]
    pub directives: Vec<LaunchDirective>,
}

impl Invocation {
    /// `program` followed by `args`.
    pub fn command_line(&self) -> Vec<String> {
        let mut line = Vec::with_capacity(self.args.len() + 1);
        line.push(self.program.clone());
        line.extend(self.args.iter().cloned());
        line
    }

    /// Environment bindings, in order.
    pub fn env(&self) -> Vec<(&str, &str)> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                LaunchDirective::Env { key, value } => Some((key.as_str(), value.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Look up one environment binding.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env().into_iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn publications(&self) -> Vec<&str> {
        self.directives
            .iter()
            .filter_map(|d| match d {
                LaunchDirective::Publish(p) => Some(p.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Collect a target's directives in assembly order.
pub fn directives(ns: &Namespace, target: &Target, unrecognized: &[String]) -> Vec<LaunchDirective> {
    let prefix = target.prefix.as_str();
    let mut out = Vec::new();

    // Directive lists are per target; a sidecar never picks up the main
    // target's lists through fallback.
    out.extend(ns.read_list_local(prefix, keys::ENV).iter().map(|b| parse_env(b)));
    out.extend(
        ns.read_list_local(prefix, keys::PUBLISH)
            .iter()
            .cloned()
            .map(LaunchDirective::Publish),
    );
    out.extend(
        ns.read_list_local(prefix, keys::VOLUME)
            .iter()
            .cloned()
            .map(LaunchDirective::Volume),
    );
    out.extend(
        ns.read_list_local(prefix, keys::RUNTIME)
            .iter()
            .cloned()
            .map(LaunchDirective::Runtime),
    );
    out.extend(unrecognized.iter().cloned().map(LaunchDirective::Raw));

    if let Some(entrypoint) = ns.read_local(prefix, keys::ENTRYPOINT) {
        out.push(LaunchDirective::Entrypoint(entrypoint.to_string()));
    }
    if let Some(image) = ns.read_local(prefix, keys::IMAGE_REF) {
        out.push(LaunchDirective::Image(image.to_string()));
    }
    out.extend(
        ns.read_list_local(prefix, keys::CMD)
            .iter()
            .cloned()
            .map(LaunchDirective::Command),
    );
    out
}

/// Assemble the invocation for one target.
pub fn assemble(ns: &Namespace, target: &Target, unrecognized: &[String], program: &str) -> Invocation {
    let container = ns
        .read_local(&target.prefix, keys::CONTAINER)
        .unwrap_or(&target.default_container)
        .to_string();
    let directives = directives(ns, target, unrecognized);

    let mut args = vec!["run".to_string(), "--name".to_string(), container.clone()];
    args.extend(directives.iter().flat_map(LaunchDirective::to_args));

    Invocation {
        target: target.name.clone(),
        container,
        program: program.to_string(),
        args,
        directives,
    }
}
