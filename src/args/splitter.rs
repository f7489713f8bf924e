//! Batch splitter: raw tokens → one token batch per target.
//!
//! Two passes over the raw tokens:
//!
//! 1. [`scan`] collects option names and sidecar declarations without
//!    touching any state, and [`detect_targets`] decides the target set.
//! 2. [`split`] routes every token to its target's batch.
//!
//! Sidecar-prefixed tokens lose their prefix on the way (`--ml-image=foo`
//! becomes `--image=foo` in the `ml` batch), so the same stages handle both
//! the main target and its sidecars.

use crate::args::error::LaunchError;
use crate::args::matcher::{Matcher, PatternError};
use crate::args::pipeline::Target;

/// Option that declares a sidecar explicitly (`--sidecar=ml`).
pub const DECLARE_SIDECAR: &str = "--sidecar";

/// A sidecar a launcher knows how to build.
#[derive(Debug, Clone)]
pub struct SidecarSpec {
    name: &'static str,
    detect: Matcher,
}

impl SidecarSpec {
    /// Sidecar detected by any `--<name>-<word>` option.
    pub fn new(name: &'static str) -> Result<Self, PatternError> {
        Self::with_detect(name, &format!("--{name}-?*"))
    }

    /// Sidecar detected by a custom pattern. Matching tokens must still
    /// start with `--<name>-`, since that prefix is what gets stripped.
    pub fn with_detect(name: &'static str, pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            name,
            detect: Matcher::new(pattern)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn claims(&self, option: &str) -> bool {
        self.detect.is_match(option) && self.strip(option).is_some()
    }

    /// `--ml-image` → `--image`.
    fn strip(&self, option: &str) -> Option<String> {
        let rest = option
            .strip_prefix("--")?
            .strip_prefix(self.name)?
            .strip_prefix('-')?;
        (!rest.is_empty()).then(|| format!("--{rest}"))
    }
}

/// Result of the first pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionScan {
    /// Option names in input order, without inline values.
    pub names: Vec<String>,
    /// Sidecar names declared with [`DECLARE_SIDECAR`], in input order.
    pub declared: Vec<String>,
}

/// A target and the tokens routed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub target: Target,
    pub tokens: Vec<String>,
}

/// Split `--name=value` into its name and inline value.
pub fn split_option(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (token, None),
    }
}

/// Whether `token` starts a new option. Anything else, including a
/// single-dash token such as `-v`, is a value of the option before it.
pub(crate) fn is_option(token: &str) -> bool {
    token.len() > 2 && token.starts_with("--")
}

/// First pass: collect option names and explicit sidecar declarations.
pub fn scan(raw_args: &[String]) -> Result<OptionScan, LaunchError> {
    let mut out = OptionScan::default();
    let mut iter = raw_args.iter().peekable();

    while let Some(token) = iter.next() {
        if !is_option(token) {
            continue;
        }
        let (name, inline) = split_option(token);
        if name == DECLARE_SIDECAR {
            let value = match inline {
                Some(v) => v.to_string(),
                None => match iter.peek() {
                    Some(next) if !is_option(next) => iter.next().cloned().unwrap_or_default(),
                    Some(_) | None => {
                        return Err(LaunchError::MissingValue {
                            option: DECLARE_SIDECAR.to_string(),
                        })
                    }
                },
            };
            out.declared.push(value);
            continue;
        }
        out.names.push(name.to_string());
    }

    Ok(out)
}

/// Decide the target set: main first, then detected sidecars in order of
/// their first detecting option, then sidecars that were only declared.
pub fn detect_targets(
    scan: &OptionScan,
    main: Target,
    sidecars: &[SidecarSpec],
) -> Result<Vec<Target>, LaunchError> {
    let mut declared: Vec<&str> = Vec::new();
    for name in &scan.declared {
        if !sidecars.iter().any(|s| s.name() == name) {
            return Err(LaunchError::UnknownSidecar {
                name: name.clone(),
                available: available(sidecars),
            });
        }
        if declared.contains(&name.as_str()) {
            return Err(LaunchError::DuplicateTarget {
                name: name.clone(),
                reason: "declared more than once".to_string(),
            });
        }
        declared.push(name);
    }

    let mut order: Vec<&str> = Vec::new();
    for name in &scan.names {
        if let Some(spec) = sidecars.iter().find(|s| s.claims(name)) {
            if spec.strip(name).as_deref() == Some(DECLARE_SIDECAR) {
                return Err(LaunchError::unsupported(
                    name,
                    "sidecars cannot declare sidecars of their own",
                ));
            }
            if !order.contains(&spec.name()) {
                order.push(spec.name());
            }
        }
    }
    // A declared sidecar must also be detected by one of its own options.
    if let Some(name) = declared.iter().copied().find(|name| !order.contains(name)) {
        return Err(LaunchError::DuplicateTarget {
            name: name.to_string(),
            reason: format!("declared without any --{name}-* option"),
        });
    }

    let main_container = main.default_container.clone();
    let mut targets = vec![main];
    for name in order {
        targets.push(Target::sidecar(name, &main_container));
    }
    Ok(targets)
}

/// Second pass: route tokens to batches for the given targets.
///
/// A token that does not start with `--` follows the option before it.
pub fn split(raw_args: &[String], targets: Vec<Target>, sidecars: &[SidecarSpec]) -> Vec<Batch> {
    let mut batches: Vec<Batch> = targets
        .into_iter()
        .map(|target| Batch {
            target,
            tokens: Vec::new(),
        })
        .collect();

    let active: Vec<(usize, &SidecarSpec)> = sidecars
        .iter()
        .filter_map(|spec| {
            batches
                .iter()
                .position(|b| b.target.prefix == spec.name())
                .map(|i| (i, spec))
        })
        .collect();

    let mut current = 0;
    let mut iter = raw_args.iter().peekable();
    while let Some(token) = iter.next() {
        if !is_option(token) {
            batches[current].tokens.push(token.clone());
            continue;
        }

        let (name, inline) = split_option(token);
        if name == DECLARE_SIDECAR {
            if inline.is_none() && iter.peek().is_some_and(|next| !is_option(next)) {
                iter.next();
            }
            continue;
        }

        current = 0;
        let mut routed = token.clone();
        for (index, spec) in &active {
            if !spec.claims(name) {
                continue;
            }
            if let Some(stripped) = spec.strip(name) {
                routed = match inline {
                    Some(value) => format!("{stripped}={value}"),
                    None => stripped,
                };
                current = *index;
            }
            break;
        }
        batches[current].tokens.push(routed);
    }

    batches
}

fn available(sidecars: &[SidecarSpec]) -> String {
    if sidecars.is_empty() {
        return "none".to_string();
    }
    sidecars
        .iter()
        .map(SidecarSpec::name)
        .collect::<Vec<_>>()
        .join(", ")
}
