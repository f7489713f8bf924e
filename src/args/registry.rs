//! Stage registry: recognizers and hooks, grouped into named stages.

use std::fmt;

use crate::args::directive;
use crate::args::error::LaunchError;
use crate::args::matcher::{Matcher, PatternError};
use crate::args::namespace::Namespace;
use crate::args::pipeline::{LaunchContext, Target};
use crate::args::splitter::is_option;

/// Whether an option takes an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Boolean flag, no argument (e.g., `--detach`).
    Flag,
    /// Requires exactly one argument, inline or as the next token.
    Value,
    /// Inline argument, or the given default when bare (e.g., `--sentinel`).
    OptionalValue(&'static str),
}

impl Arity {
    /// Resolve the option's argument.
    ///
    /// Returns the argument (if any) and how many tokens the option consumed.
    pub fn take_value(
        self,
        name: &str,
        inline: Option<&str>,
        next: Option<&String>,
    ) -> Result<(Option<String>, usize), LaunchError> {
        match (self, inline) {
            (Arity::Flag, None) => Ok((None, 1)),
            (Arity::Flag, Some(_)) => Err(LaunchError::UnexpectedValue {
                option: name.to_string(),
            }),
            (Arity::Value, Some(v)) => Ok((Some(v.to_string()), 1)),
            (Arity::Value, None) => match next {
                Some(v) if !is_option(v) => Ok((Some(v.clone()), 2)),
                Some(_) | None => Err(LaunchError::MissingValue {
                    option: name.to_string(),
                }),
            },
            (Arity::OptionalValue(_), Some(v)) => Ok((Some(v.to_string()), 1)),
            (Arity::OptionalValue(default), None) => Ok((Some(default.to_string()), 1)),
        }
    }
}

/// A recognized option, handed to its handler.
#[derive(Debug, Clone)]
pub struct OptionMatch {
    /// Option name as written in the batch (e.g., `--sn-api-port`).
    pub name: String,
    /// Argument after arity resolution; `None` for flags.
    pub value: Option<String>,
    /// Captured alternations and wildcards, in pattern order.
    pub groups: Vec<String>,
}

impl OptionMatch {
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    pub fn group(&self, index: usize) -> &str {
        self.groups.get(index).map(String::as_str).unwrap_or("")
    }
}

/// What a handler did with a matched option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Claimed; the option (and its argument) is consumed.
    Consumed,
    /// Not this handler's option after all; matching continues.
    Declined,
}

/// State a handler or hook works on: the namespace scoped to one target.
pub struct StageContext<'a> {
    pub ns: &'a mut Namespace,
    pub target: &'a Target,
    pub launch: &'a LaunchContext<'a>,
}

impl StageContext<'_> {
    /// The target's namespace prefix.
    pub fn prefix(&self) -> &str {
        &self.target.prefix
    }

    pub fn is_main(&self) -> bool {
        self.target.is_main()
    }

    pub fn assign(&mut self, name: &str, value: impl Into<String>) {
        self.ns.assign(&self.target.prefix, name, value);
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.ns.append(&self.target.prefix, name, [value.into()]);
    }

    /// Read with fallback to the global scope.
    pub fn read(&self, name: &str) -> Option<&str> {
        self.ns.read(&self.target.prefix, name)
    }

    /// Read from this target's scope only.
    pub fn read_local(&self, name: &str) -> Option<&str> {
        self.ns.read_local(&self.target.prefix, name)
    }

    pub fn bind_env(&mut self, key: &str, value: &str) {
        directive::bind_env(self.ns, &self.target.prefix, key, value);
    }

    pub fn publish(&mut self, spec: impl Into<String>) {
        directive::publish(self.ns, &self.target.prefix, spec);
    }

    pub fn mount(&mut self, spec: impl Into<String>) {
        directive::mount(self.ns, &self.target.prefix, spec);
    }

    pub fn runtime_flag(&mut self, flag: impl Into<String>) {
        directive::runtime_flag(self.ns, &self.target.prefix, flag);
    }

    /// A missing-field error for this target.
    pub fn missing(&self, field: &str, hint: impl Into<String>) -> LaunchError {
        LaunchError::missing(&self.target.name, field, hint)
    }
}

pub type Handler = fn(&mut StageContext<'_>, &OptionMatch) -> Result<Disposition, LaunchError>;
pub type Hook = fn(&mut StageContext<'_>) -> Result<(), LaunchError>;

/// A compiled pattern bound to a handler.
pub struct Recognizer {
    pub matcher: Matcher,
    pub arity: Arity,
    pub handler: Handler,
    /// One-line description for usage text.
    pub help: &'static str,
}

/// A named pipeline step.
pub struct Stage {
    name: &'static str,
    recognizers: Vec<Recognizer>,
    on_batch_end: Option<Hook>,
    on_sidecar_end: Option<Hook>,
}

impl fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recognizer")
            .field("pattern", &self.matcher.pattern())
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("recognizers", &self.recognizers)
            .field("on_batch_end", &self.on_batch_end.is_some())
            .field("on_sidecar_end", &self.on_sidecar_end.is_some())
            .finish()
    }
}

impl Stage {
    pub fn builder(name: &'static str) -> StageBuilder {
        StageBuilder {
            name,
            options: Vec::new(),
            on_batch_end: None,
            on_sidecar_end: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn recognizers(&self) -> &[Recognizer] {
        &self.recognizers
    }

    /// The hook to run at the end of a batch.
    ///
    /// Sidecars use the sidecar hook when the stage has one.
    pub fn hook_for(&self, target: &Target) -> Option<Hook> {
        if target.is_main() {
            self.on_batch_end
        } else {
            self.on_sidecar_end.or(self.on_batch_end)
        }
    }
}

/// Collects a stage's options; patterns are compiled in [`StageBuilder::build`].
pub struct StageBuilder {
    name: &'static str,
    options: Vec<(&'static str, Arity, &'static str, Handler)>,
    on_batch_end: Option<Hook>,
    on_sidecar_end: Option<Hook>,
}

impl StageBuilder {
    /// Register an option. Registration order is match order.
    pub fn option(
        mut self,
        pattern: &'static str,
        arity: Arity,
        help: &'static str,
        handler: Handler,
    ) -> Self {
        self.options.push((pattern, arity, help, handler));
        self
    }

    pub fn on_batch_end(mut self, hook: Hook) -> Self {
        self.on_batch_end = Some(hook);
        self
    }

    pub fn on_sidecar_end(mut self, hook: Hook) -> Self {
        self.on_sidecar_end = Some(hook);
        self
    }

    pub fn build(self) -> Result<Stage, PatternError> {
        let recognizers = self
            .options
            .into_iter()
            .map(|(pattern, arity, help, handler)| {
                Ok(Recognizer {
                    matcher: Matcher::new(pattern)?,
                    arity,
                    handler,
                    help,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;

        Ok(Stage {
            name: self.name,
            recognizers,
            on_batch_end: self.on_batch_end,
            on_sidecar_end: self.on_sidecar_end,
        })
    }
}
