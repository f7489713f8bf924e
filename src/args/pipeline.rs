//! Pipeline: ties splitting, stage dispatch and assembly together.

use crate::args::assembler::{assemble, Invocation};
use crate::args::error::LaunchError;
use crate::args::namespace::{Namespace, GLOBAL};
use crate::args::registry::{Disposition, OptionMatch, Stage, StageContext};
use crate::args::splitter::{detect_targets, scan, split, split_option, Batch, SidecarSpec};
use crate::peer::PeerResolver;

/// One container being configured: the main target or a sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Role name for the main target, sidecar name otherwise.
    pub name: String,
    /// Namespace prefix; empty for the main target.
    pub prefix: String,
    /// Container name used when the user gives no `--name`.
    pub default_container: String,
}

impl Target {
    pub fn main(role: &str, container: &str) -> Self {
        Self {
            name: role.to_string(),
            prefix: GLOBAL.to_string(),
            default_container: container.to_string(),
        }
    }

    pub fn sidecar(name: &str, main_container: &str) -> Self {
        Self {
            name: name.to_string(),
            prefix: name.to_string(),
            default_container: format!("{main_container}-{name}"),
        }
    }

    pub fn is_main(&self) -> bool {
        self.prefix == GLOBAL
    }

    /// An option name from this target's batch as the user wrote it
    /// (`--image` in the `ml` batch is `--ml-image`).
    pub fn option_name(&self, name: &str) -> String {
        if self.is_main() {
            return name.to_string();
        }
        format!("--{}-{}", self.prefix, name.trim_start_matches("--"))
    }
}

/// A target after its batch went through every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedBatch {
    pub target: Target,
    /// Tokens no stage claimed, in input order.
    pub unrecognized: Vec<String>,
}

/// Collaborators and settings shared by every stage during one run.
pub struct LaunchContext<'a> {
    /// Container runtime program placed at the head of each invocation.
    pub program: &'a str,
    /// Image for the main target when `--image` is not given.
    pub default_image: Option<&'a str>,
    /// Resolves peer container addresses for derived values.
    pub peers: &'a dyn PeerResolver,
}

/// A launcher: fixed stage order plus the sidecars it can build.
#[derive(Debug)]
pub struct Launcher {
    role: &'static str,
    container: &'static str,
    summary: &'static str,
    sidecars: Vec<SidecarSpec>,
    stages: Vec<Stage>,
}

impl Launcher {
    pub fn new(
        role: &'static str,
        container: &'static str,
        summary: &'static str,
        sidecars: Vec<SidecarSpec>,
        stages: Vec<Stage>,
    ) -> Self {
        Self {
            role,
            container,
            summary,
            sidecars,
            stages,
        }
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    /// The stage order, which is also match precedence.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    pub fn sidecar_names(&self) -> Vec<&'static str> {
        self.sidecars.iter().map(SidecarSpec::name).collect()
    }

    /// Usage text, generated from the registered recognizers.
    pub fn usage(&self) -> String {
        let mut out = format!("{}\n\nUsage: nodelaunch launch {} [OPTIONS]...\n", self.summary, self.role);
        for stage in &self.stages {
            out.push_str(&format!("\n[{}]\n", stage.name()));
            for rec in stage.recognizers() {
                out.push_str(&format!("  {:<34} {}\n", rec.matcher.pattern(), rec.help));
            }
        }
        if !self.sidecars.is_empty() {
            out.push_str("\nSidecars:\n");
            for name in self.sidecar_names() {
                out.push_str(&format!(
                    "  --{name}-<option>                  apply <option> to the {name} sidecar\n"
                ));
            }
            out.push_str("  --sidecar=<name>                   declare a sidecar explicitly\n");
        }
        out.push_str("\nUnrecognized options are forwarded to the container runtime.\n");
        out
    }

    /// Split, dispatch and validate every batch.
    ///
    /// Returns the filled namespace and the processed batches, main first.
    pub fn process(
        &self,
        raw_args: &[String],
        ctx: &LaunchContext<'_>,
    ) -> Result<(Namespace, Vec<ProcessedBatch>), LaunchError> {
        // Pass 1: decide the target set without touching any state.
        let scanned = scan(raw_args)?;
        let main = Target::main(self.role, self.container);
        let targets = detect_targets(&scanned, main, &self.sidecars)?;

        // Pass 2: route tokens, then run each batch through the stages.
        let mut ns = Namespace::new();
        let mut processed = Vec::new();
        for Batch { target, tokens } in split(raw_args, targets, &self.sidecars) {
            let unrecognized = self.run_batch(&mut ns, &target, &tokens, ctx)?;
            processed.push(ProcessedBatch {
                target,
                unrecognized,
            });
        }
        Ok((ns, processed))
    }

    /// Run the whole pipeline and assemble one invocation per target.
    ///
    /// Nothing is assembled if any batch fails.
    pub fn run(
        &self,
        raw_args: &[String],
        ctx: &LaunchContext<'_>,
    ) -> Result<Vec<Invocation>, LaunchError> {
        let (ns, processed) = self.process(raw_args, ctx)?;
        let invocations = processed
            .iter()
            .map(|batch| assemble(&ns, &batch.target, &batch.unrecognized, ctx.program))
            .collect::<Vec<_>>();

        for inv in &invocations {
            tracing::info!(
                target_name = %inv.target,
                container = %inv.container,
                args = inv.args.len(),
                "assembled invocation"
            );
        }
        Ok(invocations)
    }

    fn run_batch(
        &self,
        ns: &mut Namespace,
        target: &Target,
        tokens: &[String],
        ctx: &LaunchContext<'_>,
    ) -> Result<Vec<String>, LaunchError> {
        let mut stage_ctx = StageContext {
            ns,
            target,
            launch: ctx,
        };

        let mut unrecognized = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            match self.recognize(&mut stage_ctx, tokens, i)? {
                Some(consumed) => i += consumed,
                None => {
                    tracing::trace!(target_name = %target.name, token = %tokens[i], "forwarding unrecognized token");
                    unrecognized.push(tokens[i].clone());
                    i += 1;
                }
            }
        }

        for stage in &self.stages {
            if let Some(hook) = stage.hook_for(target) {
                hook(&mut stage_ctx)?;
            }
        }

        Ok(unrecognized)
    }

    /// Try every stage's recognizers on `tokens[i]`.
    ///
    /// Returns how many tokens were consumed, or `None` if nothing claimed it.
    fn recognize(
        &self,
        ctx: &mut StageContext<'_>,
        tokens: &[String],
        i: usize,
    ) -> Result<Option<usize>, LaunchError> {
        let token = &tokens[i];
        if !token.starts_with('-') {
            return Ok(None);
        }
        let (name, inline) = split_option(token);
        let written = ctx.target.option_name(name);

        for stage in &self.stages {
            for rec in stage.recognizers() {
                let Some(groups) = rec.matcher.captures(name) else {
                    continue;
                };
                let (value, consumed) =
                    rec.arity.take_value(&written, inline, tokens.get(i + 1))?;
                let matched = OptionMatch {
                    name: written.clone(),
                    value,
                    groups,
                };
                match (rec.handler)(ctx, &matched)? {
                    Disposition::Consumed => {
                        tracing::debug!(
                            stage = stage.name(),
                            target_name = %ctx.target.name,
                            option = %matched.name,
                            "recognized option"
                        );
                        return Ok(Some(consumed));
                    }
                    Disposition::Declined => continue,
                }
            }
        }
        Ok(None)
    }
}
