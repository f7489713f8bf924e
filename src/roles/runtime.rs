//! `runtime` stage: environment, publications, mounts and runtime flags.
//!
//! Everything here is written to the target's own lists, so a sidecar
//! never inherits the main target's ports or mounts.

use crate::args::{keys, Arity, Disposition, LaunchError, OptionMatch, PatternError, Stage, StageContext};
use crate::roles::validate;

const NETWORK: &str = "network";

pub fn stage() -> Result<Stage, PatternError> {
    Stage::builder("runtime")
        .option("--env", Arity::Value, "environment binding KEY=VALUE (repeatable)", env)
        .option("--publish", Arity::Value, "publish a port (repeatable)", publish)
        .option("--volume", Arity::Value, "mount source:/destination[:options] (repeatable)", volume)
        .option("--network", Arity::Value, "container network", network)
        .option("--gpus", Arity::Value, "GPU devices to expose", gpus)
        .option("--(detach|rm)", Arity::Flag, "run detached / remove on exit", flag)
        .on_batch_end(finish)
        .build()
}

fn env(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::env_assignment(&m.name, m.value())?;
    ctx.append(keys::ENV, m.value());
    Ok(Disposition::Consumed)
}

fn publish(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::publish(&m.name, m.value())?;
    ctx.publish(m.value());
    Ok(Disposition::Consumed)
}

fn volume(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::volume(&m.name, m.value())?;
    ctx.mount(m.value());
    Ok(Disposition::Consumed)
}

fn network(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::non_empty(&m.name, m.value())?;
    ctx.assign(NETWORK, m.value());
    Ok(Disposition::Consumed)
}

fn gpus(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::non_empty(&m.name, m.value())?;
    ctx.runtime_flag(format!("--gpus={}", m.value()));
    Ok(Disposition::Consumed)
}

fn flag(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    ctx.runtime_flag(format!("--{}", m.group(0)));
    Ok(Disposition::Consumed)
}

/// The network is a single setting; the last `--network` wins.
fn finish(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    if let Some(network) = ctx.read_local(NETWORK).map(str::to_string) {
        ctx.runtime_flag(format!("--network={network}"));
    }
    Ok(())
}

/// Network a target asked for explicitly, if any.
pub fn requested_network<'a>(ctx: &'a StageContext<'_>) -> Option<&'a str> {
    ctx.read_local(NETWORK)
}
