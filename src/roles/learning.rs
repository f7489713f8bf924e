//! Learning-node launcher (`learning`) and its `ml` sidecar.
//!
//! The learning node needs the networking node's address: a static
//! `--sn-ip`, else `--sn-api-service`, else a query of the networking node's
//! container. The `ml` sidecar joins the main container's network namespace
//! and sees its volumes.

use crate::args::{
    keys, Arity, Disposition, LaunchError, Launcher, OptionMatch, PatternError, SidecarSpec, Stage,
    StageContext, GLOBAL,
};
use crate::roles::{network, resolve_peer, runtime, shared_stages, validate};

pub const ROLE: &str = "learning";
pub const CONTAINER: &str = "ln-node";
pub const SIDECAR: &str = "ml";

pub const MODEL_MOUNT: &str = "/models";

const SUMMARY: &str = "Launch a learning node, optionally with an ml sidecar.";

const SN_IP: &str = "sn-ip";
const SN_API_SERVICE: &str = "sn-api-service";
const SN_CONTAINER: &str = "sn-container";
const SN_API_PORT: &str = "sn-api-port";
const LN_PORT: &str = "ln-port";
const MODEL_DIR: &str = "model-dir";

pub fn launcher() -> Result<Launcher, PatternError> {
    let mut stages = shared_stages()?;
    stages.push(stage()?);
    Ok(Launcher::new(
        ROLE,
        CONTAINER,
        SUMMARY,
        vec![SidecarSpec::new(SIDECAR)?],
        stages,
    ))
}

fn stage() -> Result<Stage, PatternError> {
    Stage::builder("ln")
        .option("--sn-ip", Arity::Value, "networking node address", sn_ip)
        .option("--sn-api-service", Arity::Value, "networking node API service name", sn_api_service)
        .option("--sn-container", Arity::Value, "networking node container to query (default sn-node)", sn_container)
        .option("--sn-api-port", Arity::Value, "networking node API port (default 30304)", sn_api_port)
        .option("--ln-port", Arity::Value, "learning node port, published", ln_port)
        .option("--model-dir", Arity::Value, "model directory on the host (absolute path)", model_dir)
        .on_batch_end(finish)
        .on_sidecar_end(finish_ml)
        .build()
}

/// Learning-node settings apply to the main container; the `ml` sidecar
/// reaches the node through the shared network namespace.
fn main_only(ctx: &StageContext<'_>, m: &OptionMatch) -> Result<(), LaunchError> {
    if ctx.is_main() {
        return Ok(());
    }
    Err(LaunchError::unsupported(
        &m.name,
        format!("only applies to the {ROLE} node itself"),
    ))
}

fn sn_ip(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    main_only(ctx, m)?;
    validate::host(&m.name, m.value())?;
    ctx.assign(SN_IP, m.value());
    Ok(Disposition::Consumed)
}

fn sn_api_service(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    main_only(ctx, m)?;
    validate::service(&m.name, m.value())?;
    ctx.assign(SN_API_SERVICE, m.value());
    Ok(Disposition::Consumed)
}

fn sn_container(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    main_only(ctx, m)?;
    validate::container_name(&m.name, m.value())?;
    ctx.assign(SN_CONTAINER, m.value());
    Ok(Disposition::Consumed)
}

fn sn_api_port(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    main_only(ctx, m)?;
    let port = validate::port(&m.name, m.value())?;
    ctx.assign(SN_API_PORT, port.to_string());
    Ok(Disposition::Consumed)
}

fn ln_port(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    main_only(ctx, m)?;
    let port = validate::port(&m.name, m.value())?;
    ctx.assign(LN_PORT, port.to_string());
    Ok(Disposition::Consumed)
}

fn model_dir(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    main_only(ctx, m)?;
    validate::absolute_path(&m.name, m.value())?;
    ctx.assign(MODEL_DIR, m.value());
    Ok(Disposition::Consumed)
}

fn finish(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    if let Some(ip) = ctx.read_local(SN_IP).map(str::to_string) {
        ctx.bind_env("SN_IP", &ip);
    } else if let Some(service) = ctx.read_local(SN_API_SERVICE).map(str::to_string) {
        ctx.bind_env("SN_API_SERVICE", &service);
    } else {
        let peer = ctx
            .read_local(SN_CONTAINER)
            .unwrap_or(network::CONTAINER)
            .to_string();
        let address = resolve_peer(ctx, "networking node address", &peer)?;
        ctx.bind_env("SN_IP", &address);
    }

    let api_port = ctx
        .read_local(SN_API_PORT)
        .unwrap_or(network::DEFAULT_API_PORT)
        .to_string();
    ctx.bind_env("SN_API_PORT", &api_port);

    if let Some(port) = ctx.read_local(LN_PORT).map(str::to_string) {
        ctx.bind_env("LN_PORT", &port);
        ctx.publish(format!("{port}:{port}/tcp"));
    }
    if let Some(dir) = ctx.read_local(MODEL_DIR).map(str::to_string) {
        ctx.mount(format!("{dir}:{MODEL_MOUNT}"));
        ctx.bind_env("MODEL_DIR", MODEL_MOUNT);
    }
    Ok(())
}

/// The `ml` sidecar shares the main container's network and volumes.
fn finish_ml(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    if let Some(requested) = runtime::requested_network(ctx) {
        return Err(LaunchError::malformed(
            &format!("--{}-network", ctx.target.name),
            requested,
            "the sidecar shares the main container's network",
        ));
    }

    let main = ctx
        .ns
        .read_local(GLOBAL, keys::CONTAINER)
        .unwrap_or(CONTAINER)
        .to_string();
    ctx.runtime_flag(format!("--network=container:{main}"));
    ctx.runtime_flag(format!("--volumes-from={main}"));
    ctx.bind_env("ML_MODEL_DIR", MODEL_MOUNT);
    Ok(())
}
