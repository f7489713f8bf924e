//! Networking-node launcher (`network`).
//!
//! Component stage `sn` handles the sentinel and the node's API and P2P
//! endpoints. The end-of-batch hook requires a host address and a sentinel:
//! either this node is the sentinel, or its address comes from a static IP,
//! a service name, or a query of the sentinel's container. A static value
//! always wins over a query.

use crate::args::{
    Arity, Disposition, LaunchError, Launcher, OptionMatch, PatternError, Stage, StageContext,
};
use crate::roles::{common, resolve_peer, shared_stages, validate};

pub const ROLE: &str = "network";
pub const CONTAINER: &str = "sn-node";

pub const DEFAULT_API_PORT: &str = "30304";
pub const DEFAULT_P2P_PORT: &str = "30303";

const SUMMARY: &str = "Launch a networking node.";

const SENTINEL: &str = "sentinel";
const SENTINEL_IP: &str = "sentinel-ip";
const SENTINEL_API_SERVICE: &str = "sentinel-api-service";
const SENTINEL_CONTAINER: &str = "sentinel-container";

pub fn launcher() -> Result<Launcher, PatternError> {
    let mut stages = shared_stages()?;
    stages.push(stage()?);
    Ok(Launcher::new(ROLE, CONTAINER, SUMMARY, Vec::new(), stages))
}

fn stage() -> Result<Stage, PatternError> {
    Stage::builder("sn")
        .option("--sentinel", Arity::OptionalValue("1"), "this node is the sentinel (1/0)", sentinel)
        .option("--sentinel-ip", Arity::Value, "sentinel address", sentinel_ip)
        .option("--sentinel-api-service", Arity::Value, "sentinel API service name", sentinel_api_service)
        .option("--sentinel-container", Arity::Value, "sentinel container to query for its address", sentinel_container)
        .option(
            "--sn-(api|p2p)-(port|service)",
            Arity::Value,
            "API/P2P port (default 30304/30303) or service name",
            endpoint,
        )
        .on_batch_end(finish)
        .build()
}

fn sentinel(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    let enabled = validate::boolean(&m.name, m.value())?;
    ctx.assign(SENTINEL, if enabled { "1" } else { "0" });
    Ok(Disposition::Consumed)
}

fn sentinel_ip(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::host(&m.name, m.value())?;
    ctx.assign(SENTINEL_IP, m.value());
    Ok(Disposition::Consumed)
}

fn sentinel_api_service(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::service(&m.name, m.value())?;
    ctx.assign(SENTINEL_API_SERVICE, m.value());
    Ok(Disposition::Consumed)
}

fn sentinel_container(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::container_name(&m.name, m.value())?;
    ctx.assign(SENTINEL_CONTAINER, m.value());
    Ok(Disposition::Consumed)
}

/// `--sn-<api|p2p>-<port|service>`, stored as `sn-<api|p2p>-<port|service>`.
fn endpoint(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    let key = format!("sn-{}-{}", m.group(0), m.group(1));
    match m.group(1) {
        "port" => {
            let port = validate::port(&m.name, m.value())?;
            ctx.assign(&key, port.to_string());
        }
        _ => {
            validate::service(&m.name, m.value())?;
            ctx.assign(&key, m.value());
        }
    }
    Ok(Disposition::Consumed)
}

fn finish(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    if ctx.read(common::HOST_IP).is_none() {
        return Err(ctx.missing("host address", "use --host-ip"));
    }
    bind_sentinel(ctx)?;
    bind_endpoints(ctx)
}

fn bind_sentinel(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    let is_sentinel = ctx.read_local(SENTINEL).map(str::to_string);
    let ip = ctx.read_local(SENTINEL_IP).map(str::to_string);
    let service = ctx.read_local(SENTINEL_API_SERVICE).map(str::to_string);

    if let Some(flag) = &is_sentinel {
        ctx.bind_env("SENTINEL", flag);
    }
    if let Some(ip) = &ip {
        ctx.bind_env("SENTINEL_IP", ip);
    }
    if let Some(service) = &service {
        ctx.bind_env("SENTINEL_API_SERVICE", service);
    }
    if is_sentinel.as_deref() == Some("1") || ip.is_some() || service.is_some() {
        return Ok(());
    }

    let Some(peer) = ctx.read_local(SENTINEL_CONTAINER).map(str::to_string) else {
        return Err(ctx.missing(
            "sentinel",
            "use --sentinel, --sentinel-ip, --sentinel-api-service or --sentinel-container",
        ));
    };
    let address = resolve_peer(ctx, "sentinel address", &peer)?;
    ctx.bind_env("SENTINEL_IP", &address);
    Ok(())
}

fn bind_endpoints(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    let api = ctx.read_local("sn-api-port").unwrap_or(DEFAULT_API_PORT).to_string();
    let p2p = ctx.read_local("sn-p2p-port").unwrap_or(DEFAULT_P2P_PORT).to_string();
    if api == p2p {
        return Err(LaunchError::malformed(
            "--sn-p2p-port",
            &p2p,
            "conflicts with the API port",
        ));
    }

    ctx.bind_env("SN_API_PORT", &api);
    ctx.bind_env("SN_P2P_PORT", &p2p);
    ctx.publish(format!("{api}:{api}/tcp"));
    ctx.publish(format!("{p2p}:{p2p}/tcp"));
    ctx.publish(format!("{p2p}:{p2p}/udp"));

    for (key, env) in [("sn-api-service", "SN_API_SERVICE"), ("sn-p2p-service", "SN_P2P_SERVICE")] {
        if let Some(service) = ctx.read_local(key).map(str::to_string) {
            ctx.bind_env(env, &service);
        }
    }
    Ok(())
}
