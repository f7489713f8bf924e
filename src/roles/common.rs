//! `common` stage: container name, image, command and node-wide settings.

use crate::args::{
    keys, Arity, Disposition, LaunchError, OptionMatch, PatternError, Stage, StageContext, GLOBAL,
};
use crate::roles::validate;

pub const HOST_IP: &str = "host-ip";
const LOG_LEVEL: &str = "log-level";

pub fn stage() -> Result<Stage, PatternError> {
    Stage::builder("common")
        .option("--name", Arity::Value, "container name", name)
        .option("--image", Arity::Value, "container image", image)
        .option("--tag", Arity::Value, "replace the image tag", tag)
        .option("--entrypoint", Arity::Value, "override the image entrypoint", entrypoint)
        .option("--cmd", Arity::Value, "command argument after the image (repeatable)", cmd)
        .option("--host-ip", Arity::Value, "address other nodes reach this host at", host_ip)
        .option("--log-level", Arity::Value, "node log level (error|warn|info|debug|trace)", log_level)
        .on_batch_end(finish)
        .build()
}

fn name(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::container_name(&m.name, m.value())?;
    ctx.assign(keys::NAME, m.value());
    Ok(Disposition::Consumed)
}

fn image(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::image(&m.name, m.value())?;
    ctx.assign(keys::IMAGE, m.value());
    Ok(Disposition::Consumed)
}

fn tag(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::tag(&m.name, m.value())?;
    ctx.assign(keys::TAG, m.value());
    Ok(Disposition::Consumed)
}

fn entrypoint(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::non_empty(&m.name, m.value())?;
    ctx.assign(keys::ENTRYPOINT, m.value());
    Ok(Disposition::Consumed)
}

fn cmd(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    ctx.append(keys::CMD, m.value());
    Ok(Disposition::Consumed)
}

fn host_ip(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::host(&m.name, m.value())?;
    ctx.assign(HOST_IP, m.value());
    Ok(Disposition::Consumed)
}

fn log_level(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::log_level(&m.name, m.value())?;
    ctx.assign(LOG_LEVEL, m.value());
    Ok(Disposition::Consumed)
}

/// Resolve the container name and image reference, and bind node-wide env.
///
/// Name, image and tag are read locally: a sidecar never runs the main
/// target's image. Host address and log level fall back to the main target.
fn finish(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    let container = match ctx.read_local(keys::NAME) {
        Some(name) => name.to_string(),
        None if ctx.is_main() => ctx.target.default_container.clone(),
        None => match ctx.ns.read_local(GLOBAL, keys::CONTAINER) {
            Some(main) => format!("{main}-{}", ctx.target.name),
            None => ctx.target.default_container.clone(),
        },
    };
    ctx.assign(keys::CONTAINER, container);

    let image = match ctx.read_local(keys::IMAGE) {
        Some(image) => image.to_string(),
        None if ctx.is_main() => match ctx.launch.default_image {
            Some(image) => image.to_string(),
            None => return Err(ctx.missing("image", "use --image or set [images] in the config file")),
        },
        None => {
            let hint = format!("use --{}-image", ctx.target.name);
            return Err(ctx.missing(&format!("{} image", ctx.target.name), hint));
        }
    };
    let image_ref = match ctx.read_local(keys::TAG) {
        Some(tag) => retag(&image, tag),
        None => image,
    };
    ctx.assign(keys::IMAGE_REF, image_ref);

    if let Some(host) = ctx.read(HOST_IP).map(str::to_string) {
        ctx.bind_env("HOST_IP", &host);
    }
    if let Some(level) = ctx.read(LOG_LEVEL).map(str::to_string) {
        ctx.bind_env("LOG_LEVEL", &level);
    }
    Ok(())
}

/// Replace (or add) the tag of an image reference. A digest is dropped.
fn retag(image: &str, tag: &str) -> String {
    let name = image.split('@').next().unwrap_or(image);
    let last_segment = name.rfind('/').map_or(0, |i| i + 1);
    let repository = match name[last_segment..].rfind(':') {
        Some(i) => &name[..last_segment + i],
        None => name,
    };
    format!("{repository}:{tag}")
}
