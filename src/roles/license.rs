//! `license` stage.

use crate::args::{Arity, Disposition, LaunchError, OptionMatch, PatternError, Stage, StageContext};
use crate::roles::validate;

const API_KEY: &str = "api-key";
const LICENSE_FILE: &str = "license-file";

/// Where the license file is mounted inside the container.
pub const LICENSE_MOUNT: &str = "/etc/node/license";

pub fn stage() -> Result<Stage, PatternError> {
    Stage::builder("license")
        .option("--api-key", Arity::Value, "API key (shared with sidecars)", api_key)
        .option("--license-file", Arity::Value, "license file on the host (absolute path)", license_file)
        .on_batch_end(finish)
        .build()
}

fn api_key(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::non_empty(&m.name, m.value())?;
    ctx.assign(API_KEY, m.value());
    Ok(Disposition::Consumed)
}

fn license_file(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::absolute_path(&m.name, m.value())?;
    ctx.assign(LICENSE_FILE, m.value());
    Ok(Disposition::Consumed)
}

fn finish(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    if let Some(key) = ctx.read(API_KEY).map(str::to_string) {
        ctx.bind_env("API_KEY", &key);
    }
    // The license file is mounted per container, not inherited.
    if let Some(path) = ctx.read_local(LICENSE_FILE).map(str::to_string) {
        ctx.mount(format!("{path}:{LICENSE_MOUNT}:ro"));
        ctx.bind_env("LICENSE_FILE", LICENSE_MOUNT);
    }
    Ok(())
}
