//! `identity` stage: node identity files and name. Files are mounted, never read.

use crate::args::{Arity, Disposition, LaunchError, OptionMatch, PatternError, Stage, StageContext};
use crate::roles::validate;

const IDENTITY_DIR: &str = "identity-dir";
const IDENTITY_NAME: &str = "identity-name";

pub const IDENTITY_MOUNT: &str = "/identity";

pub fn stage() -> Result<Stage, PatternError> {
    Stage::builder("identity")
        .option("--identity-dir", Arity::Value, "directory holding the node identity (absolute path)", identity_dir)
        .option("--identity-name", Arity::Value, "identity to load from the directory", identity_name)
        .on_batch_end(finish)
        .build()
}

fn identity_dir(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::absolute_path(&m.name, m.value())?;
    ctx.assign(IDENTITY_DIR, m.value());
    Ok(Disposition::Consumed)
}

fn identity_name(ctx: &mut StageContext<'_>, m: &OptionMatch) -> Result<Disposition, LaunchError> {
    validate::container_name(&m.name, m.value())?;
    ctx.assign(IDENTITY_NAME, m.value());
    Ok(Disposition::Consumed)
}

fn finish(ctx: &mut StageContext<'_>) -> Result<(), LaunchError> {
    if let Some(dir) = ctx.read_local(IDENTITY_DIR).map(str::to_string) {
        ctx.mount(format!("{dir}:{IDENTITY_MOUNT}"));
        ctx.bind_env("IDENTITY_DIR", IDENTITY_MOUNT);
    }
    if let Some(name) = ctx.read_local(IDENTITY_NAME).map(str::to_string) {
        ctx.bind_env("IDENTITY_NAME", &name);
    }
    Ok(())
}
