//! Launch argument pipeline.
//!
//! Raw launcher tokens become container runtime invocations in four steps:
//!
//! ```text
//! Tokens → Split (per target) → Stages (recognize, validate, derive) → Assemble → Invocations
//! ```
//!
//! Stages talk to the assembler only through the [`Namespace`].

mod assembler;
mod directive;
mod error;
mod matcher;
mod namespace;
mod pipeline;
mod registry;
mod splitter;

pub use assembler::{assemble, directives, Invocation};
pub use directive::{bind_env, keys, mount, publish, runtime_flag, LaunchDirective};
pub use error::LaunchError;
pub use matcher::{Matcher, PatternError};
pub use namespace::{Namespace, Value, GLOBAL};
pub use pipeline::{LaunchContext, Launcher, ProcessedBatch, Target};
pub use registry::{
    Arity, Disposition, Handler, Hook, OptionMatch, Recognizer, Stage, StageBuilder, StageContext,
};
pub use splitter::{
    detect_targets, scan, split, split_option, Batch, OptionScan, SidecarSpec, DECLARE_SIDECAR,
};
