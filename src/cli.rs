//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::roles::Role;

/// Turn launcher options into container runtime invocations.
#[derive(Parser, Debug)]
#[command(name = "nodelaunch", version, about)]
pub struct Cli {
    /// Config file (default: <config dir>/nodelaunch/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format for invocations
    #[arg(long, global = true, value_enum, default_value_t = Format::Shell)]
    pub format: Format,

    /// Log pipeline decisions to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the invocations for a role
    Launch {
        #[arg(value_enum)]
        role: Role,

        /// Launcher options, taken verbatim
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        tokens: Vec<String>,
    },

    /// Show the options a role accepts
    Usage {
        #[arg(value_enum)]
        role: Role,
    },

    /// Show a role's stage order
    Stages {
        #[arg(value_enum)]
        role: Role,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// One shell-quoted command line per target
    Shell,
    /// JSON array of invocations
    Json,
}
