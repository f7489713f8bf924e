pub mod args;
pub mod cli;
pub mod config;
pub mod logging;
pub mod output;
pub mod peer;
pub mod roles;
