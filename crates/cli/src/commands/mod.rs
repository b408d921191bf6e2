//! Subcommand implementations.

pub mod config_cmd;
pub mod list;
pub mod run;
