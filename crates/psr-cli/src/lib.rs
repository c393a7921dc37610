//! PlayStation rental desk CLI library.
//!
//! This crate provides configuration, the desk coordinator and the `psr`
//! subcommands on top of `psr-core`.

mod cli;
pub mod commands;
mod config;
pub mod desk;
pub mod ledger;

pub use cli::{CheckArgs, Cli, Commands};
pub use config::{Config, ConfigError};
