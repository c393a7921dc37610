//! CLI subcommand implementations.

pub mod check;
pub mod console;
pub mod quote;
pub mod report;
pub mod util;
