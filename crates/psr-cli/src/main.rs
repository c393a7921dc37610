use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use psr_cli::commands::{check, console, quote, report};
use psr_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr; stdout belongs to the console and command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout();
    match &cli.command {
        Some(Commands::Console {
            bookings,
            manual_clock,
        }) => {
            console::run(&config, bookings.as_deref(), *manual_clock)?;
        }
        Some(Commands::Quote {
            console,
            elapsed,
            json,
        }) => {
            quote::run(&mut stdout, *console, elapsed, &config.tariff(), *json)?;
        }
        Some(Commands::Check(args)) => {
            check::run(&mut stdout, args, &config.floor)?;
        }
        Some(Commands::Report {
            payments,
            today,
            json,
        }) => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            report::run(&mut stdout, payments, today, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
