//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use psr_core::{BookingLength, ConsoleType};

use crate::commands::util::parse_hhmm;

/// PlayStation rental desk.
///
/// Meters console sessions, bills them by the minute block, and keeps table
/// bookings free of double-booking.
#[derive(Debug, Parser)]
#[command(name = "psr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the interactive desk: slots, bookings and payments for one shift.
    Console {
        /// JSON array of bookings to start the shift with.
        #[arg(long)]
        bookings: Option<PathBuf>,

        /// Only advance session clocks with the `tick` command.
        #[arg(long)]
        manual_clock: bool,
    },

    /// Price a session of the given length.
    Quote {
        /// Console type (ps4 or ps5).
        #[arg(long)]
        console: ConsoleType,

        /// Time played (e.g. 1m, 95m, 1h30m, 2).
        #[arg(long)]
        elapsed: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether a booking fits next to the bookings in a file.
    Check(CheckArgs),

    /// Summarise the last seven days of payments.
    Report {
        /// JSON-lines file of payment records (as printed by `payments` in the console).
        #[arg(long)]
        payments: PathBuf,

        /// Last day of the week to report (defaults to today).
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Candidate booking for `psr check`.
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// JSON array of existing bookings.
    #[arg(long)]
    pub bookings: PathBuf,

    /// Table number.
    #[arg(long)]
    pub table: u32,

    /// Booking date (YYYY-MM-DD).
    #[arg(long)]
    pub date: NaiveDate,

    /// Start time (HH:MM).
    #[arg(long, value_parser = parse_hhmm)]
    pub start: NaiveTime,

    /// Length in hours (e.g. 2, 1.5, 90m).
    #[arg(long)]
    pub hours: BookingLength,

    /// Console type; inferred from the table when omitted.
    #[arg(long)]
    pub console: Option<ConsoleType>,

    /// Id of the booking being edited; its stored version is not a conflict.
    #[arg(long)]
    pub id: Option<String>,

    /// Name of the person booking.
    #[arg(long, default_value = "walk-in")]
    pub name: String,

    /// Contact number.
    #[arg(long, default_value = "-")]
    pub contact: String,
}
