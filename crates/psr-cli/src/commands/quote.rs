//! `psr quote`: price a session without running one.

use std::io::Write;

use anyhow::{Context, Result};
use psr_core::duration::parse_seconds;
use psr_core::{ConsoleType, ParseDurationError, Rupiah, Tariff, format_clock};
use serde::Serialize;

/// Priced session, as printed by `--json`.
#[derive(Debug, Serialize)]
pub struct Quote {
    pub console: ConsoleType,
    pub elapsed_seconds: u64,
    pub billed_minutes: u64,
    pub hourly_rate: Rupiah,
    pub amount: Rupiah,
}

impl Quote {
    pub fn new(console: ConsoleType, elapsed_seconds: u64, tariff: &Tariff) -> Self {
        Self {
            console,
            elapsed_seconds,
            billed_minutes: tariff.billing.billed_minutes(elapsed_seconds),
            hourly_rate: tariff.rates.hourly(console),
            amount: tariff.charge(console, elapsed_seconds),
        }
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    console: ConsoleType,
    elapsed: &str,
    tariff: &Tariff,
    json: bool,
) -> Result<()> {
    // nothing played is a valid quote
    let elapsed_seconds = match parse_seconds(elapsed) {
        Ok(seconds) => seconds,
        Err(ParseDurationError::Zero) => 0,
        Err(err) => return Err(err).context("invalid --elapsed"),
    };
    let quote = Quote::new(console, elapsed_seconds, tariff);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&quote)?)?;
        return Ok(());
    }

    writeln!(writer, "Console:      {}", quote.console)?;
    writeln!(writer, "Elapsed:      {}", format_clock(quote.elapsed_seconds))?;
    writeln!(writer, "Billed:       {} min", quote.billed_minutes)?;
    writeln!(writer, "Hourly rate:  {}", quote.hourly_rate)?;
    writeln!(writer, "Amount due:   {}", quote.amount)?;
    Ok(())
}
