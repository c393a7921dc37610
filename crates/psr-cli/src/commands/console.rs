//! `psr console`: the interactive desk for one shift.
//!
//! Operator lines from stdin and the one-second clock are multiplexed on a
//! single task, so every command and every tick reaches the desk in turn.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::time::Interval;

use crate::Config;
use crate::commands::util::load_bookings;
use crate::desk::Desk;

pub fn run(config: &Config, bookings: Option<&Path>, manual_clock: bool) -> Result<()> {
    let mut desk = Desk::new(config.floor, &config.tariff());
    let mut stdout = std::io::stdout();

    if let Some(path) = bookings {
        let loaded = load_bookings(path)?;
        tracing::info!(count = loaded.len(), path = %path.display(), "loaded bookings");
        for warning in desk.seed_bookings(loaded) {
            writeln!(stdout, "warning: {warning}")?;
        }
    }

    let period = (!manual_clock).then(|| config.tick_interval());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start console runtime")?;

    let result = runtime.block_on(run_loop(
        &mut desk,
        BufReader::new(tokio::io::stdin()),
        &mut stdout,
        period,
    ));
    // a stdin read still in flight after `quit` must not keep the process alive
    runtime.shutdown_background();
    result
}

/// Drives the desk until `quit` or end of input.
///
/// With `period` set, every elapsed period delivers one tick to all slots.
/// Without it the clock only moves on the `tick` command.
pub async fn run_loop<R, W>(
    desk: &mut Desk,
    reader: R,
    writer: &mut W,
    period: Option<Duration>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    let mut ticker = match period {
        Some(period) => {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            Some(interval)
        }
        None => None,
    };

    writeln!(
        writer,
        "psr desk: {} slots, type `help` for commands",
        desk.sessions().len()
    )?;
    writer.flush()?;

    loop {
        tokio::select! {
            biased;

            line = lines.next_line() => {
                let Some(line) = line.context("failed to read console input")? else {
                    tracing::debug!("end of input");
                    writeln!(writer, "{}", desk.closing_summary())?;
                    break;
                };
                let reply = desk.execute(&line, Local::now());
                if !reply.text.is_empty() {
                    writeln!(writer, "{}", reply.text)?;
                }
                writer.flush()?;
                if reply.quit {
                    break;
                }
            }

            () = next_tick(ticker.as_mut()) => {
                for slot in desk.tick_all() {
                    writeln!(writer, "{}", desk.expiry_notice(slot))?;
                    writer.flush()?;
                }
            }
        }
    }

    Ok(())
}

async fn next_tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
