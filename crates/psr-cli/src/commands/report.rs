//! Report command for the weekly revenue summary.
//!
//! Reads payment records as JSON lines (the format the console's `payments`
//! command prints) and renders seven days of takings split by payment method.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use psr_core::PaymentRecord;

use crate::ledger::{WeeklySummary, weekly_summary};

/// Reads one payment record per line. Blank lines are skipped.
pub fn load_payments(path: &Path) -> Result<Vec<PaymentRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| {
                format!(
                    "failed to parse payment on line {} of {}",
                    index + 1,
                    path.display()
                )
            })
        })
        .collect()
}

// ========== Formatting ==========

fn row(out: &mut String, label: &str, cash: &str, qris: &str, total: &str) {
    writeln!(out, "{label:<12}{cash:>14}{qris:>14}{total:>14}").unwrap();
}

/// Renders the summary as a text table, oldest day first.
pub fn format_summary(summary: &WeeklySummary) -> String {
    let mut output = String::new();
    writeln!(output, "REVENUE {} to {}", summary.start, summary.end).unwrap();
    writeln!(output).unwrap();
    row(&mut output, "date", "cash", "qris", "total");
    for day in &summary.days {
        row(
            &mut output,
            &day.date.to_string(),
            &day.cash.to_string(),
            &day.qris.to_string(),
            &day.total.to_string(),
        );
    }
    writeln!(output, "{}", "─".repeat(54)).unwrap();
    row(
        &mut output,
        "week",
        &summary.cash.to_string(),
        &summary.qris.to_string(),
        &summary.total.to_string(),
    );
    output.trim_end().to_string()
}

pub fn format_summary_json(summary: &WeeklySummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

pub fn run<W: Write>(writer: &mut W, payments: &Path, today: NaiveDate, json: bool) -> Result<()> {
    let records = load_payments(payments)?;
    tracing::debug!(count = records.len(), %today, "loaded payments");
    let summary = weekly_summary(&records, today)
        .with_context(|| format!("failed to summarise {}", payments.display()))?;

    let rendered = if json {
        format_summary_json(&summary)?
    } else {
        format_summary(&summary)
    };
    writeln!(writer, "{rendered}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    const PAYMENTS: &str = r#"
{"id":"p1","date":"2025-01-10","amount":50000,"method":"cash","console":"ps4","slot":1,"timestamp":"2025-01-10T03:00:00Z"}
{"id":"p2","date":"2025-01-10","amount":25000,"method":"qris","console":"ps5","slot":2,"timestamp":"2025-01-10T04:00:00Z"}

{"id":"p3","date":"2025-01-08","amount":5000,"method":"cash","console":"ps4","slot":3,"timestamp":"2025-01-08T05:00:00Z"}
{"id":"p4","date":"2025-01-01","amount":90000,"method":"cash","console":"ps5","slot":4,"timestamp":"2025-01-01T05:00:00Z"}
"#;

    fn payments_file(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("payments.jsonl");
        std::fs::write(&path, content).unwrap();
        (temp, path)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    #[test]
    fn test_load_payments_skips_blank_lines() {
        let (_temp, path) = payments_file(PAYMENTS);
        let records = load_payments(&path).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[2].id.as_str(), "p3");
    }

    #[test]
    fn test_load_payments_reports_line_number() {
        let (_temp, path) = payments_file("{\"id\":\"p1\"}\n");
        let err = load_payments(&path).unwrap_err();
        assert!(
            err.to_string().starts_with("failed to parse payment on line 1"),
            "{err}"
        );
    }

    #[test]
    fn test_text_report() {
        let (_temp, path) = payments_file(PAYMENTS);
        let mut out = Vec::new();
        run(&mut out, &path, today(), false).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_snapshot!(out.trim_end(), @r"
        REVENUE 2025-01-04 to 2025-01-10

        date                  cash          qris         total
        2025-01-04            Rp 0          Rp 0          Rp 0
        2025-01-05            Rp 0          Rp 0          Rp 0
        2025-01-06            Rp 0          Rp 0          Rp 0
        2025-01-07            Rp 0          Rp 0          Rp 0
        2025-01-08        Rp 5.000          Rp 0      Rp 5.000
        2025-01-09            Rp 0          Rp 0          Rp 0
        2025-01-10       Rp 50.000     Rp 25.000     Rp 75.000
        ──────────────────────────────────────────────────────
        week             Rp 55.000     Rp 25.000     Rp 80.000
        ");
    }

    #[test]
    fn test_json_report_totals() {
        let (_temp, path) = payments_file(PAYMENTS);
        let mut out = Vec::new();
        run(&mut out, &path, today(), true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["start"], "2025-01-04");
        assert_eq!(value["end"], "2025-01-10");
        assert_eq!(value["days"].as_array().unwrap().len(), 7);
        assert_eq!(value["days"][6]["total"], 75_000);
        assert_eq!(value["cash"], 55_000);
        assert_eq!(value["qris"], 25_000);
        assert_eq!(value["total"], 80_000);
    }

    #[test]
    fn test_huge_amounts_fail_instead_of_wrapping() {
        let line = |id: &str| {
            serde_json::json!({
                "id": id,
                "date": "2025-01-10",
                "amount": u64::MAX - 1,
                "method": "cash",
                "console": "ps4",
                "slot": 1,
                "timestamp": "2025-01-10T03:00:00Z",
            })
            .to_string()
        };
        let content = format!("{}\n{}\n", line("p1"), line("p2"));
        let (_temp, path) = payments_file(&content);
        let mut out = Vec::new();
        let err = run(&mut out, &path, today(), false).unwrap_err();
        assert!(err.to_string().starts_with("failed to summarise"), "{err}");
        assert!(
            format!("{err:#}").contains("takings on 2025-01-10 are too large to total"),
            "{err:#}"
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_empty_file_gives_zero_week() {
        let (_temp, path) = payments_file("");
        let mut out = Vec::new();
        run(&mut out, &path, today(), false).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("week                  Rp 0          Rp 0          Rp 0\n"));
    }
}
