//! Append-only payment ledger and the weekly revenue summary built from it.

use chrono::{Duration, NaiveDate};
use psr_core::{PaymentMethod, PaymentRecord, PaymentSink, Rupiah};
use serde::Serialize;
use thiserror::Error;

/// Days covered by the weekly summary, ending with (and including) today.
pub const SUMMARY_DAYS: i64 = 7;

/// Payments collected during a shift, in settlement order.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    records: Vec<PaymentRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PaymentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of every recorded payment.
    pub fn total(&self) -> Rupiah {
        self.records.iter().map(|r| r.amount).sum()
    }
}

impl PaymentSink for Ledger {
    fn record(&mut self, payment: PaymentRecord) {
        tracing::debug!(payment = %payment.id, amount = %payment.amount, "ledger append");
        self.records.push(payment);
    }
}

/// Takings for one business day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub cash: Rupiah,
    pub qris: Rupiah,
    pub total: Rupiah,
}

/// Seven days of takings split by payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// One entry per day, oldest first; days without payments are zero.
    pub days: Vec<DailyTotals>,
    pub cash: Rupiah,
    pub qris: Rupiah,
    pub total: Rupiah,
}

fn checked_sum(amounts: impl IntoIterator<Item = Rupiah>) -> Option<Rupiah> {
    amounts
        .into_iter()
        .try_fold(Rupiah::ZERO, Rupiah::checked_add)
}

/// A day or week total too large to represent.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SummaryError {
    #[error("takings on {0} are too large to total")]
    Day(NaiveDate),

    #[error("takings for the week ending {0} are too large to total")]
    Week(NaiveDate),
}

/// Aggregates payments dated `today - 6 ..= today`. Other records are ignored.
pub fn weekly_summary(
    records: &[PaymentRecord],
    today: NaiveDate,
) -> Result<WeeklySummary, SummaryError> {
    let start = today - Duration::days(SUMMARY_DAYS - 1);
    let mut days: Vec<DailyTotals> = start
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| DailyTotals {
            date,
            cash: Rupiah::ZERO,
            qris: Rupiah::ZERO,
            total: Rupiah::ZERO,
        })
        .collect();

    for record in records {
        if record.date < start || record.date > today {
            continue;
        }
        let Ok(index) = usize::try_from((record.date - start).num_days()) else {
            continue;
        };
        let day = &mut days[index];
        let overflow = SummaryError::Day(record.date);
        let by_method = match record.method {
            PaymentMethod::Cash => &mut day.cash,
            PaymentMethod::Qris => &mut day.qris,
        };
        *by_method = by_method.checked_add(record.amount).ok_or(overflow)?;
        day.total = day.total.checked_add(record.amount).ok_or(overflow)?;
    }

    let week = SummaryError::Week(today);
    let cash = checked_sum(days.iter().map(|d| d.cash)).ok_or(week)?;
    let qris = checked_sum(days.iter().map(|d| d.qris)).ok_or(week)?;
    let total = cash.checked_add(qris).ok_or(week)?;
    Ok(WeeklySummary {
        start,
        end: today,
        days,
        cash,
        qris,
        total,
    })
}
