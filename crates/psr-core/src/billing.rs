//! Metered billing.
//!
//! Usage is priced in two rounding steps:
//!
//! 1. Elapsed time is rounded up to whole billing blocks (5 minutes by default),
//!    so a partly used block is charged in full.
//! 2. The pro-rata amount for the billed minutes is rounded up to the next
//!    multiple of the rounding step (Rp 5.000 by default).
//!
//! Everything is computed in integer arithmetic, so the result is exact and a
//! session that has not run yet costs nothing.

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::types::ConsoleType;

/// Whole Indonesian rupiah. The currency has no minor unit in practice.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Rupiah(pub u64);

impl Rupiah {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// `None` when the sum does not fit.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }
}

/// Saturates at `u64::MAX` rather than wrapping.
impl Add for Rupiah {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Rupiah {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Formats as `Rp 1.234.567`, grouping thousands with dots.
impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        write!(f, "Rp {grouped}")
    }
}

/// Rounding rules applied to metered usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPolicy {
    /// Usage is billed in blocks of this many minutes.
    pub block_minutes: u64,

    /// Final amounts are rounded up to a multiple of this.
    pub rounding_step: u64,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            block_minutes: 5,
            rounding_step: 5_000,
        }
    }
}

impl BillingPolicy {
    /// Elapsed time rounded up to whole billing blocks, in minutes.
    #[must_use]
    pub fn billed_minutes(&self, elapsed_seconds: u64) -> u64 {
        let block_minutes = self.block_minutes.max(1);
        elapsed_seconds
            .div_ceil(block_minutes.saturating_mul(60))
            .saturating_mul(block_minutes)
    }

    /// Amount owed for `elapsed_seconds` of usage at `hourly_rate`.
    #[must_use]
    pub fn charge(&self, elapsed_seconds: u64, hourly_rate: Rupiah) -> Rupiah {
        let step = self.rounding_step.max(1);
        let numerator = self
            .billed_minutes(elapsed_seconds)
            .saturating_mul(hourly_rate.0);
        Rupiah(numerator.div_ceil(step.saturating_mul(60)).saturating_mul(step))
    }
}

/// Amount owed under the default policy (5-minute blocks, Rp 5.000 steps).
#[must_use]
pub fn compute_charge(elapsed_seconds: u64, hourly_rate: Rupiah) -> Rupiah {
    BillingPolicy::default().charge(elapsed_seconds, hourly_rate)
}

/// Hourly rate per console type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rates {
    pub ps4: Rupiah,
    pub ps5: Rupiah,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            ps4: Rupiah(50_000),
            ps5: Rupiah(75_000),
        }
    }
}

impl Rates {
    #[must_use]
    pub const fn hourly(&self, console: ConsoleType) -> Rupiah {
        match console {
            ConsoleType::Ps4 => self.ps4,
            ConsoleType::Ps5 => self.ps5,
        }
    }
}

/// Rates plus rounding policy: everything needed to price a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tariff {
    #[serde(default)]
    pub rates: Rates,
    #[serde(default)]
    pub billing: BillingPolicy,
}

impl Tariff {
    /// Charge for a console type after `elapsed_seconds` of play.
    #[must_use]
    pub fn charge(&self, console: ConsoleType, elapsed_seconds: u64) -> Rupiah {
        self.billing
            .charge(elapsed_seconds, self.rates.hourly(console))
    }
}
