//! Reservation conflict validator.
//!
//! A table can host one booking at a time. Two bookings on the same table and
//! date conflict when their half-open intervals `[start, end)` overlap, so a
//! booking ending at 12:00 and one starting at 12:00 are fine.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::booking::Booking;
use crate::duration::BookingLength;
use crate::types::{BookingId, TableId};

/// The existing booking that blocks a candidate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "table {table} is already booked from {} for {length} on {date}",
    .start.format("%H:%M")
)]
pub struct Conflict {
    /// Id of the booking already holding the table.
    pub existing: BookingId,
    pub table: TableId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub length: BookingLength,
}

impl Conflict {
    fn with(existing: &Booking) -> Self {
        Self {
            existing: existing.id.clone(),
            table: existing.table,
            date: existing.date,
            start: existing.start,
            length: existing.length,
        }
    }
}

/// Decides whether `candidate` may be stored next to `existing`.
///
/// Only bookings on the same table and the same date are compared. With
/// `exclude_self`, the entry whose id equals the candidate's is skipped; field
/// equality never counts as identity. The first conflicting booking in slice
/// order is reported; later ones are not inspected.
pub fn check_conflict(
    candidate: &Booking,
    existing: &[Booking],
    exclude_self: bool,
) -> Result<(), Conflict> {
    let (start, end) = candidate.interval();

    for other in existing {
        if exclude_self && other.id == candidate.id {
            continue;
        }
        if other.table != candidate.table || other.date != candidate.date {
            continue;
        }
        let (other_start, other_end) = other.interval();
        if start < other_end && end > other_start {
            tracing::debug!(
                candidate = %candidate.id,
                existing = %other.id,
                table = %candidate.table,
                "booking overlaps existing reservation"
            );
            return Err(Conflict::with(other));
        }
    }
    Ok(())
}

/// Bookings in `existing` that overlap `candidate`, in slice order.
///
/// Used by listings that want to highlight every clash rather than reject on
/// the first one.
pub fn overlapping<'a>(
    candidate: &'a Booking,
    existing: &'a [Booking],
) -> impl Iterator<Item = &'a Booking> + 'a {
    let (start, end) = candidate.interval();
    existing.iter().filter(move |other| {
        other.id != candidate.id
            && other.table == candidate.table
            && other.date == candidate.date
            && {
                let (other_start, other_end) = other.interval();
                start < other_end && end > other_start
            }
    })
}
