//! Table bookings and the field checks an operator's input must pass.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conflict::{Conflict, check_conflict};
use crate::duration::BookingLength;
use crate::layout::FloorLayout;
use crate::types::{BookingId, ConsoleType, TableId};

/// A confirmed table reservation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub table: TableId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    pub length: BookingLength,
    pub console: ConsoleType,
    pub booker_name: String,
    pub contact_number: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Half-open `[start, end)` on the local business timeline.
    #[must_use]
    pub fn interval(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.date.and_time(self.start);
        (start, start + self.length.to_duration())
    }

    /// Local end time of day; may wrap past midnight.
    #[must_use]
    pub fn end_time(&self) -> NaiveTime {
        self.interval().1.time()
    }
}

/// Field that failed validation, with the reason shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BookingError {
    /// One or more fields are missing or out of range.
    #[error("invalid booking: {}", join_fields(.0))]
    Invalid(Vec<FieldError>),

    /// The requested time overlaps an existing booking on the same table.
    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error("booking not found: {0}")]
    NotFound(BookingId),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Operator input for a new or edited booking.
///
/// Every field is optional so that all problems can be reported at once.
/// When editing, unset fields keep their stored value (see [`BookingRequest::merged_over`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub table: Option<TableId>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveTime>,
    pub length: Option<BookingLength>,
    pub console: Option<ConsoleType>,
    pub booker_name: Option<String>,
    pub contact_number: Option<String>,
}

/// Every field set from a stored booking, so it can be validated again.
impl From<&Booking> for BookingRequest {
    fn from(booking: &Booking) -> Self {
        Self {
            table: Some(booking.table),
            date: Some(booking.date),
            start: Some(booking.start),
            length: Some(booking.length),
            console: Some(booking.console),
            booker_name: Some(booking.booker_name.clone()),
            contact_number: Some(booking.contact_number.clone()),
        }
    }
}

impl BookingRequest {
    /// Fills fields left unset from an existing booking.
    #[must_use]
    pub fn merged_over(self, existing: &Booking) -> Self {
        Self {
            table: self.table.or(Some(existing.table)),
            date: self.date.or(Some(existing.date)),
            start: self.start.or(Some(existing.start)),
            length: self.length.or(Some(existing.length)),
            // a new table may belong to the other console type
            console: self
                .console
                .or_else(|| self.table.is_none().then_some(existing.console)),
            booker_name: self
                .booker_name
                .or_else(|| Some(existing.booker_name.clone())),
            contact_number: self
                .contact_number
                .or_else(|| Some(existing.contact_number.clone())),
        }
    }

    /// Checks every field and builds a booking, collecting all problems.
    pub fn into_booking(
        self,
        id: BookingId,
        created_at: DateTime<Utc>,
        layout: &FloorLayout,
    ) -> Result<Booking, BookingError> {
        let mut errors = Vec::new();
        let mut missing = |field: &'static str| {
            errors.push(FieldError {
                field,
                message: "is required".to_string(),
            });
        };

        if self.date.is_none() {
            missing("date");
        }
        if self.start.is_none() {
            missing("start");
        }
        if self.length.is_none() {
            missing("hours");
        }
        if self.table.is_none() {
            missing("table");
        }
        let booker_name = non_blank(self.booker_name);
        if booker_name.is_none() {
            missing("name");
        }
        let contact_number = non_blank(self.contact_number);
        if contact_number.is_none() {
            missing("contact");
        }

        let console = self.table.and_then(|table| {
            match (self.console, layout.console_for_table(table)) {
                (Some(wanted), Some(actual)) if wanted == actual => Some(actual),
                (Some(wanted), _) => {
                    let range = layout.table_range(wanted);
                    errors.push(FieldError {
                        field: "table",
                        message: format!(
                            "table {table} is not a {wanted} table (use {}-{})",
                            range.start(),
                            range.end()
                        ),
                    });
                    None
                }
                (None, Some(actual)) => Some(actual),
                (None, None) => {
                    errors.push(FieldError {
                        field: "table",
                        message: format!("table {table} does not exist"),
                    });
                    None
                }
            }
        });

        match (
            self.table,
            self.date,
            self.start,
            self.length,
            console,
            booker_name,
            contact_number,
        ) {
            (
                Some(table),
                Some(date),
                Some(start),
                Some(length),
                Some(console),
                Some(booker_name),
                Some(contact_number),
            ) if errors.is_empty() => Ok(Booking {
                id,
                table,
                date,
                start,
                length,
                console,
                booker_name,
                contact_number,
                created_at,
            }),
            _ => Err(BookingError::Invalid(errors)),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Full decision for an operator's booking input: field checks, then overlap.
///
/// With `exclude_self`, the stored record carrying the same `id` is ignored so
/// an edit never collides with its own previous version.
pub fn validate_booking(
    request: BookingRequest,
    id: BookingId,
    created_at: DateTime<Utc>,
    layout: &FloorLayout,
    existing: &[Booking],
    exclude_self: bool,
) -> Result<Booking, BookingError> {
    let booking = request.into_booking(id, created_at, layout)?;
    check_conflict(&booking, existing, exclude_self)?;
    Ok(booking)
}

/// Start times travel as `HH:MM`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
