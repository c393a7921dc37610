//! The front desk: owns the shift's bookings, slot sessions and payments.
//!
//! Core logic never holds these collections. The desk passes its booking list
//! to the validator, drives each slot's session, and is the payment sink.

use std::fmt::Write as _;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use psr_core::duration::MAX_DURATION_SECONDS;
use psr_core::{
    Booking, BookingError, BookingId, BookingRequest, ConsoleType, FloorLayout, PaymentId,
    PaymentMethod, Remaining, Session, SessionDuration, SessionError, SessionState, SlotId,
    TableId, Tariff, TickOutcome, ValidationError, format_clock, validate_booking,
};
use thiserror::Error;

use crate::commands::report;
use crate::commands::util::{parse_hhmm, tokenize};
use crate::ledger::{Ledger, SummaryError, weekly_summary};

/// Shown in listings instead of the full booking id.
const SHORT_ID_LEN: usize = 8;

const HELP: &str = "\
commands:
  status                          show every slot
  select <slot> <duration>        pick a duration (open, 1m, 2h, 1.5)
  start <slot>                    switch the console on
  stop <slot>                     switch off and ask for payment
  pay <slot> <cash|qris>          confirm payment
  cancel <slot>                   discard the session without payment
  tick [n]                        advance every running clock by n seconds
  book add key=value...           table, date, start, hours, name, contact, console
  book edit <id> key=value...     change fields of a booking
  book rm <id>                    remove a booking
  book ls [date]                  list bookings
  payments                        print payment records as JSON lines
  report [date]                   seven-day revenue summary
  quit                            end the shift";

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("no such slot: {0}")]
    UnknownSlot(SlotId),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error("no booking matches {0:?}")]
    NoBookingMatch(String),

    #[error("{0:?} matches more than one booking")]
    AmbiguousBooking(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ValidationError> for DeskError {
    fn from(err: ValidationError) -> Self {
        Self::Usage(err.to_string())
    }
}

/// Answer to one console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// The operator asked to end the shift.
    pub quit: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

#[derive(Debug)]
pub struct Desk {
    layout: FloorLayout,
    bookings: Vec<Booking>,
    sessions: Vec<Session>,
    ledger: Ledger,
}

impl Desk {
    /// Fresh shift: every slot idle, no bookings, empty ledger.
    pub fn new(layout: FloorLayout, tariff: &Tariff) -> Self {
        let sessions = layout
            .slots()
            .map(|(slot, console)| Session::new(slot, console, tariff))
            .collect();
        Self {
            layout,
            bookings: Vec::new(),
            sessions,
            ledger: Ledger::new(),
        }
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Loads bookings taken before the shift.
    ///
    /// Each entry gets the same field and overlap checks as `book add`, against
    /// the entries accepted before it. Rejected entries are not stored; one
    /// warning is returned per rejection.
    pub fn seed_bookings(&mut self, bookings: Vec<Booking>) -> Vec<String> {
        let mut warnings = Vec::new();
        for booking in bookings {
            let checked = if self.bookings.iter().any(|b| b.id == booking.id) {
                Err(format!("duplicate id {}", booking.id))
            } else {
                validate_booking(
                    BookingRequest::from(&booking),
                    booking.id.clone(),
                    booking.created_at,
                    &self.layout,
                    &self.bookings,
                    false,
                )
                .map_err(|err| err.to_string())
            };
            match checked {
                Ok(accepted) => self.bookings.push(accepted),
                Err(reason) => {
                    tracing::warn!(booking = %booking.id, %reason, "seeded booking rejected");
                    warnings.push(format!("skipped booking {}: {reason}", short_id(&booking.id)));
                }
            }
        }
        warnings
    }

    /// Validates and stores a new booking.
    pub fn add_booking(
        &mut self,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> Result<&Booking, BookingError> {
        let booking = validate_booking(
            request,
            BookingId::generate(),
            now,
            &self.layout,
            &self.bookings,
            false,
        )
        .inspect_err(|err| tracing::warn!(%err, "booking rejected"))?;

        tracing::info!(
            booking = %booking.id,
            table = %booking.table,
            date = %booking.date,
            "booking added"
        );
        self.bookings.push(booking);
        Ok(&self.bookings[self.bookings.len() - 1])
    }

    /// Re-validates an edited booking against all the others and replaces it in place.
    ///
    /// Fields left unset in `request` keep their stored values; id and creation
    /// time never change.
    pub fn edit_booking(
        &mut self,
        id: &BookingId,
        request: BookingRequest,
    ) -> Result<&Booking, BookingError> {
        let index = self
            .bookings
            .iter()
            .position(|b| &b.id == id)
            .ok_or_else(|| BookingError::NotFound(id.clone()))?;
        let stored = &self.bookings[index];

        let booking = validate_booking(
            request.merged_over(stored),
            stored.id.clone(),
            stored.created_at,
            &self.layout,
            &self.bookings,
            true,
        )
        .inspect_err(|err| tracing::warn!(%err, "booking edit rejected"))?;

        tracing::info!(booking = %booking.id, "booking updated");
        self.bookings[index] = booking;
        Ok(&self.bookings[index])
    }

    pub fn remove_booking(&mut self, id: &BookingId) -> Result<Booking, BookingError> {
        let index = self
            .bookings
            .iter()
            .position(|b| &b.id == id)
            .ok_or_else(|| BookingError::NotFound(id.clone()))?;
        tracing::info!(booking = %id, "booking removed");
        Ok(self.bookings.remove(index))
    }

    /// Bookings for one day in start-time order, or every booking in storage order.
    pub fn bookings_on(&self, date: Option<NaiveDate>) -> Vec<&Booking> {
        match date {
            Some(date) => {
                let mut day: Vec<_> = self.bookings.iter().filter(|b| b.date == date).collect();
                day.sort_by_key(|b| (b.start, b.table));
                day
            }
            None => self.bookings.iter().collect(),
        }
    }

    pub fn session(&self, slot: SlotId) -> Result<&Session, DeskError> {
        self.sessions
            .iter()
            .find(|s| s.slot() == slot)
            .ok_or(DeskError::UnknownSlot(slot))
    }

    fn session_mut(&mut self, slot: SlotId) -> Result<&mut Session, DeskError> {
        self.sessions
            .iter_mut()
            .find(|s| s.slot() == slot)
            .ok_or(DeskError::UnknownSlot(slot))
    }

    pub fn select(&mut self, slot: SlotId, duration: SessionDuration) -> Result<(), DeskError> {
        Ok(self.session_mut(slot)?.select_duration(duration)?)
    }

    pub fn start(&mut self, slot: SlotId) -> Result<(), DeskError> {
        Ok(self.session_mut(slot)?.start()?)
    }

    pub fn stop(&mut self, slot: SlotId) -> Result<(), DeskError> {
        Ok(self.session_mut(slot)?.stop()?)
    }

    pub fn cancel(&mut self, slot: SlotId) -> Result<(), DeskError> {
        Ok(self.session_mut(slot)?.cancel()?)
    }

    /// Settles a stopped session into the ledger.
    pub fn pay<Tz: TimeZone>(
        &mut self,
        slot: SlotId,
        method: PaymentMethod,
        now: &DateTime<Tz>,
    ) -> Result<PaymentId, DeskError> {
        let index = self
            .sessions
            .iter()
            .position(|s| s.slot() == slot)
            .ok_or(DeskError::UnknownSlot(slot))?;
        let session = &mut self.sessions[index];
        Ok(session.confirm(method, now, &mut self.ledger)?)
    }

    /// Delivers one clock tick to every slot. Returns the slots whose time ran out.
    pub fn tick_all(&mut self) -> Vec<SlotId> {
        self.sessions
            .iter_mut()
            .filter_map(|session| (session.tick() == TickOutcome::Expired).then_some(session.slot()))
            .collect()
    }

    /// Operator notice for a slot whose countdown just ended.
    pub fn expiry_notice(&self, slot: SlotId) -> String {
        match self.session(slot) {
            Ok(session) => format!(
                "slot {slot} time is up, amount due {}",
                session.current_charge()
            ),
            Err(err) => err.to_string(),
        }
    }

    pub fn closing_summary(&self) -> String {
        format!(
            "shift closed: {} payments, {}",
            self.ledger.len(),
            self.ledger.total()
        )
    }

    /// Runs one console line. Errors become reply text; state is only changed
    /// by commands that succeed.
    pub fn execute(&mut self, line: &str, now: DateTime<Local>) -> Reply {
        match self.dispatch(line, now) {
            Ok(reply) => reply,
            Err(err) => {
                tracing::debug!(%err, line, "command failed");
                Reply::text(format!("error: {err}"))
            }
        }
    }

    #[expect(
        clippy::too_many_lines,
        reason = "console command dispatch is inherently verbose"
    )]
    fn dispatch(&mut self, line: &str, now: DateTime<Local>) -> Result<Reply, DeskError> {
        let words = tokenize(line).map_err(DeskError::Usage)?;
        let words: Vec<&str> = words.iter().map(String::as_str).collect();

        let text = match words.as_slice() {
            [] => String::new(),
            ["help"] => HELP.to_string(),
            ["quit" | "exit"] => {
                return Ok(Reply {
                    text: self.closing_summary(),
                    quit: true,
                });
            }
            ["status"] => self.render_status(),
            ["select", slot, duration] => {
                let slot = parse_slot(slot)?;
                let duration: SessionDuration = duration
                    .parse()
                    .map_err(|e: psr_core::ParseDurationError| DeskError::Usage(e.to_string()))?;
                self.select(slot, duration)?;
                format!("slot {slot} ({}): duration set to {duration}", self.session(slot)?.console())
            }
            ["start", slot] => {
                let slot = parse_slot(slot)?;
                self.start(slot)?;
                let session = self.session(slot)?;
                match session.remaining() {
                    Remaining::Finite(seconds) => format!(
                        "slot {slot} ({}) running, {} on the clock",
                        session.console(),
                        format_clock(seconds)
                    ),
                    Remaining::Unbounded => {
                        format!("slot {slot} ({}) running, open-ended", session.console())
                    }
                }
            }
            ["stop", slot] => {
                let slot = parse_slot(slot)?;
                self.stop(slot)?;
                let session = self.session(slot)?;
                format!(
                    "slot {slot} stopped after {}, amount due {}",
                    format_clock(session.elapsed_seconds()),
                    session.current_charge()
                )
            }
            ["pay", slot, method] => {
                let slot = parse_slot(slot)?;
                let method: PaymentMethod = method.parse()?;
                let amount = self.session(slot)?.current_charge();
                let id = self.pay(slot, method, &now)?;
                format!("slot {slot} paid {amount} by {method} (payment {id})")
            }
            ["cancel", slot] => {
                let slot = parse_slot(slot)?;
                self.cancel(slot)?;
                format!("slot {slot} cancelled, nothing charged")
            }
            ["tick"] => self.render_ticks(1),
            ["tick", n] => {
                let n: u64 = n
                    .parse()
                    .map_err(|_| DeskError::Usage(format!("invalid tick count: {n}")))?;
                if n > MAX_DURATION_SECONDS {
                    return Err(DeskError::Usage(format!(
                        "tick count must be at most {MAX_DURATION_SECONDS}"
                    )));
                }
                self.render_ticks(n)
            }
            ["book", "add", fields @ ..] => {
                let request = parse_booking_fields(fields)?;
                let booking = self.add_booking(request, now.with_timezone(&Utc))?;
                format!("booked {}", describe_booking(booking))
            }
            ["book", "edit", id, fields @ ..] => {
                let id = self.resolve_booking(id)?;
                let request = parse_booking_fields(fields)?;
                let booking = self.edit_booking(&id, request)?;
                format!("updated {}", describe_booking(booking))
            }
            ["book", "rm", id] => {
                let id = self.resolve_booking(id)?;
                let booking = self.remove_booking(&id)?;
                format!("removed {}", describe_booking(&booking))
            }
            ["book", "ls"] => self.render_bookings(None),
            ["book", "ls", date] => {
                let date: NaiveDate = date
                    .parse()
                    .map_err(|_| DeskError::Usage(format!("invalid date: {date}")))?;
                self.render_bookings(Some(date))
            }
            ["payments"] => self.render_payments()?,
            ["report"] => report::format_summary(&weekly_summary(
                self.ledger.records(),
                now.date_naive(),
            )?),
            ["report", date] => {
                let date: NaiveDate = date
                    .parse()
                    .map_err(|_| DeskError::Usage(format!("invalid date: {date}")))?;
                report::format_summary(&weekly_summary(self.ledger.records(), date)?)
            }
            [other, ..] => {
                return Err(DeskError::Usage(format!(
                    "unknown or incomplete command: {other} (try `help`)"
                )));
            }
        };
        Ok(Reply::text(text))
    }

    /// Finds a booking by full id or unique id prefix.
    fn resolve_booking(&self, prefix: &str) -> Result<BookingId, DeskError> {
        if prefix.is_empty() {
            return Err(DeskError::Usage("booking id must not be empty".to_string()));
        }
        let mut matches = self
            .bookings
            .iter()
            .filter(|b| b.id.as_str().starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(booking), None) => Ok(booking.id.clone()),
            (None, _) => Err(DeskError::NoBookingMatch(prefix.to_string())),
            (Some(_), Some(_)) => Err(DeskError::AmbiguousBooking(prefix.to_string())),
        }
    }

    fn render_ticks(&mut self, n: u64) -> String {
        let mut notices = Vec::new();
        for _ in 0..n {
            for slot in self.tick_all() {
                notices.push(self.expiry_notice(slot));
            }
        }
        if notices.is_empty() {
            format!("advanced {n}s")
        } else {
            format!("advanced {n}s\n{}", notices.join("\n"))
        }
    }

    fn render_status(&self) -> String {
        let mut out = String::from("slot  console  state             duration  elapsed   remaining  charge");
        for session in &self.sessions {
            let duration = session
                .selected()
                .map_or_else(|| "-".to_string(), |d| d.to_string());
            let remaining = match (session.state(), session.remaining()) {
                (SessionState::Idle, _) => "-".to_string(),
                (_, Remaining::Finite(seconds)) => format_clock(seconds),
                (_, Remaining::Unbounded) => "unlimited".to_string(),
            };
            let _ = write!(
                out,
                "\n{:<5} {:<8} {:<17} {:<9} {:<9} {:<10} {}",
                session.slot().to_string(),
                session.console().to_string(),
                session.state().to_string(),
                duration,
                format_clock(session.elapsed_seconds()),
                remaining,
                session.current_charge()
            );
        }
        out
    }

    fn render_bookings(&self, date: Option<NaiveDate>) -> String {
        let bookings = self.bookings_on(date);
        if bookings.is_empty() {
            return "no bookings".to_string();
        }
        bookings
            .into_iter()
            .map(describe_booking)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_payments(&self) -> Result<String, DeskError> {
        if self.ledger.is_empty() {
            return Ok("no payments yet".to_string());
        }
        let lines = self
            .ledger
            .records()
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DeskError::Usage(format!("failed to encode payments: {e}")))?;
        Ok(lines.join("\n"))
    }
}

fn short_id(id: &BookingId) -> &str {
    let s = id.as_str();
    s.get(..SHORT_ID_LEN).unwrap_or(s)
}

/// One-line booking summary: `[1a2b3c4d] 2025-01-10 10:00-12:00 table 5 PS5 Andi Pratama (0812...)`.
fn describe_booking(booking: &Booking) -> String {
    format!(
        "[{}] {} {}-{} table {} {} {} ({})",
        short_id(&booking.id),
        booking.date,
        booking.start.format("%H:%M"),
        booking.end_time().format("%H:%M"),
        booking.table,
        booking.console,
        booking.booker_name,
        booking.contact_number
    )
}

fn parse_slot(s: &str) -> Result<SlotId, DeskError> {
    s.parse()
        .map(SlotId)
        .map_err(|_| DeskError::Usage(format!("invalid slot: {s}")))
}

/// Parses `key=value` words into a booking request. Unknown keys are errors.
fn parse_booking_fields(fields: &[&str]) -> Result<BookingRequest, DeskError> {
    let mut request = BookingRequest::default();
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(DeskError::Usage(format!("expected key=value, got {field:?}")));
        };
        let invalid = || DeskError::Usage(format!("{key}: invalid value {value:?}"));
        match key {
            "table" => request.table = Some(TableId(value.parse().map_err(|_| invalid())?)),
            "date" => request.date = Some(value.parse().map_err(|_| invalid())?),
            "start" => {
                let start: NaiveTime = parse_hhmm(value).map_err(|_| invalid())?;
                request.start = Some(start);
            }
            "hours" => {
                request.length = Some(
                    value
                        .parse()
                        .map_err(|e: psr_core::ParseDurationError| {
                            DeskError::Usage(format!("hours: {e}"))
                        })?,
                );
            }
            "console" => request.console = Some(value.parse::<ConsoleType>()?),
            "name" => request.booker_name = Some(value.to_string()),
            "contact" => request.contact_number = Some(value.to_string()),
            _ => return Err(DeskError::Usage(format!("unknown booking field: {key}"))),
        }
    }
    Ok(request)
}
