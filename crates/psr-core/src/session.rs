//! Live metering of one console slot.
//!
//! ```text
//!            start()                 stop() / countdown hits zero
//!   Idle ───────────────▶ Running ───────────────────────────────▶ AwaitingPayment
//!    ▲                      │ tick()                                   │
//!    │                      └──────┘                                   │
//!    └──────────── confirm(method) emits a PaymentRecord ──────────────┤
//!    └──────────── cancel() discards the session ──────────────────────┘
//! ```
//!
//! The machine owns no timer. The caller delivers one `tick()` per elapsed
//! second; ticks that arrive outside `Running` are ignored, so a tick racing a
//! stop or cancel cannot advance a finished session.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::billing::{BillingPolicy, Rupiah, Tariff};
use crate::duration::SessionDuration;
use crate::payment::{PaymentRecord, PaymentSink};
use crate::types::{ConsoleType, PaymentId, PaymentMethod, SlotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Running,
    AwaitingPayment,
}

impl SessionState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::AwaitingPayment => "awaiting_payment",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Countdown left on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Remaining {
    Finite(u64),
    /// Open-ended session; never expires on its own.
    Unbounded,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session was not running; nothing changed.
    Ignored,
    /// One more second metered.
    Running,
    /// Countdown reached zero on this tick; now awaiting payment.
    Expired,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The operator must pick a duration before switching the console on.
    #[error("choose a duration before starting slot {slot}")]
    DurationRequired { slot: SlotId },

    #[error("cannot {action} slot {slot} while it is {state}")]
    InvalidTransition {
        slot: SlotId,
        state: SessionState,
        action: &'static str,
    },
}

/// Metering state for one slot.
#[derive(Debug, Clone)]
pub struct Session {
    slot: SlotId,
    console: ConsoleType,
    hourly_rate: Rupiah,
    policy: BillingPolicy,
    state: SessionState,
    selected: Option<SessionDuration>,
    elapsed_seconds: u64,
    remaining: Remaining,
    current_charge: Rupiah,
}

impl Session {
    /// Idle session for a slot, priced with the tariff's rate for `console`.
    #[must_use]
    pub fn new(slot: SlotId, console: ConsoleType, tariff: &Tariff) -> Self {
        Self {
            slot,
            console,
            hourly_rate: tariff.rates.hourly(console),
            policy: tariff.billing,
            state: SessionState::Idle,
            selected: None,
            elapsed_seconds: 0,
            remaining: Remaining::Finite(0),
            current_charge: Rupiah::ZERO,
        }
    }

    pub const fn slot(&self) -> SlotId {
        self.slot
    }

    pub const fn console(&self) -> ConsoleType {
        self.console
    }

    pub const fn hourly_rate(&self) -> Rupiah {
        self.hourly_rate
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn selected(&self) -> Option<SessionDuration> {
        self.selected
    }

    pub const fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub const fn remaining(&self) -> Remaining {
        self.remaining
    }

    pub const fn current_charge(&self) -> Rupiah {
        self.current_charge
    }

    /// Picks the duration used by the next `start()`. Only while idle.
    pub fn select_duration(&mut self, duration: SessionDuration) -> Result<(), SessionError> {
        self.expect_state(SessionState::Idle, "select a duration for")?;
        if duration == (SessionDuration::Fixed { seconds: 0 }) {
            return Err(SessionError::DurationRequired { slot: self.slot });
        }
        self.selected = Some(duration);
        Ok(())
    }

    pub fn clear_duration(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Idle, "clear the duration of")?;
        self.selected = None;
        Ok(())
    }

    /// `Idle -> Running`. Fails without touching state if no duration is selected.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Idle, "start")?;
        let Some(duration) = self.selected else {
            return Err(SessionError::DurationRequired { slot: self.slot });
        };

        self.elapsed_seconds = 0;
        self.remaining = match duration {
            SessionDuration::Fixed { seconds } => Remaining::Finite(seconds),
            SessionDuration::Open => Remaining::Unbounded,
        };
        self.current_charge = Rupiah::ZERO;
        self.state = SessionState::Running;
        tracing::info!(slot = %self.slot, console = %self.console, %duration, "session started");
        Ok(())
    }

    /// Meters one second. Auto-stops when a countdown reaches zero.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SessionState::Running {
            return TickOutcome::Ignored;
        }

        self.elapsed_seconds += 1;
        if let Remaining::Finite(left) = self.remaining {
            self.remaining = Remaining::Finite(left.saturating_sub(1));
        }
        self.current_charge = self.policy.charge(self.elapsed_seconds, self.hourly_rate);
        tracing::trace!(slot = %self.slot, elapsed = self.elapsed_seconds, "tick");

        if self.remaining == Remaining::Finite(0) {
            self.state = SessionState::AwaitingPayment;
            tracing::info!(
                slot = %self.slot,
                elapsed = self.elapsed_seconds,
                charge = %self.current_charge,
                "time is up, awaiting payment"
            );
            return TickOutcome::Expired;
        }
        TickOutcome::Running
    }

    /// `Running -> AwaitingPayment`. The charge stays at its last metered value.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.expect_state(SessionState::Running, "stop")?;
        self.state = SessionState::AwaitingPayment;
        tracing::info!(
            slot = %self.slot,
            elapsed = self.elapsed_seconds,
            charge = %self.current_charge,
            "session stopped, awaiting payment"
        );
        Ok(())
    }

    /// `AwaitingPayment -> Idle`, handing exactly one record to `sink`.
    ///
    /// The record is dated with the local day of `now` in its own time zone.
    pub fn confirm<Tz, S>(
        &mut self,
        method: PaymentMethod,
        now: &DateTime<Tz>,
        sink: &mut S,
    ) -> Result<PaymentId, SessionError>
    where
        Tz: TimeZone,
        S: PaymentSink + ?Sized,
    {
        self.expect_state(SessionState::AwaitingPayment, "take payment for")?;

        let id = PaymentId::generate();
        let record = PaymentRecord {
            id: id.clone(),
            date: now.date_naive(),
            amount: self.current_charge,
            method,
            console: self.console,
            slot: self.slot,
            timestamp: now.with_timezone(&Utc),
        };
        tracing::info!(
            slot = %self.slot,
            amount = %record.amount,
            %method,
            payment = %id,
            "payment confirmed"
        );
        sink.record(record);
        self.reset();
        Ok(id)
    }

    /// Discards the session without a payment record.
    ///
    /// Accepted while awaiting payment and, to abort a session outright, while
    /// running. The clock halts and accrued state is dropped in the same call.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Idle {
            return Err(self.invalid("cancel"));
        }
        tracing::info!(
            slot = %self.slot,
            state = %self.state,
            elapsed = self.elapsed_seconds,
            "session cancelled"
        );
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.selected = None;
        self.elapsed_seconds = 0;
        self.remaining = Remaining::Finite(0);
        self.current_charge = Rupiah::ZERO;
    }

    fn expect_state(&self, wanted: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == wanted {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    const fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            slot: self.slot,
            state: self.state,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{FixedOffset, NaiveDate};

    fn ps4() -> Session {
        Session::new(SlotId(1), ConsoleType::Ps4, &Tariff::default())
    }

    fn run_for(session: &mut Session, seconds: u64) {
        for _ in 0..seconds {
            session.tick();
        }
    }

    fn jakarta(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3_600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
    }

    #[test]
    fn new_session_is_idle_and_free() {
        let session = ps4();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.current_charge(), Rupiah::ZERO);
        assert_eq!(session.hourly_rate(), Rupiah(50_000));
    }

    #[test]
    fn start_without_duration_is_rejected_and_harmless() {
        let mut session = ps4();
        let err = session.start().unwrap_err();
        assert_eq!(err, SessionError::DurationRequired { slot: SlotId(1) });
        assert_eq!(err.to_string(), "choose a duration before starting slot 1");
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn zero_fixed_duration_cannot_be_selected() {
        let mut session = ps4();
        assert!(
            session
                .select_duration(SessionDuration::Fixed { seconds: 0 })
                .is_err()
        );
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn start_resets_counters() {
        let mut session = ps4();
        session.select_duration(SessionDuration::hours(2)).unwrap();
        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.elapsed_seconds(), 0);
        assert_eq!(session.remaining(), Remaining::Finite(7_200));
        assert_eq!(session.current_charge(), Rupiah::ZERO);
    }

    #[test]
    fn ticks_meter_time_and_charge() {
        let mut session = ps4();
        session.select_duration(SessionDuration::hours(1)).unwrap();
        session.start().unwrap();
        run_for(&mut session, 60);
        assert_eq!(session.elapsed_seconds(), 60);
        assert_eq!(session.remaining(), Remaining::Finite(3_540));
        assert_eq!(session.current_charge(), Rupiah(5_000));
    }

    #[test]
    fn one_hour_countdown_expires_exactly_once() {
        let mut session = ps4();
        session.select_duration(SessionDuration::hours(1)).unwrap();
        session.start().unwrap();

        let mut expired = 0;
        for _ in 0..3_600 {
            if session.tick() == TickOutcome::Expired {
                expired += 1;
            }
        }
        assert_eq!(expired, 1);
        assert_eq!(session.state(), SessionState::AwaitingPayment);
        assert_eq!(session.remaining(), Remaining::Finite(0));
        assert_eq!(session.elapsed_seconds(), 3_600);
        assert_eq!(session.current_charge(), Rupiah(50_000));

        // late ticks are ignored and the clock stays at zero
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.remaining(), Remaining::Finite(0));
        assert_eq!(session.elapsed_seconds(), 3_600);
    }

    #[test]
    fn one_minute_session_expires_after_sixty_ticks() {
        let mut session = ps4();
        session.select_duration(SessionDuration::minutes(1)).unwrap();
        session.start().unwrap();
        run_for(&mut session, 59);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.current_charge(), Rupiah(5_000));
    }

    #[test]
    fn open_session_never_expires() {
        let mut session = ps4();
        session.select_duration(SessionDuration::Open).unwrap();
        session.start().unwrap();
        run_for(&mut session, 5 * 3_600);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(session.remaining(), Remaining::Unbounded);
        assert_eq!(session.current_charge(), Rupiah(250_000));
    }

    #[test]
    fn stop_freezes_charge() {
        let mut session = ps4();
        session.select_duration(SessionDuration::Open).unwrap();
        session.start().unwrap();
        run_for(&mut session, 301);
        session.stop().unwrap();
        let frozen = session.current_charge();
        assert_eq!(frozen, Rupiah(10_000));

        run_for(&mut session, 1_000);
        assert_eq!(session.current_charge(), frozen);
        assert_eq!(session.elapsed_seconds(), 301);
    }

    #[test]
    fn confirm_emits_one_record_with_frozen_charge() {
        let mut session = Session::new(SlotId(4), ConsoleType::Ps5, &Tariff::default());
        session.select_duration(SessionDuration::hours(1)).unwrap();
        session.start().unwrap();
        run_for(&mut session, 1_800);
        session.stop().unwrap();

        let mut ledger: Vec<PaymentRecord> = Vec::new();
        let now = jakarta(2025, 1, 11, 2);
        let id = session
            .confirm(PaymentMethod::Qris, &now, &mut ledger)
            .unwrap();

        assert_eq!(ledger.len(), 1);
        let record = &ledger[0];
        assert_eq!(record.id, id);
        assert_eq!(record.amount, Rupiah(40_000));
        assert_eq!(record.method, PaymentMethod::Qris);
        assert_eq!(record.console, ConsoleType::Ps5);
        assert_eq!(record.slot, SlotId(4));
        // the record carries the local date; the UTC instant falls on the day before
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 1, 11).unwrap());
        assert_eq!(record.timestamp, now.with_timezone(&Utc));
        assert_eq!(
            record.timestamp.date_naive(),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
    }

    #[test]
    fn confirm_resets_to_idle_defaults() {
        let mut session = ps4();
        session.select_duration(SessionDuration::Open).unwrap();
        session.start().unwrap();
        run_for(&mut session, 90);
        session.stop().unwrap();
        let mut ledger: Vec<PaymentRecord> = Vec::new();
        session
            .confirm(PaymentMethod::Cash, &jakarta(2025, 1, 10, 12), &mut ledger)
            .unwrap();

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.selected(), None);
        assert_eq!(session.elapsed_seconds(), 0);
        assert_eq!(session.remaining(), Remaining::Finite(0));
        assert_eq!(session.current_charge(), Rupiah::ZERO);
        // a new session needs a fresh duration
        assert!(session.start().is_err());
    }

    #[test]
    fn cancel_discards_without_record() {
        let mut session = ps4();
        session.select_duration(SessionDuration::hours(1)).unwrap();
        session.start().unwrap();
        run_for(&mut session, 600);
        session.stop().unwrap();

        session.cancel().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.current_charge(), Rupiah::ZERO);

        // nothing left to pay for
        let mut ledger: Vec<PaymentRecord> = Vec::new();
        assert!(
            session
                .confirm(PaymentMethod::Cash, &jakarta(2025, 1, 10, 12), &mut ledger)
                .is_err()
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn cancel_while_running_halts_clock() {
        let mut session = ps4();
        session.select_duration(SessionDuration::Open).unwrap();
        session.start().unwrap();
        run_for(&mut session, 10);
        session.cancel().unwrap();
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.elapsed_seconds(), 0);
    }

    #[test]
    fn invalid_transitions_leave_state_untouched() {
        let mut session = ps4();
        assert!(matches!(
            session.stop(),
            Err(SessionError::InvalidTransition { action: "stop", .. })
        ));
        assert!(session.cancel().is_err());

        session.select_duration(SessionDuration::Open).unwrap();
        session.start().unwrap();
        assert!(session.start().is_err());
        assert!(session.select_duration(SessionDuration::hours(1)).is_err());
        run_for(&mut session, 5);
        session.stop().unwrap();

        // no way back to running from awaiting payment
        let err = session.start().unwrap_err();
        assert_eq!(err.to_string(), "cannot start slot 1 while it is awaiting_payment");
        assert!(session.stop().is_err());
        assert_eq!(session.state(), SessionState::AwaitingPayment);
        assert_eq!(session.elapsed_seconds(), 5);
    }
}
