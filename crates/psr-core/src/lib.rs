//! Core domain logic for the PlayStation rental desk.
//!
//! This crate contains the fundamental types and logic for:
//! - Booking validation: required fields and table/console ranges
//! - Conflict checking: no two bookings share a table at overlapping times
//! - Metering: the per-slot session state machine and its billing rules
//!
//! Nothing here stores data. Callers own the booking list and the payment
//! ledger and pass them in.

pub mod billing;
pub mod booking;
pub mod conflict;
pub mod duration;
pub mod layout;
pub mod payment;
pub mod session;
pub mod types;

pub use billing::{BillingPolicy, Rates, Rupiah, Tariff, compute_charge};
pub use booking::{Booking, BookingError, BookingRequest, FieldError, validate_booking};
pub use conflict::{Conflict, check_conflict};
pub use duration::{BookingLength, ParseDurationError, SessionDuration, format_clock, format_span};
pub use layout::FloorLayout;
pub use payment::{PaymentRecord, PaymentSink};
pub use session::{Remaining, Session, SessionError, SessionState, TickOutcome};
pub use types::{BookingId, ConsoleType, PaymentId, PaymentMethod, SlotId, TableId, ValidationError};
