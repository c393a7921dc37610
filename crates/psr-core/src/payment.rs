//! Settled payments and where they go.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::billing::Rupiah;
use crate::types::{ConsoleType, PaymentId, PaymentMethod, SlotId};

/// Immutable record of one paid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    /// Local business day the payment was taken on.
    pub date: NaiveDate,
    pub amount: Rupiah,
    pub method: PaymentMethod,
    pub console: ConsoleType,
    pub slot: SlotId,
    pub timestamp: DateTime<Utc>,
}

/// Receiver for settled payments.
///
/// Sessions hand over each record once and keep no copy.
pub trait PaymentSink {
    fn record(&mut self, payment: PaymentRecord);
}

impl PaymentSink for Vec<PaymentRecord> {
    fn record(&mut self, payment: PaymentRecord) {
        self.push(payment);
    }
}

impl<S: PaymentSink + ?Sized> PaymentSink for &mut S {
    fn record(&mut self, payment: PaymentRecord) {
        (**self).record(payment);
    }
}
