pub mod amortization;

use crate::errors::{Result, ScheduleError};
use crate::types::PaymentEvent;

pub use amortization::{
    equal_principal_installment, ipmt, level_payment_split, pmt, ppmt, InstallmentSplit,
};

/// reject payments that cannot be placed on a schedule starting at `start` and cut at `as_of`
pub fn validate_payment(event: &PaymentEvent, start: chrono::NaiveDate, as_of: chrono::NaiveDate) -> Result<()> {
    if !event.amount.is_positive() {
        return Err(ScheduleError::InvalidPaymentAmount { amount: event.amount });
    }
    if event.date <= start {
        return Err(ScheduleError::PaymentBeforeStart {
            date: event.date,
            start,
        });
    }
    if event.date > as_of {
        return Err(ScheduleError::PaymentAfterAsOf {
            date: event.date,
            as_of,
        });
    }
    Ok(())
}

/// sort ascending by date, keeping input order for equal dates
pub fn sort_events(events: &[PaymentEvent]) -> Vec<PaymentEvent> {
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|event| event.date);
    sorted
}
