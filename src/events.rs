use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::schedule::PeriodLabel;
use crate::types::PaymentKind;

/// audit records of the decisions taken while building a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    // splice events
    SubPeriodInserted {
        label: PeriodLabel,
        start: NaiveDate,
        end: NaiveDate,
        kind: PaymentKind,
        amount: Money,
    },
    PaymentMerged {
        label: PeriodLabel,
        date: NaiveDate,
        kind: PaymentKind,
        amount: Money,
        /// amount the merge overwrote, if the row already carried one
        replaced: Option<Money>,
    },
    PaymentAbsorbedByGrace {
        date: NaiveDate,
        kind: PaymentKind,
        amount: Money,
    },

    // projection events
    PaidAsDueOverride {
        label: PeriodLabel,
        discarded_principal: Option<Money>,
        discarded_interest: Option<Money>,
    },

    // overdue interest events
    OverdueInterestDiverted {
        date: NaiveDate,
        amount: Money,
    },
    OverdueInterestApplied {
        label: PeriodLabel,
        date: NaiveDate,
        amount: Money,
        replaced: Option<Money>,
    },
    OverdueRowInjected {
        label: PeriodLabel,
        index: usize,
        date: NaiveDate,
        amount: Money,
    },
}

/// ordered log of schedule events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventStore {
    events: Vec<ScheduleEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: ScheduleEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<ScheduleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[ScheduleEvent] {
        &self.events
    }
}
