pub mod generator;
pub mod injector;
pub mod projector;
pub mod splicer;
pub mod strategy;
pub mod totals;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{EngineLimits, LoanTerms};
use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::events::{EventStore, ScheduleEvent};
use crate::interest::AccrualWindow;
use crate::payments;
use crate::types::{PaymentEvent, ScheduleStatus};

pub use strategy::{strategy_for, RepaymentStrategy};
pub use totals::{Payoff, TotalsRow};

/// how a row is named on the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodLabel {
    /// "0"
    Opening,
    /// "n"
    Cycle(u32),
    /// "a-b", cycles collapsed into the grace row
    Range(u32, u32),
    /// "c(k)", k-th sub-period cut out of cycle c
    Sub { cycle: u32, index: u32 },
    /// "after-maturity-n"
    AfterMaturity(u32),
    /// "after-last-payment"
    AfterLastPayment,
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodLabel::Opening => write!(f, "0"),
            PeriodLabel::Cycle(n) => write!(f, "{n}"),
            PeriodLabel::Range(a, b) => write!(f, "{a}-{b}"),
            PeriodLabel::Sub { cycle, index } => write!(f, "{cycle}({index})"),
            PeriodLabel::AfterMaturity(n) => write!(f, "after-maturity-{n}"),
            PeriodLabel::AfterLastPayment => write!(f, "after-last-payment"),
        }
    }
}

/// role of a row in the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKind {
    /// row 0, carries the principal
    Opening,
    /// early-repayment cycles collapsed into one row
    Grace,
    /// a generated billing cycle
    Regular,
    /// sub-period cut at a payment date inside the schedule
    Inserted,
    /// sub-period cut at a payment date after the final cycle
    AfterFinal,
    /// synthetic closing row up to the as-of date
    Tail,
    /// zero-length row carrying an unaligned overdue-interest payment
    OverdueInterest,
}

impl RowKind {
    /// rows produced by the generator (one per original billing cycle)
    pub fn is_origin(&self) -> bool {
        matches!(self, RowKind::Grace | RowKind::Regular)
    }

    /// rows cut at a payment date
    pub fn is_inserted(&self) -> bool {
        matches!(self, RowKind::Inserted | RowKind::AfterFinal)
    }
}

/// index links from a row to the rows its figures are derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeriodRefs {
    /// row the running balances continue from
    pub previous: Option<usize>,
    /// row whose end opens the billing cycle this origin row closes
    pub cycle_start: Option<usize>,
}

impl PeriodRefs {
    /// move every reference at or after `index` down by one row
    pub fn shift_from(&mut self, index: usize) {
        for slot in [&mut self.previous, &mut self.cycle_start] {
            if let Some(target) = slot {
                if *target >= index {
                    *target += 1;
                }
            }
        }
    }
}

/// one schedule row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub label: PeriodLabel,
    pub kind: RowKind,
    /// billing cycle the row belongs to (0 before the first cycle)
    pub cycle: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub opening_principal: Money,
    pub due_days: i64,
    pub due_principal: Money,
    pub due_interest: Money,
    pub paid_principal: Money,
    pub paid_interest: Money,
    pub cumulative_unpaid_principal: Money,
    pub cumulative_unpaid_interest: Money,
    pub compound_interest: Money,
    pub current_unpaid_interest: Money,
    pub compound_window: AccrualWindow,
    pub penalty_interest: Money,
    pub current_unpaid_principal: Money,
    pub penalty_window: AccrualWindow,
    pub overdue_interest: Money,
    pub paid_overdue_interest: Money,
    pub unpaid_overdue_interest: Money,
    pub refs: PeriodRefs,
}

impl Period {
    pub fn new(label: PeriodLabel, kind: RowKind, cycle: u32, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            label,
            kind,
            cycle,
            start_date,
            end_date,
            opening_principal: Money::ZERO,
            due_days: 0,
            due_principal: Money::ZERO,
            due_interest: Money::ZERO,
            paid_principal: Money::ZERO,
            paid_interest: Money::ZERO,
            cumulative_unpaid_principal: Money::ZERO,
            cumulative_unpaid_interest: Money::ZERO,
            compound_interest: Money::ZERO,
            current_unpaid_interest: Money::ZERO,
            compound_window: AccrualWindow::empty(Rate::ZERO, start_date),
            penalty_interest: Money::ZERO,
            current_unpaid_principal: Money::ZERO,
            penalty_window: AccrualWindow::empty(Rate::ZERO, start_date),
            overdue_interest: Money::ZERO,
            paid_overdue_interest: Money::ZERO,
            unpaid_overdue_interest: Money::ZERO,
            refs: PeriodRefs::default(),
        }
    }
}

/// schedule as it moves between pipeline stages
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDraft {
    pub status: ScheduleStatus,
    pub periods: Vec<Period>,
    /// overdue-interest payments waiting for injection
    pub overdue: Vec<PaymentEvent>,
    pub events: EventStore,
}

impl ScheduleDraft {
    fn check_rows(&self, limits: &EngineLimits) -> Result<()> {
        if self.periods.len() > limits.max_rows {
            return Err(ScheduleError::RowLimitExceeded { limit: limits.max_rows });
        }
        Ok(())
    }
}

/// finished schedule for one loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub status: ScheduleStatus,
    pub periods: Vec<Period>,
    pub totals: TotalsRow,
    pub payoff: Payoff,
    pub events: Vec<ScheduleEvent>,
}

impl Schedule {
    /// row by its rendered label
    pub fn period(&self, label: &str) -> Option<&Period> {
        self.periods.iter().find(|p| p.label.to_string() == label)
    }

    /// generated billing-cycle rows, in order
    pub fn origin_periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.iter().filter(|p| p.kind.is_origin())
    }

    /// closing row up to the as-of date
    pub fn tail(&self) -> Option<&Period> {
        self.periods.last().filter(|p| p.kind == RowKind::Tail)
    }
}

/// runs the generate, splice, project and inject stages for one loan
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleEngine {
    limits: EngineLimits,
}

impl ScheduleEngine {
    pub fn new(limits: EngineLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    /// build the full schedule for a loan and its payments
    pub fn compute(&self, terms: &LoanTerms, events: &[PaymentEvent]) -> Result<Schedule> {
        terms.validate_with(&self.limits)?;
        if events.len() > self.limits.max_events {
            return Err(ScheduleError::TooManyEvents {
                count: events.len(),
                limit: self.limits.max_events,
            });
        }
        for event in events {
            payments::validate_payment(event, terms.start_date, terms.as_of)?;
        }
        let sorted = payments::sort_events(events);

        let draft = generator::generate(terms)?;
        draft.check_rows(&self.limits)?;

        let draft = splicer::splice(terms, draft, &sorted)?;
        draft.check_rows(&self.limits)?;

        let draft = projector::project(terms, draft)?;
        let mut draft = injector::inject(draft, &self.limits)?;
        injector::relabel_post_maturity(&mut draft);

        let totals = TotalsRow::from_periods(terms, &draft.periods);
        let payoff = Payoff::from_totals(&totals);

        tracing::info!(
            rows = draft.periods.len(),
            status = ?draft.status,
            arrears_principal = %payoff.arrears_principal,
            arrears_interest = %payoff.arrears_interest,
            "schedule computed"
        );

        Ok(Schedule {
            status: draft.status,
            periods: draft.periods,
            totals,
            payoff,
            events: draft.events.take_events(),
        })
    }
}

/// build the schedule with the default limits
pub fn compute_schedule(terms: &LoanTerms, events: &[PaymentEvent]) -> Result<Schedule> {
    ScheduleEngine::default().compute(terms, events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_rendering() {
        assert_eq!(PeriodLabel::Opening.to_string(), "0");
        assert_eq!(PeriodLabel::Cycle(7).to_string(), "7");
        assert_eq!(PeriodLabel::Range(1, 3).to_string(), "1-3");
        assert_eq!(PeriodLabel::Sub { cycle: 4, index: 2 }.to_string(), "4(2)");
        assert_eq!(PeriodLabel::AfterMaturity(1).to_string(), "after-maturity-1");
        assert_eq!(PeriodLabel::AfterLastPayment.to_string(), "after-last-payment");
    }

    #[test]
    fn test_refs_shift() {
        let mut refs = PeriodRefs {
            previous: Some(5),
            cycle_start: Some(2),
        };
        refs.shift_from(3);
        assert_eq!(refs.previous, Some(6));
        assert_eq!(refs.cycle_start, Some(2));

        refs.shift_from(2);
        assert_eq!(refs.cycle_start, Some(3));
    }

    #[test]
    fn test_row_kind_roles() {
        assert!(RowKind::Grace.is_origin());
        assert!(RowKind::Regular.is_origin());
        assert!(!RowKind::Inserted.is_origin());
        assert!(RowKind::AfterFinal.is_inserted());
        assert!(!RowKind::OverdueInterest.is_inserted());
    }
}
