/// serializable views of computed schedules
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::batch::{BatchReport, PortfolioSummary};
use crate::decimal::{Money, Rate};
use crate::schedule::{Period, RowKind, Schedule};
use crate::types::ScheduleStatus;

/// one schedule row with its label rendered as text
#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodView {
    pub label: String,
    pub kind: RowKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub opening_principal: Money,
    pub days: i64,
    pub due_principal: Money,
    pub due_interest: Money,
    pub paid_principal: Money,
    pub paid_interest: Money,
    pub cumulative_unpaid_principal: Money,
    pub cumulative_unpaid_interest: Money,
    pub compound: AccrualView,
    pub penalty: AccrualView,
    pub overdue_interest: Money,
    pub paid_overdue_interest: Money,
    pub unpaid_overdue_interest: Money,
    pub previous_row: Option<usize>,
}

/// interest accrued on a basis over a dated window
#[derive(Debug, Serialize, Deserialize)]
pub struct AccrualView {
    pub basis: Money,
    pub rate: Rate,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: i64,
    pub amount: Money,
}

impl PeriodView {
    pub fn from_period(period: &Period) -> Self {
        PeriodView {
            label: period.label.to_string(),
            kind: period.kind,
            start_date: period.start_date,
            end_date: period.end_date,
            opening_principal: period.opening_principal.round_half_up(2),
            days: period.due_days,
            due_principal: period.due_principal.round_half_up(2),
            due_interest: period.due_interest.round_half_up(2),
            paid_principal: period.paid_principal,
            paid_interest: period.paid_interest,
            cumulative_unpaid_principal: period.cumulative_unpaid_principal.round_half_up(2),
            cumulative_unpaid_interest: period.cumulative_unpaid_interest.round_half_up(2),
            compound: AccrualView {
                basis: period.current_unpaid_interest.round_half_up(2),
                rate: period.compound_window.rate,
                start: period.compound_window.start,
                end: period.compound_window.end,
                days: period.compound_window.days,
                amount: period.compound_interest.round_half_up(2),
            },
            penalty: AccrualView {
                basis: period.current_unpaid_principal.round_half_up(2),
                rate: period.penalty_window.rate,
                start: period.penalty_window.start,
                end: period.penalty_window.end,
                days: period.penalty_window.days,
                amount: period.penalty_interest.round_half_up(2),
            },
            overdue_interest: period.overdue_interest.round_half_up(2),
            paid_overdue_interest: period.paid_overdue_interest,
            unpaid_overdue_interest: period.unpaid_overdue_interest.round_half_up(2),
            previous_row: period.refs.previous,
        }
    }
}

/// amounts a claim is made for
#[derive(Debug, Serialize, Deserialize)]
pub struct PayoffView {
    pub arrears_principal: Money,
    pub arrears_interest: Money,
    pub compound: Money,
    pub penalty: Money,
    pub total: Money,
    pub principal_and_interest: Money,
    pub unpaid_overdue: Money,
}

/// serializable view of one schedule
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub status: ScheduleStatus,
    pub periods: Vec<PeriodView>,
    pub totals: PeriodTotalsView,
    pub payoff: PayoffView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PeriodTotalsView {
    pub due_interest: Money,
    pub paid_principal: Money,
    pub paid_interest: Money,
    pub compound_interest: Money,
    pub penalty_interest: Money,
    pub overdue_interest: Money,
    pub paid_overdue_interest: Money,
    pub unpaid_overdue_interest: Money,
}

impl ScheduleView {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let totals = &schedule.totals;
        let payoff = &schedule.payoff;
        ScheduleView {
            status: schedule.status,
            periods: schedule.periods.iter().map(PeriodView::from_period).collect(),
            totals: PeriodTotalsView {
                due_interest: totals.due_interest.round_half_up(2),
                paid_principal: totals.paid_principal,
                paid_interest: totals.paid_interest,
                compound_interest: totals.compound_interest.round_half_up(2),
                penalty_interest: totals.penalty_interest.round_half_up(2),
                overdue_interest: totals.overdue_interest.round_half_up(2),
                paid_overdue_interest: totals.paid_overdue_interest,
                unpaid_overdue_interest: totals.unpaid_overdue_interest.round_half_up(2),
            },
            payoff: PayoffView {
                arrears_principal: payoff.arrears_principal.round_half_up(2),
                arrears_interest: payoff.arrears_interest.round_half_up(2),
                compound: payoff.compound.round_half_up(2),
                penalty: payoff.penalty.round_half_up(2),
                total: payoff.total.round_half_up(2),
                principal_and_interest: payoff.principal_and_interest.round_half_up(2),
                unpaid_overdue: payoff.unpaid_overdue.round_half_up(2),
            },
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// a failed group, with the error rendered as text
#[derive(Debug, Serialize, Deserialize)]
pub struct FailureView {
    pub number: usize,
    pub name: String,
    pub category: String,
    pub message: String,
}

/// serializable view of a whole batch
#[derive(Debug, Serialize, Deserialize)]
pub struct PortfolioView {
    pub summary: PortfolioSummary,
    pub groups: Vec<GroupView>,
    pub failures: Vec<FailureView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupView {
    pub number: usize,
    pub name: String,
    pub schedule: ScheduleView,
}

impl PortfolioView {
    pub fn from_report(report: &BatchReport, as_of: NaiveDate) -> Self {
        PortfolioView {
            summary: report.summary(as_of),
            groups: report
                .schedules
                .iter()
                .map(|g| GroupView {
                    number: g.index + 1,
                    name: g.name.clone(),
                    schedule: ScheduleView::from_schedule(&g.schedule),
                })
                .collect(),
            failures: report
                .failures
                .iter()
                .map(|f| FailureView {
                    number: f.index + 1,
                    name: f.name.clone(),
                    category: format!("{:?}", f.error.kind()),
                    message: f.error.to_string(),
                })
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
