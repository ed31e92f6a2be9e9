use chrono::{Duration, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{BatchInput, EngineLimits, LoanTerms};
use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::schedule::{Schedule, ScheduleEngine};
use crate::types::{GroupId, PaymentEvent, RepaymentMethod};

/// one loan and its payments, computed independently of every other group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanGroup {
    pub id: GroupId,
    pub name: String,
    pub terms: LoanTerms,
    pub events: Vec<PaymentEvent>,
}

impl LoanGroup {
    pub fn new(name: impl Into<String>, terms: LoanTerms, events: Vec<PaymentEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            terms,
            events,
        }
    }
}

/// a group that computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSchedule {
    pub index: usize,
    pub id: GroupId,
    pub name: String,
    pub terms: LoanTerms,
    pub schedule: Schedule,
}

/// a group that failed, attributed by position and name
#[derive(Debug, Clone, PartialEq)]
pub struct GroupFailure {
    pub index: usize,
    pub id: GroupId,
    pub name: String,
    pub error: ScheduleError,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchReport {
    pub schedules: Vec<GroupSchedule>,
    pub failures: Vec<GroupFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn schedule(&self, name: &str) -> Option<&GroupSchedule> {
        self.schedules.iter().find(|g| g.name == name)
    }

    pub fn summary(&self, as_of: NaiveDate) -> PortfolioSummary {
        PortfolioSummary::from_schedules(&self.schedules, as_of)
    }

    fn record_failure(&mut self, index: usize, id: GroupId, name: &str, error: ScheduleError) {
        let error = error.in_group(index, name);
        tracing::warn!(group = index, name = %name, kind = ?error.kind(), error = %error, "loan group failed");
        self.failures.push(GroupFailure {
            index,
            id,
            name: name.to_string(),
            error,
        });
    }
}

/// compute every group; a failing group is reported and the rest carry on
pub fn compute_batch(groups: &[LoanGroup], limits: &EngineLimits) -> BatchReport {
    let engine = ScheduleEngine::new(*limits);
    let mut report = BatchReport::default();

    for (index, group) in groups.iter().enumerate() {
        match engine.compute(&group.terms, &group.events) {
            Ok(schedule) => report.schedules.push(GroupSchedule {
                index,
                id: group.id,
                name: group.name.clone(),
                terms: group.terms.clone(),
                schedule,
            }),
            Err(error) => report.record_failure(index, group.id, &group.name, error),
        }
    }

    tracing::info!(
        groups = groups.len(),
        computed = report.schedules.len(),
        failed = report.failures.len(),
        "batch computed"
    );
    report
}

/// convert raw upload input and compute it; groups whose input cannot be converted are
/// reported alongside the groups that fail to compute
pub fn compute_batch_input(
    input: BatchInput,
    limits: &EngineLimits,
    time_provider: &SafeTimeProvider,
) -> Result<(NaiveDate, BatchReport)> {
    let as_of = input.resolve_as_of(time_provider)?;

    let mut groups = Vec::with_capacity(input.groups.len());
    let mut positions = Vec::with_capacity(input.groups.len());
    let mut rejected = Vec::new();

    for (index, group) in input.groups.into_iter().enumerate() {
        let name = group.name.clone();
        match group.into_terms(as_of) {
            Ok((terms, events)) => {
                groups.push(LoanGroup::new(name, terms, events));
                positions.push(index);
            }
            Err(error) => rejected.push((index, name, error)),
        }
    }

    let mut report = compute_batch(&groups, limits);

    // restore positions from the original upload
    for schedule in &mut report.schedules {
        schedule.index = positions[schedule.index];
    }
    for failure in &mut report.failures {
        let index = positions[failure.index];
        failure.index = index;
        if let ScheduleError::Group { index: i, .. } = &mut failure.error {
            *i = index;
        }
    }
    for (index, name, error) in rejected {
        report.record_failure(index, Uuid::new_v4(), &name, error);
    }
    report.failures.sort_by_key(|f| f.index);

    Ok((as_of, report))
}

/// one line of the portfolio summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummaryRow {
    /// 1-based position in the batch
    pub number: usize,
    pub name: String,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    /// maturity falls after the as-of date, so the balance is claimed early
    pub accelerated: bool,
    pub term_count: u32,
    pub repayment_method: RepaymentMethod,
    pub principal: Money,
    pub nominal_rate: Rate,
    pub overdue_rate: Rate,
    pub paid_principal: Money,
    pub due_interest: Money,
    pub paid_interest: Money,
    pub paid_overdue_interest: Money,
    pub arrears_principal: Money,
    pub arrears_interest: Money,
    pub compound: Money,
    pub penalty: Money,
    pub unpaid_overdue_interest: Money,
}

impl GroupSummaryRow {
    fn from_group(group: &GroupSchedule, as_of: NaiveDate) -> Self {
        let terms = &group.terms;
        let totals = &group.schedule.totals;
        let payoff = &group.schedule.payoff;
        Self {
            number: group.index + 1,
            name: group.name.clone(),
            start_date: terms.start_date,
            maturity_date: terms.maturity_date,
            accelerated: terms.maturity_date > as_of,
            term_count: terms.term_count,
            repayment_method: terms.repayment_method,
            principal: terms.principal,
            nominal_rate: terms.nominal_rate,
            overdue_rate: terms.overdue_rate,
            paid_principal: totals.paid_principal,
            due_interest: totals.due_interest,
            paid_interest: totals.paid_interest,
            paid_overdue_interest: totals.paid_overdue_interest,
            arrears_principal: payoff.arrears_principal,
            arrears_interest: payoff.arrears_interest,
            compound: payoff.compound,
            penalty: payoff.penalty,
            unpaid_overdue_interest: payoff.unpaid_overdue,
        }
    }
}

/// column totals of the portfolio summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub principal: Money,
    pub paid_principal: Money,
    pub due_interest: Money,
    pub paid_interest: Money,
    pub paid_overdue_interest: Money,
    pub arrears_principal: Money,
    pub arrears_interest: Money,
    pub compound: Money,
    pub penalty: Money,
    pub unpaid_overdue_interest: Money,
}

impl SummaryTotals {
    fn add(&mut self, row: &GroupSummaryRow) {
        self.principal += row.principal;
        self.paid_principal += row.paid_principal;
        self.due_interest += row.due_interest;
        self.paid_interest += row.paid_interest;
        self.paid_overdue_interest += row.paid_overdue_interest;
        self.arrears_principal += row.arrears_principal;
        self.arrears_interest += row.arrears_interest;
        self.compound += row.compound;
        self.penalty += row.penalty;
        self.unpaid_overdue_interest += row.unpaid_overdue_interest;
    }
}

/// arrears accruing at one overdue rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBucket {
    pub overdue_rate: Rate,
    /// arrears principal plus arrears interest of the groups in the bucket
    pub base: Money,
    /// 1-based group numbers
    pub groups: Vec<usize>,
}

impl RateBucket {
    pub fn description(&self) -> String {
        format!("on a base of {} at annual rate {}", self.base.round_half_up(2), self.overdue_rate)
    }
}

/// portfolio-level view over every computed group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub as_of: NaiveDate,
    pub rows: Vec<GroupSummaryRow>,
    pub totals: SummaryTotals,
    /// arrears principal + arrears interest + unpaid overdue interest
    pub claim_amount: Money,
    pub rate_buckets: Vec<RateBucket>,
    /// interest keeps running from the day after the as-of date
    pub open_calculation_start: NaiveDate,
}

impl PortfolioSummary {
    pub fn from_schedules(schedules: &[GroupSchedule], as_of: NaiveDate) -> Self {
        let rows: Vec<GroupSummaryRow> = schedules
            .iter()
            .map(|group| GroupSummaryRow::from_group(group, as_of))
            .collect();

        let mut totals = SummaryTotals::default();
        let mut rate_buckets: Vec<RateBucket> = Vec::new();
        for row in &rows {
            totals.add(row);

            let base = row.arrears_principal + row.arrears_interest;
            match rate_buckets.iter_mut().find(|b| b.overdue_rate == row.overdue_rate) {
                Some(bucket) => {
                    bucket.base += base;
                    bucket.groups.push(row.number);
                }
                None => rate_buckets.push(RateBucket {
                    overdue_rate: row.overdue_rate,
                    base,
                    groups: vec![row.number],
                }),
            }
        }

        Self {
            as_of,
            claim_amount: totals.arrears_principal + totals.arrears_interest + totals.unpaid_overdue_interest,
            rows,
            totals,
            rate_buckets,
            open_calculation_start: as_of + Duration::days(1),
        }
    }
}
