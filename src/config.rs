use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};
use crate::interest::DayCountConvention;
use crate::types::{FirstCycle, PaymentEvent, PaymentKind, RepaymentMethod};

/// billing day used when the input leaves it blank
pub const DEFAULT_BILLING_DAY: u32 = 21;

/// date layouts accepted from the upload layer
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// immutable terms of a single loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub nominal_rate: Rate,
    pub overdue_rate: Rate,
    pub term_count: u32,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub billing_day: u32,
    pub repayment_method: RepaymentMethod,
    pub early_repayment_term_count: u32,
    pub as_of: NaiveDate,
    #[serde(default)]
    pub first_cycle: FirstCycle,
    #[serde(default = "default_day_count")]
    pub day_count: DayCountConvention,
}

fn default_day_count() -> DayCountConvention {
    DayCountConvention::Actual360
}

impl LoanTerms {
    pub fn builder() -> LoanTermsBuilder {
        LoanTermsBuilder::new()
    }

    /// check the terms against the default limits
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&EngineLimits::default())
    }

    /// check the terms against explicit limits
    pub fn validate_with(&self, limits: &EngineLimits) -> Result<()> {
        if self.term_count == 0 {
            return Err(ScheduleError::InvalidTermCount { term_count: 0 });
        }
        if self.term_count > limits.max_term_count {
            return Err(ScheduleError::TermCountLimit {
                term_count: self.term_count,
                limit: limits.max_term_count,
            });
        }
        if self.early_repayment_term_count > self.term_count {
            return Err(ScheduleError::EarlyRepaymentOutOfRange {
                early: self.early_repayment_term_count,
                term_count: self.term_count,
            });
        }
        if self.early_repayment_term_count == self.term_count {
            return Err(ScheduleError::NoRegularPeriods {
                term_count: self.term_count,
            });
        }
        if !(1..=31).contains(&self.billing_day) {
            return Err(ScheduleError::InvalidBillingDay { day: self.billing_day });
        }
        if self.maturity_date <= self.start_date {
            return Err(ScheduleError::InvalidDateRange {
                message: format!(
                    "maturity {} must be after start {}",
                    self.maturity_date, self.start_date
                ),
            });
        }
        if self.as_of < self.start_date {
            return Err(ScheduleError::InvalidDateRange {
                message: format!("as-of {} is before start {}", self.as_of, self.start_date),
            });
        }
        if !self.principal.is_positive() {
            return Err(ScheduleError::InvalidPrincipal { amount: self.principal });
        }
        for rate in [self.nominal_rate, self.overdue_rate] {
            if rate.is_negative() {
                return Err(ScheduleError::InvalidInterestRate { rate });
            }
        }
        Ok(())
    }

    /// whether the first cycle is a broken stub period
    pub fn has_stub(&self) -> bool {
        calendar::has_stub(self.start_date, self.billing_day, self.first_cycle)
    }

    /// number of billing cycles, including a stub
    pub fn cycle_count(&self) -> u32 {
        self.term_count + u32::from(self.has_stub())
    }

    /// cycles collapsed into the grace row (interest-only loans only)
    pub fn grace_cycles(&self) -> u32 {
        match self.repayment_method {
            RepaymentMethod::InterestOnly => self.early_repayment_term_count,
            _ => 0,
        }
    }

    /// end of billing cycle `n`
    pub fn boundary(&self, n: u32) -> Result<NaiveDate> {
        calendar::billing_boundary(self.start_date, n, self.billing_day, self.first_cycle)
    }

    /// whether the loan runs to maturity on or before the as-of date
    pub fn matures_by_as_of(&self) -> bool {
        self.maturity_date <= self.as_of
    }
}

/// builder for loan terms
#[derive(Debug, Default)]
pub struct LoanTermsBuilder {
    principal: Option<Money>,
    nominal_rate: Option<Rate>,
    overdue_rate: Option<Rate>,
    term_count: Option<u32>,
    start_date: Option<NaiveDate>,
    maturity_date: Option<NaiveDate>,
    billing_day: Option<u32>,
    repayment_method: Option<RepaymentMethod>,
    early_repayment_term_count: Option<u32>,
    as_of: Option<NaiveDate>,
    first_cycle: Option<FirstCycle>,
    day_count: Option<DayCountConvention>,
}

impl LoanTermsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn nominal_rate(mut self, rate: Rate) -> Self {
        self.nominal_rate = Some(rate);
        self
    }

    pub fn overdue_rate(mut self, rate: Rate) -> Self {
        self.overdue_rate = Some(rate);
        self
    }

    pub fn term_count(mut self, terms: u32) -> Self {
        self.term_count = Some(terms);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn maturity_date(mut self, date: NaiveDate) -> Self {
        self.maturity_date = Some(date);
        self
    }

    pub fn billing_day(mut self, day: u32) -> Self {
        self.billing_day = Some(day);
        self
    }

    pub fn repayment_method(mut self, method: RepaymentMethod) -> Self {
        self.repayment_method = Some(method);
        self
    }

    pub fn early_repayment_term_count(mut self, terms: u32) -> Self {
        self.early_repayment_term_count = Some(terms);
        self
    }

    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn first_cycle(mut self, first_cycle: FirstCycle) -> Self {
        self.first_cycle = Some(first_cycle);
        self
    }

    pub fn day_count(mut self, convention: DayCountConvention) -> Self {
        self.day_count = Some(convention);
        self
    }

    /// Build, taking today's date from the system clock when no as-of date is set
    pub fn build(self) -> Result<LoanTerms> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build_with_time(&time)
    }

    /// Build with an explicit time provider for the as-of fallback
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<LoanTerms> {
        let principal = self.principal.ok_or_else(|| missing("principal"))?;
        let nominal_rate = self.nominal_rate.ok_or_else(|| missing("nominal rate"))?;
        let term_count = self.term_count.ok_or_else(|| missing("term count"))?;
        let start_date = self.start_date.ok_or_else(|| missing("start date"))?;
        let maturity_date = self.maturity_date.ok_or_else(|| missing("maturity date"))?;
        let repayment_method = self.repayment_method.ok_or_else(|| missing("repayment method"))?;

        let terms = LoanTerms {
            principal,
            nominal_rate,
            // without an explicit overdue rate, overdue balances accrue at the contract rate
            overdue_rate: self.overdue_rate.unwrap_or(nominal_rate),
            term_count,
            start_date,
            maturity_date,
            billing_day: self.billing_day.unwrap_or(DEFAULT_BILLING_DAY),
            repayment_method,
            early_repayment_term_count: self.early_repayment_term_count.unwrap_or(0),
            as_of: resolve_as_of(self.as_of, time_provider),
            first_cycle: self.first_cycle.unwrap_or_default(),
            day_count: self.day_count.unwrap_or(DayCountConvention::Actual360),
        };
        terms.validate()?;
        Ok(terms)
    }
}

fn missing(field: &str) -> ScheduleError {
    ScheduleError::InvalidConfiguration {
        message: format!("{field} required"),
    }
}

/// guards against pathological input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLimits {
    pub max_term_count: u32,
    pub max_events: usize,
    pub max_rows: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_term_count: 600,
            max_events: 10_000,
            max_rows: 20_000,
        }
    }
}

/// explicit as-of date, or today's date from the time provider
pub fn resolve_as_of(explicit: Option<NaiveDate>, time_provider: &SafeTimeProvider) -> NaiveDate {
    explicit.unwrap_or_else(|| time_provider.now().date_naive())
}

/// parse a date in one of the accepted layouts
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| ScheduleError::InvalidDate {
            message: format!("unrecognised date '{value}'"),
        })
}

/// payment as it arrives from the upload layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub date: String,
    pub amount: Money,
    pub kind: String,
}

impl PaymentInput {
    pub fn into_event(self) -> Result<PaymentEvent> {
        let date = parse_date(&self.date)?;
        let kind: PaymentKind = self.kind.parse()?;
        Ok(PaymentEvent::new(date, self.amount, kind))
    }
}

/// one loan group as it arrives from the upload layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanGroupInput {
    pub name: String,
    pub principal: Money,
    pub nominal_rate: Rate,
    pub overdue_rate: Rate,
    pub term_count: u32,
    pub start_date: String,
    pub maturity_date: String,
    pub repayment_method: String,
    #[serde(default)]
    pub billing_day: Option<u32>,
    /// "first period longer than 30 days": extended first cycle when set, stub when cleared
    #[serde(default)]
    pub first_period_over_30_days: Option<bool>,
    #[serde(default)]
    pub early_repayment_term_count: u32,
    #[serde(default)]
    pub payments: Vec<PaymentInput>,
}

impl LoanGroupInput {
    /// convert into validated terms and payment events
    pub fn into_terms(self, as_of: NaiveDate) -> Result<(LoanTerms, Vec<PaymentEvent>)> {
        let first_cycle = match self.first_period_over_30_days {
            Some(true) => FirstCycle::Extended,
            Some(false) => FirstCycle::Stub,
            None => FirstCycle::default(),
        };

        let terms = LoanTerms {
            principal: self.principal,
            nominal_rate: self.nominal_rate,
            overdue_rate: self.overdue_rate,
            term_count: self.term_count,
            start_date: parse_date(&self.start_date)?,
            maturity_date: parse_date(&self.maturity_date)?,
            billing_day: self.billing_day.unwrap_or(DEFAULT_BILLING_DAY),
            repayment_method: self.repayment_method.parse()?,
            early_repayment_term_count: self.early_repayment_term_count,
            as_of,
            first_cycle,
            day_count: DayCountConvention::Actual360,
        };
        terms.validate()?;

        let events = self
            .payments
            .into_iter()
            .map(PaymentInput::into_event)
            .collect::<Result<Vec<_>>>()?;

        Ok((terms, events))
    }
}

/// a whole upload: shared as-of date plus every loan group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchInput {
    #[serde(default)]
    pub as_of: Option<String>,
    pub groups: Vec<LoanGroupInput>,
}

impl BatchInput {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ScheduleError::InvalidConfiguration {
            message: format!("batch input: {e}"),
        })
    }

    /// as-of date for every group in the batch
    pub fn resolve_as_of(&self, time_provider: &SafeTimeProvider) -> Result<NaiveDate> {
        let explicit = self.as_of.as_deref().map(parse_date).transpose()?;
        Ok(resolve_as_of(explicit, time_provider))
    }
}
