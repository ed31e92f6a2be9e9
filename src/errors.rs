use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::{Money, Rate};

/// broad failure category, used by callers deciding how to report a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// the loan terms or payment list violate an input rule
    Validation,
    /// upstream data is malformed in a way the input rules cannot name
    DataConsistency,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("invalid term count: {term_count}")]
    InvalidTermCount {
        term_count: u32,
    },

    #[error("term count {term_count} exceeds limit {limit}")]
    TermCountLimit {
        term_count: u32,
        limit: u32,
    },

    #[error("early repayment term count {early} out of range 0..={term_count}")]
    EarlyRepaymentOutOfRange {
        early: u32,
        term_count: u32,
    },

    #[error("early repayment covers all {term_count} terms: no regular periods would remain")]
    NoRegularPeriods {
        term_count: u32,
    },

    #[error("invalid billing day: {day}")]
    InvalidBillingDay {
        day: u32,
    },

    #[error("invalid date range: {message}")]
    InvalidDateRange {
        message: String,
    },

    #[error("invalid principal: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("unknown repayment method: {value}")]
    UnknownRepaymentMethod {
        value: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("payment dated {date} is not after loan start {start}")]
    PaymentBeforeStart {
        date: NaiveDate,
        start: NaiveDate,
    },

    #[error("payment dated {date} is after the as-of date {as_of}")]
    PaymentAfterAsOf {
        date: NaiveDate,
        as_of: NaiveDate,
    },

    #[error("too many payment events: {count} exceeds limit {limit}")]
    TooManyEvents {
        count: usize,
        limit: usize,
    },

    #[error("schedule row limit {limit} exceeded")]
    RowLimitExceeded {
        limit: usize,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("unknown payment kind: {value}")]
    UnknownPaymentKind {
        value: String,
    },

    #[error("payment dated {date} merged with no row to update")]
    EmptyAccumulator {
        date: NaiveDate,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },

    #[error("loan group {index} ({name}): {source}")]
    Group {
        index: usize,
        name: String,
        #[source]
        source: Box<ScheduleError>,
    },
}

impl ScheduleError {
    /// classify the failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::UnknownPaymentKind { .. }
            | ScheduleError::EmptyAccumulator { .. }
            | ScheduleError::CalculationError { .. } => ErrorKind::DataConsistency,
            ScheduleError::Group { source, .. } => source.kind(),
            _ => ErrorKind::Validation,
        }
    }

    /// wrap with the identity of the loan group it came from
    pub fn in_group(self, index: usize, name: impl Into<String>) -> Self {
        match self {
            // already attributed
            ScheduleError::Group { .. } => self,
            other => ScheduleError::Group {
                index,
                name: name.into(),
                source: Box::new(other),
            },
        }
    }

    /// innermost error, without group attribution
    pub fn root(&self) -> &ScheduleError {
        match self {
            ScheduleError::Group { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
