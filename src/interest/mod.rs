pub mod accrual;
pub mod compound;
pub mod penalty;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::decimal::{Money, Rate};

pub use accrual::{AccrualEngine, DayCountConvention};
pub use compound::CompoundingEngine;
pub use penalty::PenaltyEngine;

/// a dated window over which an annual rate accrues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualWindow {
    pub rate: Rate,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: i64,
}

impl AccrualWindow {
    pub fn new(rate: Rate, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            rate,
            start,
            end,
            days: calendar::day_count(start, end),
        }
    }

    /// zero-length window, used by rows that accrue nothing
    pub fn empty(rate: Rate, date: NaiveDate) -> Self {
        Self::new(rate, date, date)
    }
}

/// interest calculation result
#[derive(Debug, Clone, PartialEq)]
pub struct InterestCalculation {
    pub interest_amount: Money,
    pub base: Money,
    pub window: AccrualWindow,
}

/// trait for interest calculations
pub trait InterestCalculator {
    fn calculate_interest(&self, base: Money, window: &AccrualWindow) -> InterestCalculation;

    fn get_daily_rate(&self, annual_rate: Rate) -> Rate;
}
