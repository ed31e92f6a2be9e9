use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar;
use crate::decimal::{Money, Rate};
use crate::interest::{AccrualWindow, InterestCalculation, InterestCalculator};

/// annualisation basis applied to plain calendar-day counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DayCountConvention {
    /// actual days / 365
    Actual365,
    /// actual days / 360
    Actual360,
}

/// engine for simple day-count interest
#[derive(Debug, Clone, Copy)]
pub struct AccrualEngine {
    pub convention: DayCountConvention,
}

impl AccrualEngine {
    pub fn new(convention: DayCountConvention) -> Self {
        Self { convention }
    }

    /// calendar days between dates; the convention only changes the year basis
    pub fn calculate_days(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        calendar::day_count(start, end)
    }

    /// get year basis for the convention
    pub fn year_basis(&self) -> u32 {
        match self.convention {
            DayCountConvention::Actual365 => 365,
            DayCountConvention::Actual360 => 360,
        }
    }

    /// base × rate ÷ basis × days, kept at working precision
    pub fn calculate_simple_interest(&self, base: Money, annual_rate: Rate, days: i64) -> Money {
        let interest = base.as_decimal() * annual_rate.as_decimal() / Decimal::from(self.year_basis())
            * Decimal::from(days);
        Money::from_decimal(interest)
    }

    /// interest for one billing cycle split into contiguous segments, each accruing on its own
    /// opening balance for its own days
    pub fn apportioned_interest(&self, annual_rate: Rate, segments: &[(Money, i64)]) -> Money {
        segments
            .iter()
            .map(|(base, days)| self.calculate_simple_interest(*base, annual_rate, *days))
            .sum()
    }
}

impl InterestCalculator for AccrualEngine {
    fn calculate_interest(&self, base: Money, window: &AccrualWindow) -> InterestCalculation {
        InterestCalculation {
            interest_amount: self.calculate_simple_interest(base, window.rate, window.days),
            base,
            window: *window,
        }
    }

    fn get_daily_rate(&self, annual_rate: Rate) -> Rate {
        Rate::from_decimal(annual_rate.as_decimal() / Decimal::from(self.year_basis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_count_conventions() {
        let engine_365 = AccrualEngine::new(DayCountConvention::Actual365);
        let engine_360 = AccrualEngine::new(DayCountConvention::Actual360);

        let start = date(2024, 1, 1);
        let end = date(2024, 2, 1);

        assert_eq!(engine_365.calculate_days(start, end), 31);
        assert_eq!(engine_360.calculate_days(start, end), 31);
        assert_eq!(engine_365.year_basis(), 365);
        assert_eq!(engine_360.year_basis(), 360);
    }

    #[test]
    fn test_simple_interest() {
        let engine = AccrualEngine::new(DayCountConvention::Actual365);
        let interest = engine.calculate_simple_interest(Money::from_major(10_000), Rate::from_percentage(5), 30);
        assert_eq!(interest.round_dp(2), Money::from_str_exact("41.10").unwrap());

        let engine = AccrualEngine::new(DayCountConvention::Actual360);
        let interest = engine.calculate_simple_interest(Money::from_major(100_000), Rate::from_percentage(12), 31);
        assert_eq!(interest, Money::from_decimal(dec!(100000) * dec!(0.12) / dec!(360) * dec!(31)));
    }

    #[test]
    fn test_apportioned_interest_matches_single_segment_when_balance_constant() {
        let engine = AccrualEngine::new(DayCountConvention::Actual360);
        let rate = Rate::from_percentage(12);
        let balance = Money::from_major(100_000);

        let whole = engine.calculate_simple_interest(balance, rate, 30);
        let split = engine.apportioned_interest(rate, &[(balance, 12), (balance, 18)]);
        assert_eq!(whole.round_dp(6), split.round_dp(6));

        // balance drops mid-cycle
        let split = engine.apportioned_interest(rate, &[(balance, 12), (Money::from_major(70_000), 18)]);
        assert_eq!(split.round_dp(2), Money::from_decimal(dec!(820.00)));
    }

    #[test]
    fn test_interest_calculator_window() {
        let engine = AccrualEngine::new(DayCountConvention::Actual360);
        let window = AccrualWindow::new(Rate::from_percentage(18), date(2024, 1, 21), date(2024, 3, 21));
        let calc = engine.calculate_interest(Money::from_major(3_600), &window);

        assert_eq!(window.days, 60);
        assert_eq!(calc.interest_amount, Money::from_major(108));
        assert_eq!(engine.get_daily_rate(Rate::from_percentage(36)), Rate::from_decimal(dec!(0.001)));
    }
}
