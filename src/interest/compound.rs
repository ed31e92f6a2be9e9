use crate::decimal::{Money, Rate};
use crate::interest::{AccrualEngine, AccrualWindow, DayCountConvention, InterestCalculation, InterestCalculator};

/// engine for compound interest: simple interest charged on interest left unpaid
#[derive(Debug, Clone, Copy)]
pub struct CompoundingEngine {
    accrual: AccrualEngine,
}

impl CompoundingEngine {
    pub fn new(convention: DayCountConvention) -> Self {
        Self {
            accrual: AccrualEngine::new(convention),
        }
    }

    /// interest on `unpaid_interest` over the window at the window's rate.
    /// A negative basis (interest paid ahead) yields a negative figure.
    pub fn calculate_compound(&self, unpaid_interest: Money, window: &AccrualWindow) -> InterestCalculation {
        self.accrual.calculate_interest(unpaid_interest, window)
    }

    /// compound interest netted against overdue interest already paid, floored at zero
    pub fn outstanding_compound(&self, total_compound: Money, paid_overdue: Money) -> Money {
        (total_compound - paid_overdue).max(Money::ZERO)
    }
}

impl InterestCalculator for CompoundingEngine {
    fn calculate_interest(&self, base: Money, window: &AccrualWindow) -> InterestCalculation {
        self.calculate_compound(base, window)
    }

    fn get_daily_rate(&self, annual_rate: Rate) -> Rate {
        self.accrual.get_daily_rate(annual_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compound_on_unpaid_interest() {
        let engine = CompoundingEngine::new(DayCountConvention::Actual360);
        let window = AccrualWindow::new(
            Rate::from_percentage(12),
            NaiveDate::from_ymd_opt(2024, 2, 21).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 21).unwrap(),
        );

        let calc = engine.calculate_compound(Money::from_major(1_000), &window);
        assert_eq!(window.days, 151);
        assert_eq!(calc.interest_amount, Money::from_decimal(dec!(1000) * dec!(0.12) / dec!(360) * dec!(151)));
        assert_eq!(calc.base, Money::from_major(1_000));
    }

    #[test]
    fn test_outstanding_compound_floor() {
        let engine = CompoundingEngine::new(DayCountConvention::Actual360);
        assert_eq!(
            engine.outstanding_compound(Money::from_major(50), Money::from_major(20)),
            Money::from_major(30)
        );
        assert_eq!(engine.outstanding_compound(Money::from_major(50), Money::from_major(80)), Money::ZERO);
    }
}
