use crate::decimal::{Money, Rate};
use crate::interest::{AccrualEngine, AccrualWindow, DayCountConvention, InterestCalculation, InterestCalculator};

/// engine for penalty interest on principal left unpaid
#[derive(Debug, Clone, Copy)]
pub struct PenaltyEngine {
    accrual: AccrualEngine,
    pub overdue_rate: Rate,
}

impl PenaltyEngine {
    pub fn new(convention: DayCountConvention, overdue_rate: Rate) -> Self {
        Self {
            accrual: AccrualEngine::new(convention),
            overdue_rate,
        }
    }

    /// penalty interest on `unpaid_principal` across the window, always at the overdue rate
    pub fn calculate_penalty(&self, unpaid_principal: Money, window: &AccrualWindow) -> InterestCalculation {
        let window = AccrualWindow {
            rate: self.overdue_rate,
            ..*window
        };
        self.accrual.calculate_interest(unpaid_principal, &window)
    }

    /// penalty left after paid overdue interest has first settled compound interest
    pub fn outstanding_penalty(&self, total_penalty: Money, total_compound: Money, paid_overdue: Money) -> Money {
        if total_compound >= paid_overdue {
            total_penalty
        } else {
            total_penalty - (paid_overdue - total_compound)
        }
    }
}

impl InterestCalculator for PenaltyEngine {
    fn calculate_interest(&self, base: Money, window: &AccrualWindow) -> InterestCalculation {
        self.calculate_penalty(base, window)
    }

    fn get_daily_rate(&self, annual_rate: Rate) -> Rate {
        self.accrual.get_daily_rate(annual_rate)
    }
}
