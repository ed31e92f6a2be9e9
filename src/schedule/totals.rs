use serde::{Deserialize, Serialize};

use crate::config::LoanTerms;
use crate::decimal::Money;
use crate::interest::{CompoundingEngine, PenaltyEngine};
use crate::schedule::Period;

/// column sums over every schedule row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TotalsRow {
    pub due_principal: Money,
    pub due_interest: Money,
    pub paid_principal: Money,
    pub paid_interest: Money,
    /// gross compound interest, before paid overdue interest is set against it
    pub compound_interest: Money,
    /// gross penalty interest
    pub penalty_interest: Money,
    pub overdue_interest: Money,
    pub paid_overdue_interest: Money,
    pub unpaid_overdue_interest: Money,
    /// compound interest still owed once paid overdue interest is applied
    pub outstanding_compound: Money,
    /// penalty interest still owed once paid overdue interest overflows compound interest
    pub outstanding_penalty: Money,
    /// cumulative unpaid principal on the last row
    pub arrears_principal: Money,
    /// cumulative unpaid interest on the last row
    pub arrears_interest: Money,
}

impl TotalsRow {
    pub fn from_periods(terms: &LoanTerms, periods: &[Period]) -> Self {
        let mut totals = periods.iter().fold(TotalsRow::default(), |mut acc, p| {
            acc.due_principal += p.due_principal;
            acc.due_interest += p.due_interest;
            acc.paid_principal += p.paid_principal;
            acc.paid_interest += p.paid_interest;
            acc.compound_interest += p.compound_interest;
            acc.penalty_interest += p.penalty_interest;
            acc.overdue_interest += p.overdue_interest;
            acc.paid_overdue_interest += p.paid_overdue_interest;
            acc.unpaid_overdue_interest += p.unpaid_overdue_interest;
            acc
        });

        if let Some(last) = periods.last() {
            totals.arrears_principal = last.cumulative_unpaid_principal;
            totals.arrears_interest = last.cumulative_unpaid_interest;
        }

        let compounding = CompoundingEngine::new(terms.day_count);
        let penalty = PenaltyEngine::new(terms.day_count, terms.overdue_rate);
        totals.outstanding_compound =
            compounding.outstanding_compound(totals.compound_interest, totals.paid_overdue_interest);
        totals.outstanding_penalty = penalty.outstanding_penalty(
            totals.penalty_interest,
            totals.compound_interest,
            totals.paid_overdue_interest,
        );
        totals
    }
}

/// amounts owed to settle the loan as of the schedule's cut-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Payoff {
    pub arrears_principal: Money,
    pub arrears_interest: Money,
    pub compound: Money,
    pub penalty: Money,
    pub total: Money,
    pub principal_and_interest: Money,
    pub unpaid_overdue: Money,
}

impl Payoff {
    pub fn from_totals(totals: &TotalsRow) -> Self {
        let principal_and_interest = totals.arrears_principal + totals.arrears_interest;
        Self {
            arrears_principal: totals.arrears_principal,
            arrears_interest: totals.arrears_interest,
            compound: totals.outstanding_compound,
            penalty: totals.outstanding_penalty,
            total: principal_and_interest + totals.outstanding_compound + totals.outstanding_penalty,
            principal_and_interest,
            unpaid_overdue: totals.unpaid_overdue_interest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::schedule::{PeriodLabel, RowKind};
    use crate::types::RepaymentMethod;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms() -> LoanTerms {
        LoanTerms::builder()
            .principal(Money::from_major(100_000))
            .nominal_rate(Rate::from_percentage(12))
            .overdue_rate(Rate::from_percentage(18))
            .term_count(12)
            .start_date(date(2024, 1, 21))
            .maturity_date(date(2025, 1, 21))
            .repayment_method(RepaymentMethod::InterestOnly)
            .as_of(date(2025, 3, 1))
            .build()
            .unwrap()
    }

    fn row(compound: i64, penalty: i64, paid_overdue: i64) -> Period {
        let mut p = Period::new(PeriodLabel::Cycle(1), RowKind::Regular, 1, date(2024, 1, 21), date(2024, 2, 21));
        p.compound_interest = Money::from_major(compound);
        p.penalty_interest = Money::from_major(penalty);
        p.overdue_interest = p.compound_interest + p.penalty_interest;
        p.paid_overdue_interest = Money::from_major(paid_overdue);
        p.unpaid_overdue_interest = p.overdue_interest - p.paid_overdue_interest;
        p
    }

    #[test]
    fn test_paid_overdue_settles_compound_first() {
        let mut last = row(20, 100, 0);
        last.cumulative_unpaid_principal = Money::from_major(5_000);
        last.cumulative_unpaid_interest = Money::from_major(300);
        let periods = vec![row(30, 0, 10), row(10, 50, 0), last];

        let totals = TotalsRow::from_periods(&terms(), &periods);
        assert_eq!(totals.compound_interest, Money::from_major(60));
        assert_eq!(totals.penalty_interest, Money::from_major(150));
        assert_eq!(totals.outstanding_compound, Money::from_major(50));
        assert_eq!(totals.outstanding_penalty, Money::from_major(150));
        assert_eq!(totals.unpaid_overdue_interest, Money::from_major(200));

        let payoff = Payoff::from_totals(&totals);
        assert_eq!(payoff.principal_and_interest, Money::from_major(5_300));
        assert_eq!(payoff.total, Money::from_major(5_500));
        assert_eq!(payoff.unpaid_overdue, Money::from_major(200));
    }

    #[test]
    fn test_overpaid_overdue_eats_into_penalty() {
        let periods = vec![row(40, 100, 0), row(0, 0, 70)];
        let totals = TotalsRow::from_periods(&terms(), &periods);

        assert_eq!(totals.outstanding_compound, Money::ZERO);
        assert_eq!(totals.outstanding_penalty, Money::from_major(70));
        assert_eq!(Payoff::from_totals(&totals).total, Money::from_major(70));
    }

    #[test]
    fn test_empty_schedule_totals_to_zero() {
        let totals = TotalsRow::from_periods(&terms(), &[]);
        assert_eq!(totals, TotalsRow::default());
        assert_eq!(Payoff::from_totals(&totals), Payoff::default());
    }
}
