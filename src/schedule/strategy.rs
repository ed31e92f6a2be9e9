use rust_decimal::Decimal;
use std::fmt;

use crate::config::LoanTerms;
use crate::decimal::Money;
use crate::errors::Result;
use crate::interest::AccrualEngine;
use crate::payments::{equal_principal_installment, level_payment_split};
use crate::schedule::{Period, RowKind};
use crate::types::RepaymentMethod;

/// billing cycle closed by an origin row
#[derive(Debug, Clone, PartialEq)]
pub struct OriginCycle {
    /// 1-based installment number, `None` for a stub cycle
    pub installment: Option<u32>,
    /// days from the end of the previous origin row to this row's end
    pub cycle_days: i64,
    /// (opening balance, days) of every row since the previous origin row, this one included
    pub segments: Vec<(Money, i64)>,
}

/// what a strategy sees of the row being projected
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub terms: &'a LoanTerms,
    pub accrual: &'a AccrualEngine,
    /// row with its dates, opening balance and payments already set
    pub row: &'a Period,
    pub previous: &'a Period,
    pub origin: Option<&'a OriginCycle>,
    /// row on which the outstanding principal of an interest-only loan falls due
    pub principal_due_row: bool,
}

impl RowContext<'_> {
    fn kind(&self) -> RowKind {
        self.row.kind
    }

    /// interest on the row's opening balance over `days`
    fn interest_on_balance(&self, days: i64) -> Money {
        self.accrual
            .calculate_simple_interest(self.row.opening_principal, self.terms.nominal_rate, days)
    }
}

/// per-method due amounts and penalty basis
pub trait RepaymentStrategy: fmt::Debug + Send + Sync {
    fn method(&self) -> RepaymentMethod;

    fn due_principal(&self, ctx: &RowContext<'_>) -> Result<Money>;

    fn due_interest(&self, ctx: &RowContext<'_>) -> Result<Money>;

    /// principal the penalty accrues on, `None` when the row carries no penalty
    fn penalty_basis(&self, ctx: &RowContext<'_>, due_principal: Money) -> Option<Money>;
}

/// pick the strategy for the loan's repayment method
pub fn strategy_for(terms: &LoanTerms) -> Result<Box<dyn RepaymentStrategy>> {
    let strategy: Box<dyn RepaymentStrategy> = match terms.repayment_method {
        RepaymentMethod::InterestOnly => Box::new(InterestOnlyStrategy),
        RepaymentMethod::EqualPrincipal => Box::new(EqualPrincipalStrategy {
            installment: equal_principal_installment(terms.principal, terms.term_count)?,
        }),
        RepaymentMethod::EqualInstallment => Box::new(EqualInstallmentStrategy),
    };
    Ok(strategy)
}

/// interest each cycle, principal at maturity
#[derive(Debug, Clone, Copy, Default)]
pub struct InterestOnlyStrategy;

impl RepaymentStrategy for InterestOnlyStrategy {
    fn method(&self) -> RepaymentMethod {
        RepaymentMethod::InterestOnly
    }

    fn due_principal(&self, ctx: &RowContext<'_>) -> Result<Money> {
        if ctx.principal_due_row {
            return Ok(ctx.row.opening_principal);
        }
        Ok(match ctx.kind() {
            RowKind::AfterFinal => Money::ZERO,
            // whatever is repaid early falls due the day it is paid
            _ => ctx.row.paid_principal,
        })
    }

    fn due_interest(&self, ctx: &RowContext<'_>) -> Result<Money> {
        Ok(match ctx.origin {
            Some(origin) => ctx
                .accrual
                .apportioned_interest(ctx.terms.nominal_rate, &origin.segments),
            None => Money::ZERO,
        })
    }

    fn penalty_basis(&self, ctx: &RowContext<'_>, due_principal: Money) -> Option<Money> {
        match ctx.kind() {
            RowKind::AfterFinal if ctx.principal_due_row => Some(due_principal),
            RowKind::AfterFinal => Some(ctx.previous.cumulative_unpaid_principal),
            _ => None,
        }
    }
}

/// penalty basis shared by the amortising methods
fn amortising_penalty_basis(ctx: &RowContext<'_>) -> Money {
    let previous = ctx.previous;
    match ctx.kind() {
        RowKind::AfterFinal => previous.cumulative_unpaid_principal,
        _ if previous.kind.is_inserted() => previous.current_unpaid_principal - previous.paid_principal,
        _ => previous.due_principal - previous.paid_principal,
    }
}

/// equal principal every cycle, interest on the declining balance
#[derive(Debug, Clone, Copy)]
pub struct EqualPrincipalStrategy {
    pub installment: Money,
}

impl RepaymentStrategy for EqualPrincipalStrategy {
    fn method(&self) -> RepaymentMethod {
        RepaymentMethod::EqualPrincipal
    }

    fn due_principal(&self, ctx: &RowContext<'_>) -> Result<Money> {
        let Some(origin) = ctx.origin else {
            return Ok(Money::ZERO);
        };
        Ok(match origin.installment {
            // the final installment takes the rounding residue
            Some(n) if n == ctx.terms.term_count => {
                ctx.terms.principal - self.installment * Decimal::from(n - 1)
            }
            Some(_) => self.installment,
            None => Money::ZERO,
        })
    }

    fn due_interest(&self, ctx: &RowContext<'_>) -> Result<Money> {
        Ok(match ctx.origin {
            Some(origin) => ctx.interest_on_balance(origin.cycle_days).round_half_up(2),
            None => Money::ZERO,
        })
    }

    fn penalty_basis(&self, ctx: &RowContext<'_>, _due_principal: Money) -> Option<Money> {
        Some(amortising_penalty_basis(ctx))
    }
}

/// level installment split into principal and interest
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualInstallmentStrategy;

impl RepaymentStrategy for EqualInstallmentStrategy {
    fn method(&self) -> RepaymentMethod {
        RepaymentMethod::EqualInstallment
    }

    fn due_principal(&self, ctx: &RowContext<'_>) -> Result<Money> {
        match ctx.origin.and_then(|o| o.installment) {
            Some(n) => Ok(level_payment_split(
                ctx.terms.principal,
                ctx.terms.nominal_rate,
                n,
                ctx.terms.term_count,
            )?
            .principal),
            None => Ok(Money::ZERO),
        }
    }

    fn due_interest(&self, ctx: &RowContext<'_>) -> Result<Money> {
        let Some(origin) = ctx.origin else {
            return Ok(Money::ZERO);
        };
        match origin.installment {
            Some(n) => Ok(level_payment_split(
                ctx.terms.principal,
                ctx.terms.nominal_rate,
                n,
                ctx.terms.term_count,
            )?
            .interest),
            // stub cycle: plain day-count interest
            None => Ok(ctx.interest_on_balance(origin.cycle_days).round_half_up(2)),
        }
    }

    fn penalty_basis(&self, ctx: &RowContext<'_>, _due_principal: Money) -> Option<Money> {
        Some(amortising_penalty_basis(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::interest::DayCountConvention;
    use crate::schedule::PeriodLabel;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(method: RepaymentMethod) -> LoanTerms {
        LoanTerms::builder()
            .principal(Money::from_major(100_000))
            .nominal_rate(Rate::from_percentage(12))
            .overdue_rate(Rate::from_percentage(18))
            .term_count(12)
            .start_date(date(2024, 1, 21))
            .maturity_date(date(2025, 1, 21))
            .repayment_method(method)
            .as_of(date(2024, 7, 21))
            .build()
            .unwrap()
    }

    fn row(kind: RowKind, balance: i64) -> Period {
        let mut p = Period::new(PeriodLabel::Cycle(2), kind, 2, date(2024, 2, 21), date(2024, 3, 21));
        p.opening_principal = Money::from_major(balance);
        p.due_days = 29;
        p
    }

    fn origin(installment: Option<u32>, segments: Vec<(Money, i64)>) -> OriginCycle {
        let cycle_days = segments.iter().map(|(_, d)| d).sum();
        OriginCycle {
            installment,
            cycle_days,
            segments,
        }
    }

    #[test]
    fn test_interest_only_apportions_across_sub_periods() {
        let t = terms(RepaymentMethod::InterestOnly);
        let accrual = AccrualEngine::new(DayCountConvention::Actual360);
        let strategy = strategy_for(&t).unwrap();
        let current = row(RowKind::Regular, 70_000);
        let previous = row(RowKind::Inserted, 100_000);
        let cycle = origin(None, vec![(Money::from_major(100_000), 12), (Money::from_major(70_000), 17)]);

        let ctx = RowContext {
            terms: &t,
            accrual: &accrual,
            row: &current,
            previous: &previous,
            origin: Some(&cycle),
            principal_due_row: false,
        };

        let expected = Money::from_decimal(dec!(100000) * dec!(0.12) / dec!(360) * dec!(12))
            + Money::from_decimal(dec!(70000) * dec!(0.12) / dec!(360) * dec!(17));
        assert_eq!(strategy.due_interest(&ctx).unwrap(), expected);
        assert_eq!(strategy.due_principal(&ctx).unwrap(), Money::ZERO);
        assert_eq!(strategy.penalty_basis(&ctx, Money::ZERO), None);
    }

    #[test]
    fn test_interest_only_principal_due_row() {
        let t = terms(RepaymentMethod::InterestOnly);
        let accrual = AccrualEngine::new(DayCountConvention::Actual360);
        let strategy = strategy_for(&t).unwrap();
        let current = row(RowKind::AfterFinal, 80_000);
        let previous = row(RowKind::Regular, 80_000);

        let ctx = RowContext {
            terms: &t,
            accrual: &accrual,
            row: &current,
            previous: &previous,
            origin: None,
            principal_due_row: true,
        };
        let due = strategy.due_principal(&ctx).unwrap();
        assert_eq!(due, Money::from_major(80_000));
        assert_eq!(strategy.penalty_basis(&ctx, due), Some(Money::from_major(80_000)));

        let ctx = RowContext {
            principal_due_row: false,
            ..ctx
        };
        assert_eq!(strategy.due_principal(&ctx).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_equal_principal_residue_in_final_installment() {
        let t = terms(RepaymentMethod::EqualPrincipal);
        let accrual = AccrualEngine::new(DayCountConvention::Actual360);
        let strategy = strategy_for(&t).unwrap();
        let current = row(RowKind::Regular, 100_000);
        let previous = row(RowKind::Regular, 100_000);

        let total: Money = (1..=12)
            .map(|n| {
                let cycle = origin(Some(n), vec![(Money::from_major(100_000), 30)]);
                let ctx = RowContext {
                    terms: &t,
                    accrual: &accrual,
                    row: &current,
                    previous: &previous,
                    origin: Some(&cycle),
                    principal_due_row: false,
                };
                strategy.due_principal(&ctx).unwrap()
            })
            .sum();
        assert_eq!(total, Money::from_major(100_000));
    }

    #[test]
    fn test_equal_principal_interest_rounded_on_cycle_days() {
        let t = terms(RepaymentMethod::EqualPrincipal);
        let accrual = AccrualEngine::new(DayCountConvention::Actual360);
        let strategy = strategy_for(&t).unwrap();
        let current = row(RowKind::Regular, 91_666);
        let previous = row(RowKind::Regular, 100_000);
        let cycle = origin(Some(2), vec![(Money::from_major(91_666), 29)]);

        let ctx = RowContext {
            terms: &t,
            accrual: &accrual,
            row: &current,
            previous: &previous,
            origin: Some(&cycle),
            principal_due_row: false,
        };
        // 91666 × 0.12 / 360 × 29 = 886.104666...
        assert_eq!(strategy.due_interest(&ctx).unwrap(), Money::from_decimal(dec!(886.10)));
    }

    #[test]
    fn test_amortising_penalty_basis_by_row_kind() {
        let t = terms(RepaymentMethod::EqualInstallment);
        let accrual = AccrualEngine::new(DayCountConvention::Actual360);
        let strategy = strategy_for(&t).unwrap();
        let current = row(RowKind::Regular, 90_000);

        let mut previous = row(RowKind::Regular, 100_000);
        previous.due_principal = Money::from_major(8_000);
        previous.paid_principal = Money::from_major(5_000);
        previous.current_unpaid_principal = Money::from_major(6_000);
        previous.cumulative_unpaid_principal = Money::from_major(9_000);

        let ctx = RowContext {
            terms: &t,
            accrual: &accrual,
            row: &current,
            previous: &previous,
            origin: None,
            principal_due_row: false,
        };
        assert_eq!(strategy.penalty_basis(&ctx, Money::ZERO), Some(Money::from_major(3_000)));

        let mut inserted = previous.clone();
        inserted.kind = RowKind::Inserted;
        let ctx = RowContext {
            previous: &inserted,
            ..ctx
        };
        assert_eq!(strategy.penalty_basis(&ctx, Money::ZERO), Some(Money::from_major(1_000)));

        let after_final = row(RowKind::AfterFinal, 0);
        let ctx = RowContext {
            row: &after_final,
            ..ctx
        };
        assert_eq!(strategy.penalty_basis(&ctx, Money::ZERO), Some(Money::from_major(9_000)));
    }

    #[test]
    fn test_equal_installment_uses_level_payment_split() {
        let t = terms(RepaymentMethod::EqualInstallment);
        let accrual = AccrualEngine::new(DayCountConvention::Actual360);
        let strategy = strategy_for(&t).unwrap();
        assert_eq!(strategy.method(), RepaymentMethod::EqualInstallment);

        let current = row(RowKind::Regular, 100_000);
        let previous = row(RowKind::Opening, 100_000);
        let cycle = origin(Some(1), vec![(Money::from_major(100_000), 31)]);
        let ctx = RowContext {
            terms: &t,
            accrual: &accrual,
            row: &current,
            previous: &previous,
            origin: Some(&cycle),
            principal_due_row: false,
        };
        assert_eq!(strategy.due_principal(&ctx).unwrap(), Money::from_decimal(dec!(7884.88)));
        assert_eq!(strategy.due_interest(&ctx).unwrap(), Money::from_decimal(dec!(1000.00)));

        let stub = origin(None, vec![(Money::from_major(100_000), 11)]);
        let ctx = RowContext {
            origin: Some(&stub),
            ..ctx
        };
        assert_eq!(strategy.due_principal(&ctx).unwrap(), Money::ZERO);
        // 100000 × 0.12 / 360 × 11 = 366.666...
        assert_eq!(strategy.due_interest(&ctx).unwrap(), Money::from_decimal(dec!(366.67)));
    }
}
