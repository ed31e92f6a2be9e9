use crate::config::LoanTerms;
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::events::ScheduleEvent;
use crate::interest::{AccrualEngine, AccrualWindow, CompoundingEngine, PenaltyEngine};
use crate::schedule::strategy::{strategy_for, OriginCycle, RowContext};
use crate::schedule::{Period, PeriodLabel, PeriodRefs, RowKind, ScheduleDraft};
use crate::types::{RepaymentMethod, ScheduleStatus};

/// 1-based installment closed by billing cycle `cycle`; the stub cycle has none
fn installment_number(cycle: u32, stub: bool) -> Option<u32> {
    if stub {
        cycle.checked_sub(1).filter(|n| *n > 0)
    } else {
        Some(cycle)
    }
}

/// row on which an interest-only loan's outstanding principal falls due
fn principal_due_index(terms: &LoanTerms, status: ScheduleStatus, periods: &[Period]) -> Option<usize> {
    if terms.repayment_method != RepaymentMethod::InterestOnly || status != ScheduleStatus::Matured {
        return None;
    }
    periods
        .iter()
        .position(|p| p.kind == RowKind::AfterFinal)
        .or_else(|| periods.iter().rposition(|p| p.kind == RowKind::Regular))
}

/// last row of an amortising loan settled as due under the early-repayment count
fn paid_as_due_until(terms: &LoanTerms, periods: &[Period]) -> Option<usize> {
    let k = terms.early_repayment_term_count as usize;
    if !terms.repayment_method.is_amortizing() || k == 0 {
        return None;
    }
    periods
        .iter()
        .enumerate()
        .filter(|(_, p)| p.kind.is_origin())
        .take(k)
        .last()
        .map(|(i, _)| i)
}

fn discarded(recorded: Money, due: Money) -> Option<Money> {
    if recorded.is_zero() || recorded == due {
        None
    } else {
        Some(recorded)
    }
}

/// fill every figure of every row, appending the closing row up to the as-of date.
///
/// Rows are walked top to bottom; each row derives its figures from the row above it and,
/// for origin rows, from the rows since the previous origin row.
pub fn project(terms: &LoanTerms, draft: ScheduleDraft) -> Result<ScheduleDraft> {
    let ScheduleDraft {
        status,
        mut periods,
        overdue,
        mut events,
    } = draft;

    let strategy = strategy_for(terms)?;
    let accrual = AccrualEngine::new(terms.day_count);
    let compounding = CompoundingEngine::new(terms.day_count);
    let penalty = PenaltyEngine::new(terms.day_count, terms.overdue_rate);
    let window_end = terms.maturity_date.min(terms.as_of);
    let stub = terms.has_stub();

    let last = periods.last().ok_or_else(|| ScheduleError::CalculationError {
        message: "nothing to project".to_string(),
    })?;
    let tail = Period::new(
        PeriodLabel::AfterLastPayment,
        RowKind::Tail,
        last.cycle,
        last.end_date,
        terms.as_of.max(last.end_date),
    );
    periods.push(tail);

    let principal_due = principal_due_index(terms, status, &periods);
    let settled_until = paid_as_due_until(terms, &periods);
    let mut last_origin = 0;

    for i in 1..periods.len() {
        let (done, rest) = periods.split_at_mut(i);
        let previous = &done[i - 1];
        let row = &mut rest[0];

        row.opening_principal = previous.opening_principal - previous.due_principal;
        row.due_days = accrual.calculate_days(row.start_date, row.end_date);
        row.refs = PeriodRefs {
            previous: Some(i - 1),
            cycle_start: None,
        };

        let cycle = if row.kind.is_origin() {
            row.refs.cycle_start = Some(last_origin);
            let mut segments: Vec<(Money, i64)> = done[last_origin + 1..]
                .iter()
                .map(|p| (p.opening_principal, p.due_days))
                .collect();
            segments.push((row.opening_principal, row.due_days));
            Some(OriginCycle {
                installment: installment_number(row.cycle, stub),
                cycle_days: accrual.calculate_days(done[last_origin].end_date, row.end_date),
                segments,
            })
        } else {
            None
        };

        let (due_principal, due_interest, basis) = if row.kind == RowKind::Tail {
            let interest = accrual.calculate_simple_interest(row.opening_principal, terms.nominal_rate, row.due_days);
            (row.opening_principal, interest, None)
        } else {
            let ctx = RowContext {
                terms,
                accrual: &accrual,
                row: &*row,
                previous,
                origin: cycle.as_ref(),
                principal_due_row: principal_due == Some(i),
            };
            let due_principal = strategy.due_principal(&ctx)?;
            let due_interest = strategy.due_interest(&ctx)?;
            let basis = strategy.penalty_basis(&ctx, due_principal);
            (due_principal, due_interest, basis)
        };
        row.due_principal = due_principal;
        row.due_interest = due_interest;

        if row.kind == RowKind::Grace {
            row.paid_interest = due_interest;
        }
        if settled_until.is_some_and(|end| i <= end) {
            let discarded_principal = discarded(row.paid_principal, due_principal);
            let discarded_interest = discarded(row.paid_interest, due_interest);
            if discarded_principal.is_some() || discarded_interest.is_some() {
                tracing::warn!(
                    label = %row.label,
                    principal = ?discarded_principal,
                    interest = ?discarded_interest,
                    "recorded payment replaced by the due amount"
                );
                events.emit(ScheduleEvent::PaidAsDueOverride {
                    label: row.label,
                    discarded_principal,
                    discarded_interest,
                });
            }
            row.paid_principal = due_principal;
            row.paid_interest = due_interest;
        }

        row.cumulative_unpaid_principal =
            previous.cumulative_unpaid_principal + row.due_principal - row.paid_principal;
        row.cumulative_unpaid_interest =
            previous.cumulative_unpaid_interest + row.due_interest - row.paid_interest;

        let past_final = matches!(row.kind, RowKind::AfterFinal | RowKind::Tail);
        row.current_unpaid_interest = if past_final {
            previous.cumulative_unpaid_interest
        } else if previous.kind.is_inserted() {
            previous.current_unpaid_interest - previous.paid_interest
        } else {
            previous.due_interest - previous.paid_interest
        };

        let rate = if past_final { terms.overdue_rate } else { terms.nominal_rate };
        let end = if past_final || row.kind.is_inserted() {
            row.end_date
        } else {
            window_end.max(row.start_date)
        };
        let window = AccrualWindow::new(rate, row.start_date, end);

        let compound = compounding.calculate_compound(row.current_unpaid_interest, &window);
        row.compound_interest = compound.interest_amount;
        row.compound_window = compound.window;

        let basis = match row.kind {
            RowKind::Tail => Some(row.cumulative_unpaid_principal),
            _ => basis,
        };
        row.current_unpaid_principal = basis.unwrap_or(Money::ZERO);
        let charge = penalty.calculate_penalty(row.current_unpaid_principal, &window);
        row.penalty_interest = charge.interest_amount;
        row.penalty_window = charge.window;

        row.overdue_interest = row.penalty_interest + row.compound_interest;
        row.unpaid_overdue_interest = row.overdue_interest - row.paid_overdue_interest;

        if row.kind.is_origin() {
            last_origin = i;
        }
    }

    tracing::debug!(
        rows = periods.len(),
        method = %strategy.method(),
        principal_due = ?principal_due,
        "schedule projected"
    );

    Ok(ScheduleDraft {
        status,
        periods,
        overdue,
        events,
    })
}
