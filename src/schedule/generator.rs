use crate::config::LoanTerms;
use crate::errors::Result;
use crate::events::EventStore;
use crate::schedule::{Period, PeriodLabel, RowKind, ScheduleDraft};
use crate::types::ScheduleStatus;

/// build the opening row, the optional grace row and one row per billing cycle.
///
/// Generation stops at the first boundary reaching maturity (when the loan has matured by the
/// as-of date) or reaching the as-of date, clamping that row's end. No generated row ends
/// after `min(maturity, as_of)`.
pub fn generate(terms: &LoanTerms) -> Result<ScheduleDraft> {
    let mut periods = Vec::with_capacity(terms.cycle_count() as usize + 2);

    let mut opening = Period::new(PeriodLabel::Opening, RowKind::Opening, 0, terms.start_date, terms.start_date);
    opening.opening_principal = terms.principal;
    periods.push(opening);

    let limit = terms.maturity_date.min(terms.as_of);
    let grace = terms.grace_cycles();
    let mut last_end = terms.start_date;

    if grace > 0 {
        let end = terms.boundary(grace)?.min(limit);
        let label = if grace == 1 {
            PeriodLabel::Cycle(1)
        } else {
            PeriodLabel::Range(1, grace)
        };
        tracing::debug!(label = %label, start = %last_end, end = %end, "grace row");
        periods.push(Period::new(label, RowKind::Grace, grace, last_end, end));
        last_end = end;
    }

    let cycles = terms.cycle_count();
    let mut status = ScheduleStatus::Matured;

    for n in (grace + 1)..=cycles {
        let boundary = terms.boundary(n)?;

        let (end, stop) = if boundary >= terms.maturity_date && terms.matures_by_as_of() {
            tracing::debug!(cycle = n, boundary = %boundary, "boundary reaches maturity, clamped");
            (terms.maturity_date, Some(ScheduleStatus::Matured))
        } else if boundary >= terms.as_of {
            tracing::debug!(cycle = n, boundary = %boundary, "boundary reaches as-of date, clamped");
            (terms.as_of, Some(ScheduleStatus::Open))
        } else {
            (boundary, None)
        };

        periods.push(Period::new(PeriodLabel::Cycle(n), RowKind::Regular, n, last_end, end));
        last_end = end;

        if let Some(stop) = stop {
            status = stop;
            break;
        }
    }

    tracing::debug!(rows = periods.len(), status = ?status, "periods generated");

    Ok(ScheduleDraft {
        status,
        periods,
        overdue: Vec::new(),
        events: EventStore::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::types::{FirstCycle, RepaymentMethod};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(method: RepaymentMethod, as_of: NaiveDate) -> LoanTerms {
        LoanTerms::builder()
            .principal(Money::from_major(100_000))
            .nominal_rate(Rate::from_percentage(12))
            .overdue_rate(Rate::from_percentage(18))
            .term_count(12)
            .start_date(date(2024, 1, 21))
            .maturity_date(date(2025, 1, 21))
            .repayment_method(method)
            .as_of(as_of)
            .build()
            .unwrap()
    }

    fn assert_contiguous(periods: &[Period]) {
        for pair in periods.windows(2) {
            assert_eq!(pair[1].start_date, pair[0].end_date);
        }
    }

    #[test]
    fn test_open_schedule_clamps_to_as_of() {
        let draft = generate(&terms(RepaymentMethod::InterestOnly, date(2024, 7, 21))).unwrap();

        assert_eq!(draft.status, ScheduleStatus::Open);
        assert_eq!(draft.periods.len(), 7);
        assert_eq!(draft.periods[0].kind, RowKind::Opening);
        assert_eq!(draft.periods[0].opening_principal, Money::from_major(100_000));
        assert_eq!(draft.periods[6].label, PeriodLabel::Cycle(6));
        assert_eq!(draft.periods[6].end_date, date(2024, 7, 21));
        assert_contiguous(&draft.periods);
    }

    #[test]
    fn test_mid_cycle_as_of() {
        let draft = generate(&terms(RepaymentMethod::EqualPrincipal, date(2024, 7, 3))).unwrap();

        assert_eq!(draft.status, ScheduleStatus::Open);
        let last = draft.periods.last().unwrap();
        assert_eq!(last.label, PeriodLabel::Cycle(6));
        assert_eq!(last.start_date, date(2024, 6, 21));
        assert_eq!(last.end_date, date(2024, 7, 3));
    }

    #[test]
    fn test_matured_schedule_runs_all_cycles() {
        let draft = generate(&terms(RepaymentMethod::EqualInstallment, date(2025, 3, 1))).unwrap();

        assert_eq!(draft.status, ScheduleStatus::Matured);
        assert_eq!(draft.periods.len(), 13);
        assert_eq!(draft.periods[12].end_date, date(2025, 1, 21));
        assert_contiguous(&draft.periods);
    }

    #[test]
    fn test_grace_row_collapses_early_cycles() {
        let mut t = terms(RepaymentMethod::InterestOnly, date(2025, 3, 1));
        t.early_repayment_term_count = 3;
        let draft = generate(&t).unwrap();

        assert_eq!(draft.periods[1].kind, RowKind::Grace);
        assert_eq!(draft.periods[1].label, PeriodLabel::Range(1, 3));
        assert_eq!(draft.periods[1].end_date, date(2024, 4, 21));
        assert_eq!(draft.periods[2].label, PeriodLabel::Cycle(4));
        // opening + grace + cycles 4..=12
        assert_eq!(draft.periods.len(), 11);
        assert_contiguous(&draft.periods);
    }

    #[test]
    fn test_early_count_ignored_for_amortizing_generation() {
        let mut t = terms(RepaymentMethod::EqualPrincipal, date(2025, 3, 1));
        t.early_repayment_term_count = 3;
        let draft = generate(&t).unwrap();

        assert!(draft.periods.iter().all(|p| p.kind != RowKind::Grace));
        assert_eq!(draft.periods.len(), 13);
    }

    #[test]
    fn test_stub_first_cycle_adds_a_cycle() {
        let mut t = terms(RepaymentMethod::EqualPrincipal, date(2025, 3, 1));
        t.start_date = date(2024, 1, 10);
        t.maturity_date = date(2025, 1, 21);
        t.first_cycle = FirstCycle::Stub;
        let draft = generate(&t).unwrap();

        assert_eq!(draft.periods[1].end_date, date(2024, 1, 21));
        assert_eq!(draft.periods.len(), 14);
        assert_eq!(draft.periods[13].label, PeriodLabel::Cycle(13));
        assert_eq!(draft.periods[13].end_date, date(2025, 1, 21));
    }

    #[test]
    fn test_extended_first_cycle_clamps_at_maturity() {
        let mut t = terms(RepaymentMethod::InterestOnly, date(2025, 3, 1));
        t.start_date = date(2024, 1, 25);
        t.maturity_date = date(2025, 1, 25);
        let draft = generate(&t).unwrap();

        assert_eq!(draft.periods[1].end_date, date(2024, 3, 21));
        let last = draft.periods.last().unwrap();
        assert_eq!(last.label, PeriodLabel::Cycle(12));
        assert_eq!(last.start_date, date(2025, 1, 21));
        assert_eq!(last.end_date, date(2025, 1, 25));
        assert_eq!(draft.status, ScheduleStatus::Matured);
    }

    #[test]
    fn test_no_row_beyond_maturity_or_as_of() {
        for as_of in [date(2024, 2, 1), date(2024, 9, 30), date(2025, 1, 21), date(2026, 1, 1)] {
            let t = terms(RepaymentMethod::InterestOnly, as_of);
            let limit = t.maturity_date.min(as_of);
            let draft = generate(&t).unwrap();
            assert!(draft.periods.iter().all(|p| p.end_date <= limit));
        }
    }
}
