use crate::config::EngineLimits;
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::events::ScheduleEvent;
use crate::schedule::{Period, PeriodLabel, RowKind, ScheduleDraft};
use crate::types::{PaymentEvent, ScheduleStatus};

/// label for a row injected right after a row labelled `previous`
pub fn next_overdue_label(previous: PeriodLabel) -> PeriodLabel {
    match previous {
        PeriodLabel::Opening => PeriodLabel::Sub { cycle: 0, index: 1 },
        PeriodLabel::Cycle(n) => PeriodLabel::Sub { cycle: n, index: 1 },
        PeriodLabel::Range(_, b) => PeriodLabel::Sub { cycle: b, index: 1 },
        PeriodLabel::Sub { cycle, index } => PeriodLabel::Sub {
            cycle,
            index: index + 1,
        },
        PeriodLabel::AfterMaturity(n) => PeriodLabel::AfterMaturity(n + 1),
        PeriodLabel::AfterLastPayment => PeriodLabel::AfterLastPayment,
    }
}

/// where an overdue-interest payment lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// a row already ends on the payment date
    Existing(usize),
    /// insert a new row at this index
    Insert(usize),
}

fn place(periods: &[Period], event: &PaymentEvent) -> Placement {
    let tail = periods.len().saturating_sub(1);
    for (i, row) in periods.iter().enumerate().take(tail).skip(1) {
        if row.end_date == event.date {
            return Placement::Existing(i);
        }
        if row.end_date > event.date {
            return Placement::Insert(i);
        }
    }
    Placement::Insert(tail.max(1))
}

/// place every set-aside overdue-interest payment on the projected schedule.
///
/// A payment dated on an existing row's end overwrites that row's paid overdue interest.
/// Otherwise a zero-length row is inserted at the first row ending after the payment date
/// (ahead of the closing row when none does) and every row reference at or past the insertion
/// point moves down by one. Computed figures of other rows are left as they are.
pub fn inject(draft: ScheduleDraft, limits: &EngineLimits) -> Result<ScheduleDraft> {
    let ScheduleDraft {
        status,
        mut periods,
        overdue,
        mut events,
    } = draft;

    for event in &overdue {
        match place(&periods, event) {
            Placement::Existing(i) => {
                let row = &mut periods[i];
                let replaced = if row.paid_overdue_interest.is_zero() {
                    None
                } else {
                    Some(row.paid_overdue_interest)
                };
                row.paid_overdue_interest = event.amount;
                row.unpaid_overdue_interest = row.overdue_interest - row.paid_overdue_interest;

                tracing::debug!(label = %row.label, date = %event.date, "overdue interest applied to existing row");
                events.emit(ScheduleEvent::OverdueInterestApplied {
                    label: row.label,
                    date: event.date,
                    amount: event.amount,
                    replaced,
                });
            }
            Placement::Insert(index) => {
                if periods.len() >= limits.max_rows {
                    return Err(ScheduleError::RowLimitExceeded { limit: limits.max_rows });
                }
                let previous = periods.get(index - 1).ok_or(ScheduleError::EmptyAccumulator { date: event.date })?;
                let label = next_overdue_label(previous.label);

                let mut row = Period::new(label, RowKind::OverdueInterest, previous.cycle, event.date, event.date);
                row.paid_overdue_interest = event.amount;
                row.unpaid_overdue_interest = -event.amount;

                for p in periods.iter_mut() {
                    p.refs.shift_from(index);
                }
                periods.insert(index, row);

                tracing::debug!(
                    label = %label,
                    index,
                    date = %event.date,
                    amount = %event.amount,
                    "overdue interest row injected"
                );
                events.emit(ScheduleEvent::OverdueRowInjected {
                    label,
                    index,
                    date: event.date,
                    amount: event.amount,
                });
            }
        }
    }

    Ok(ScheduleDraft {
        status,
        periods,
        overdue: Vec::new(),
        events,
    })
}

/// rename the rows past the last contractual cycle of a matured loan
/// to `after-maturity-1`, `after-maturity-2`, ... in row order
pub fn relabel_post_maturity(draft: &mut ScheduleDraft) {
    if draft.status != ScheduleStatus::Matured {
        return;
    }
    let Some(last_regular) = draft.periods.iter().rposition(|p| p.kind == RowKind::Regular) else {
        return;
    };

    let mut n = 0;
    for row in draft.periods.iter_mut().skip(last_regular + 1) {
        if matches!(row.kind, RowKind::AfterFinal | RowKind::OverdueInterest) {
            n += 1;
            row.label = PeriodLabel::AfterMaturity(n);
        }
    }
    if n > 0 {
        tracing::debug!(rows = n, "post-maturity rows relabelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoanTerms;
    use crate::decimal::Rate;
    use crate::events::EventStore;
    use crate::schedule::{generator, projector, splicer, PeriodRefs};
    use crate::types::RepaymentMethod;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn terms(as_of: NaiveDate) -> LoanTerms {
        LoanTerms::builder()
            .principal(Money::from_major(100_000))
            .nominal_rate(Rate::from_percentage(12))
            .overdue_rate(Rate::from_percentage(18))
            .term_count(12)
            .start_date(date(2024, 1, 21))
            .maturity_date(date(2025, 1, 21))
            .repayment_method(RepaymentMethod::InterestOnly)
            .as_of(as_of)
            .build()
            .unwrap()
    }

    fn projected(terms: &LoanTerms, events: &[PaymentEvent]) -> ScheduleDraft {
        let draft = generator::generate(terms).unwrap();
        let draft = splicer::splice(terms, draft, events).unwrap();
        projector::project(terms, draft).unwrap()
    }

    #[test]
    fn test_label_increments() {
        assert_eq!(next_overdue_label(PeriodLabel::Cycle(5)).to_string(), "5(1)");
        assert_eq!(next_overdue_label(PeriodLabel::Sub { cycle: 5, index: 2 }).to_string(), "5(3)");
        assert_eq!(next_overdue_label(PeriodLabel::Range(1, 3)).to_string(), "3(1)");
        assert_eq!(next_overdue_label(PeriodLabel::Opening).to_string(), "0(1)");
        assert_eq!(
            next_overdue_label(PeriodLabel::AfterMaturity(2)),
            PeriodLabel::AfterMaturity(3)
        );
    }

    #[test]
    fn test_unaligned_payment_inserts_row_and_shifts_refs() {
        let t = terms(date(2024, 7, 21));
        let draft = projected(&t, &[PaymentEvent::overdue_interest(date(2024, 7, 2), Money::from_major(25))]);
        let before = draft.periods.clone();

        let draft = inject(draft, &EngineLimits::default()).unwrap();
        assert_eq!(draft.periods.len(), before.len() + 1);
        assert!(draft.overdue.is_empty());

        let row = &draft.periods[6];
        assert_eq!(row.kind, RowKind::OverdueInterest);
        assert_eq!(row.label.to_string(), "5(1)");
        assert_eq!((row.start_date, row.end_date), (date(2024, 7, 2), date(2024, 7, 2)));
        assert_eq!(row.paid_overdue_interest, Money::from_major(25));
        assert_eq!(row.unpaid_overdue_interest, Money::from_major(-25));
        assert_eq!(row.refs, PeriodRefs::default());

        // cycle 6 moved down one row and still points at cycle 5
        let cycle6 = &draft.periods[7];
        assert_eq!(cycle6.label, PeriodLabel::Cycle(6));
        assert_eq!(cycle6.refs.previous, Some(5));
        let tail = draft.periods.last().unwrap();
        assert_eq!(tail.refs.previous, Some(7));
        assert_eq!(tail.due_interest, before.last().unwrap().due_interest);
    }

    #[test]
    fn test_same_day_payment_overwrites_injected_row() {
        let t = terms(date(2024, 7, 21));
        let draft = projected(
            &t,
            &[
                PaymentEvent::overdue_interest(date(2024, 7, 2), Money::from_major(25)),
                PaymentEvent::overdue_interest(date(2024, 7, 2), Money::from_major(40)),
            ],
        );
        let draft = inject(draft, &EngineLimits::default()).unwrap();

        let injected: Vec<&Period> = draft
            .periods
            .iter()
            .filter(|p| p.kind == RowKind::OverdueInterest)
            .collect();
        assert_eq!(injected.len(), 1);
        assert_eq!(injected[0].paid_overdue_interest, Money::from_major(40));
    }

    #[test]
    fn test_payment_after_last_row_goes_before_tail() {
        let t = terms(date(2025, 3, 1));
        let draft = projected(&t, &[PaymentEvent::overdue_interest(date(2025, 2, 14), Money::from_major(60))]);
        let mut draft = inject(draft, &EngineLimits::default()).unwrap();

        let n = draft.periods.len();
        assert_eq!(draft.periods[n - 2].kind, RowKind::OverdueInterest);
        assert_eq!(draft.periods[n - 2].label.to_string(), "12(1)");
        assert_eq!(draft.periods[n - 1].kind, RowKind::Tail);

        relabel_post_maturity(&mut draft);
        assert_eq!(draft.periods[n - 2].label.to_string(), "after-maturity-1");
        assert_eq!(draft.periods[n - 1].label, PeriodLabel::AfterLastPayment);
    }

    #[test]
    fn test_relabel_skips_open_schedules() {
        let t = terms(date(2024, 7, 21));
        let mut draft = projected(&t, &[PaymentEvent::overdue_interest(date(2024, 7, 2), Money::from_major(5))]);
        draft = inject(draft, &EngineLimits::default()).unwrap();
        let labels: Vec<PeriodLabel> = draft.periods.iter().map(|p| p.label).collect();

        relabel_post_maturity(&mut draft);
        assert_eq!(draft.periods.iter().map(|p| p.label).collect::<Vec<_>>(), labels);
    }

    #[test]
    fn test_row_limit() {
        let t = terms(date(2024, 7, 21));
        let draft = projected(&t, &[PaymentEvent::overdue_interest(date(2024, 7, 2), Money::from_major(25))]);
        let limits = EngineLimits {
            max_rows: draft.periods.len(),
            ..EngineLimits::default()
        };
        assert!(matches!(
            inject(draft, &limits),
            Err(ScheduleError::RowLimitExceeded { .. })
        ));

        let empty = ScheduleDraft {
            status: ScheduleStatus::Open,
            periods: Vec::new(),
            overdue: Vec::new(),
            events: EventStore::new(),
        };
        assert!(inject(empty, &EngineLimits::default()).unwrap().periods.is_empty());
    }
}
