use crate::config::LoanTerms;
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::events::{EventStore, ScheduleEvent};
use crate::schedule::{Period, PeriodLabel, RowKind, ScheduleDraft};
use crate::types::{PaymentEvent, PaymentKind};

/// cut the generated cycles at payment dates.
///
/// `events` must be sorted ascending by date (ties in input order). Principal and interest
/// payments either merge into a row ending on their date or open a sub-period ending there;
/// overdue-interest payments only merge, and are otherwise set aside for injection.
pub fn splice(terms: &LoanTerms, draft: ScheduleDraft, events: &[PaymentEvent]) -> Result<ScheduleDraft> {
    let ScheduleDraft {
        status,
        periods,
        mut overdue,
        events: mut store,
    } = draft;

    let first_regular = periods
        .iter()
        .position(|p| p.kind == RowKind::Regular)
        .ok_or_else(|| ScheduleError::CalculationError {
            message: "no regular period to splice into".to_string(),
        })?;
    let (head, regular) = periods.split_at(first_regular);

    let mut out: Vec<Period> = Vec::with_capacity(periods.len() + events.len());
    out.extend_from_slice(head);
    let grace = out.iter().position(|p| p.kind == RowKind::Grace);
    let mut cursor = 0;

    for (i, period) in regular.iter().enumerate() {
        let next = regular.get(i + 1);

        if i == 0 {
            // payments falling inside the first cycle, ahead of its end
            let pre_cycle = period.cycle.saturating_sub(1);
            let mut sub_index = 1;

            while let Some(event) = events.get(cursor) {
                if event.date >= period.end_date {
                    break;
                }
                cursor += 1;

                if event.kind == PaymentKind::OverdueInterest {
                    divert(&mut overdue, &mut store, event);
                    continue;
                }

                if let Some(g) = grace {
                    if event.date <= period.start_date || event.kind == PaymentKind::Principal {
                        absorb_into_grace(&mut out[g], &mut store, event);
                        continue;
                    }
                }

                if event.date <= period.start_date {
                    return Err(ScheduleError::PaymentBeforeStart {
                        date: event.date,
                        start: period.start_date,
                    });
                }

                let last = last_row(&mut out, event)?;
                if last.kind.is_inserted() && last.end_date == event.date {
                    merge(last, &mut store, event);
                    continue;
                }

                let label = PeriodLabel::Sub {
                    cycle: pre_cycle,
                    index: sub_index,
                };
                push_sub_period(&mut out, &mut store, label, RowKind::Inserted, pre_cycle, event)?;
                sub_index += 1;
            }
        }

        let start = out.last().map(|p| p.end_date).unwrap_or(period.start_date);
        let mut origin = period.clone();
        origin.start_date = start;
        out.push(origin);

        let mut sub_index = 1;
        while let Some(event) = events.get(cursor) {
            let last = last_row(&mut out, event)?;
            if event.date == last.end_date {
                merge(last, &mut store, event);
                cursor += 1;
                continue;
            }

            let kind = match next {
                Some(next) if event.date >= next.end_date => break,
                Some(_) => RowKind::Inserted,
                None => RowKind::AfterFinal,
            };
            cursor += 1;

            if event.kind == PaymentKind::OverdueInterest {
                divert(&mut overdue, &mut store, event);
                continue;
            }

            let label = PeriodLabel::Sub {
                cycle: period.cycle,
                index: sub_index,
            };
            push_sub_period(&mut out, &mut store, label, kind, period.cycle, event)?;
            sub_index += 1;
        }
    }

    tracing::debug!(
        rows = out.len(),
        diverted = overdue.len(),
        method = %terms.repayment_method,
        "payments spliced"
    );

    Ok(ScheduleDraft {
        status,
        periods: out,
        overdue,
        events: store,
    })
}

fn last_row<'a>(out: &'a mut [Period], event: &PaymentEvent) -> Result<&'a mut Period> {
    out.last_mut()
        .ok_or(ScheduleError::EmptyAccumulator { date: event.date })
}

fn non_zero(amount: Money) -> Option<Money> {
    if amount.is_zero() {
        None
    } else {
        Some(amount)
    }
}

/// write a payment onto an existing row; a second payment of the same kind replaces the first
fn merge(row: &mut Period, store: &mut EventStore, event: &PaymentEvent) {
    let slot = match event.kind {
        PaymentKind::Principal => &mut row.paid_principal,
        PaymentKind::Interest => &mut row.paid_interest,
        PaymentKind::OverdueInterest => &mut row.paid_overdue_interest,
    };
    let replaced = non_zero(*slot);
    *slot = event.amount;

    if let Some(replaced) = replaced {
        tracing::warn!(
            label = %row.label,
            date = %event.date,
            kind = %event.kind,
            replaced = %replaced,
            amount = %event.amount,
            "payment overwrote an earlier payment on the same row"
        );
    } else {
        tracing::debug!(label = %row.label, date = %event.date, kind = %event.kind, "payment merged");
    }

    let record = match event.kind {
        PaymentKind::OverdueInterest => ScheduleEvent::OverdueInterestApplied {
            label: row.label,
            date: event.date,
            amount: event.amount,
            replaced,
        },
        kind => ScheduleEvent::PaymentMerged {
            label: row.label,
            date: event.date,
            kind,
            amount: event.amount,
            replaced,
        },
    };
    store.emit(record);
}

fn divert(overdue: &mut Vec<PaymentEvent>, store: &mut EventStore, event: &PaymentEvent) {
    tracing::debug!(date = %event.date, amount = %event.amount, "overdue interest set aside");
    overdue.push(event.clone());
    store.emit(ScheduleEvent::OverdueInterestDiverted {
        date: event.date,
        amount: event.amount,
    });
}

/// principal accumulates on the grace row; interest is covered by it being paid as due
fn absorb_into_grace(grace: &mut Period, store: &mut EventStore, event: &PaymentEvent) {
    if event.kind == PaymentKind::Principal {
        grace.paid_principal += event.amount;
    }
    tracing::debug!(
        label = %grace.label,
        date = %event.date,
        kind = %event.kind,
        amount = %event.amount,
        "payment absorbed by grace row"
    );
    store.emit(ScheduleEvent::PaymentAbsorbedByGrace {
        date: event.date,
        kind: event.kind,
        amount: event.amount,
    });
}

fn push_sub_period(
    out: &mut Vec<Period>,
    store: &mut EventStore,
    label: PeriodLabel,
    kind: RowKind,
    cycle: u32,
    event: &PaymentEvent,
) -> Result<()> {
    let start = last_row(out, event)?.end_date;
    let mut row = Period::new(label, kind, cycle, start, event.date);
    match event.kind {
        PaymentKind::Principal => row.paid_principal = event.amount,
        PaymentKind::Interest => row.paid_interest = event.amount,
        PaymentKind::OverdueInterest => row.paid_overdue_interest = event.amount,
    }

    tracing::debug!(label = %label, start = %start, end = %event.date, kind = %event.kind, "sub-period inserted");
    store.emit(ScheduleEvent::SubPeriodInserted {
        label,
        start,
        end: event.date,
        kind: event.kind,
        amount: event.amount,
    });
    out.push(row);
    Ok(())
}
