use chrono::{Datelike, NaiveDate};

use crate::errors::{Result, ScheduleError};
use crate::types::FirstCycle;

/// number of days in a calendar month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// date in the given month on `day`, pulled back to the month's last day when short
pub fn clamp_day(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    let day = day.min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| ScheduleError::InvalidDate {
        message: format!("{year}-{month:02}-{day:02} is out of range"),
    })
}

/// (year, month) reached by moving `months` from the date's month
fn shift_months(date: NaiveDate, months: i32) -> (i32, u32) {
    let total_months = date.year() * 12 + date.month() as i32 - 1 + months;
    (total_months.div_euclid(12), (total_months.rem_euclid(12) + 1) as u32)
}

/// whether the date's day-of-month is already past the billing day of its own month
pub fn is_past_billing_day(date: NaiveDate, billing_day: u32) -> bool {
    date.day() > billing_day.min(days_in_month(date.year(), date.month()))
}

/// whether the date falls on the billing day (clamped to month length)
pub fn is_billing_day(date: NaiveDate, billing_day: u32) -> bool {
    date.day() == billing_day.min(days_in_month(date.year(), date.month()))
}

/// step `months` ahead and land on the billing day.
///
/// When the source day is already past the billing day of its month, a plain shift would
/// end the cycle short of a full month, so one extra month is added. The comparison is
/// made on day-of-month, with the billing day clamped to the source month's length.
pub fn add_months_clamp_to_billing_day(date: NaiveDate, months: u32, billing_day: u32) -> Result<NaiveDate> {
    let extra = if is_past_billing_day(date, billing_day) { 1 } else { 0 };
    let (year, month) = shift_months(date, months as i32 + extra);
    clamp_day(year, month, billing_day)
}

/// month offset applied to every cycle boundary of a loan starting on `start`
fn cycle_offset(start: NaiveDate, billing_day: u32, first_cycle: FirstCycle) -> i32 {
    if is_billing_day(start, billing_day) {
        return 0;
    }
    match first_cycle {
        FirstCycle::Extended if is_past_billing_day(start, billing_day) => 1,
        FirstCycle::Stub if !is_past_billing_day(start, billing_day) => -1,
        _ => 0,
    }
}

/// whether the first cycle is a short broken period counted on top of the term
pub fn has_stub(start: NaiveDate, billing_day: u32, first_cycle: FirstCycle) -> bool {
    first_cycle == FirstCycle::Stub && !is_billing_day(start, billing_day)
}

/// end of cycle `n` (1-based), anchored on the start month so short months never drift
pub fn billing_boundary(start: NaiveDate, n: u32, billing_day: u32, first_cycle: FirstCycle) -> Result<NaiveDate> {
    let offset = cycle_offset(start, billing_day, first_cycle);
    let (year, month) = shift_months(start, n as i32 + offset);
    clamp_day(year, month, billing_day)
}

/// plain calendar-day difference `to - from`
pub fn day_count(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
