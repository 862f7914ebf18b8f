use chrono::{Datelike, Months, NaiveDate};

use crate::error::CeclError;
use crate::CeclResult;

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `date` shifted forward by `months` calendar months.
pub fn add_months(date: NaiveDate, months: u32) -> CeclResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| CeclError::DateError(format!("{date} + {months} months is out of range")))
}

/// `count` consecutive first-of-month dates starting at the month of `start`.
pub fn month_range(start: NaiveDate, count: usize) -> CeclResult<Vec<NaiveDate>> {
    let first = month_start(start);
    (0..count).map(|i| add_months(first, i as u32)).collect()
}

/// Whole months from the month of `from` to the month of `to` (may be negative).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to.year() as i64 - from.year() as i64) * 12 + to.month() as i64 - from.month() as i64
}

/// Default simulation start month.
pub fn default_start_month() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}
