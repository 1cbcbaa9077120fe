//! Record validators and derivers.
//!
//! Shape checks that silently turn implausible values into `None`, plus the
//! window derivation used for product validity periods.

use chrono::{Days, NaiveDate};

/// Absolute tolerance when comparing reconciled amounts.
pub const AMOUNT_TOLERANCE: f64 = 1e-9;

/// Decode a `YYYYMMDD` integer into a calendar date.
///
/// `0`, negative values, anything that is not exactly eight digits long and
/// impossible calendar dates all yield `None`.
pub fn parse_yyyymmdd_int(value: Option<i64>) -> Option<NaiveDate> {
    let value = value.filter(|v| *v > 0)?;
    if value.to_string().len() != 8 {
        return None;
    }

    let year = (value / 10_000) as i32;
    let month = ((value / 100) % 100) as u32;
    let day = (value % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Compute the end date of every row from the next start date of its key.
///
/// Rows are grouped by key and ordered by start date (missing start dates
/// first, ties keep input order). Each row ends the day before its successor
/// starts; the last row of a key stays open (`None`). The result is aligned
/// with `rows`.
pub fn derive_product_period_end<K: Ord>(rows: &[(K, Option<NaiveDate>)]) -> Vec<Option<NaiveDate>> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| rows[a].0.cmp(&rows[b].0).then(rows[a].1.cmp(&rows[b].1)));

    let mut ends = vec![None; rows.len()];
    for pair in order.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        if rows[current].0 != rows[next].0 {
            continue;
        }
        ends[current] = rows[next]
            .1
            .and_then(|start| start.checked_sub_days(Days::new(1)));
    }
    ends
}

/// Whether two amounts are equal within [`AMOUNT_TOLERANCE`].
pub fn amounts_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= AMOUNT_TOLERANCE
}
