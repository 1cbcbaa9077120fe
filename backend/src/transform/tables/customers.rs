//! `crm_cust_info`: latest version of each customer.

use std::collections::BTreeMap;

use crate::models::{CustomerCurated, CustomerRaw};
use crate::transform::normalize::{clean_text, normalize_code, GENDER, MARITAL_STATUS, NOT_AVAILABLE};

/// Keep the most recent row per customer id and normalize its fields.
///
/// Rows without an id are dropped. Among rows sharing the latest create
/// date, the first one in input order wins. Output is ordered by id.
pub fn curate(rows: Vec<CustomerRaw>) -> Vec<CustomerCurated> {
    let mut latest: BTreeMap<i64, CustomerRaw> = BTreeMap::new();

    for row in rows {
        let Some(id) = row.id else { continue };
        match latest.get(&id) {
            Some(kept) if kept.create_date >= row.create_date => {}
            _ => {
                latest.insert(id, row);
            }
        }
    }

    latest
        .into_iter()
        .map(|(id, row)| CustomerCurated {
            id,
            key: row.key,
            first_name: clean_text(row.first_name.as_deref()),
            last_name: clean_text(row.last_name.as_deref()),
            marital_status: normalize_code(row.marital_status.as_deref(), &MARITAL_STATUS, NOT_AVAILABLE),
            gender: normalize_code(row.gender.as_deref(), &GENDER, NOT_AVAILABLE),
            create_date: row.create_date,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(id: Option<i64>, first: &str, created: Option<(i32, u32, u32)>) -> CustomerRaw {
        CustomerRaw {
            id,
            key: id.map(|i| format!("AW{:08}", i)),
            first_name: Some(first.to_string()),
            last_name: Some(" Yang ".to_string()),
            marital_status: Some("M ".to_string()),
            gender: Some("f".to_string()),
            create_date: created.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    #[test]
    fn test_latest_version_wins() {
        let rows = vec![
            raw(Some(29449), "old", Some((2025, 1, 1))),
            raw(Some(29449), "newest", Some((2026, 1, 27))),
            raw(Some(29449), "middle", Some((2025, 6, 1))),
            raw(Some(11000), "single", Some((2025, 10, 6))),
        ];
        let curated = curate(rows);

        assert_eq!(curated.len(), 2);
        assert_eq!(curated[0].id, 11000);
        assert_eq!(curated[1].id, 29449);
        assert_eq!(curated[1].first_name.as_deref(), Some("newest"));
    }

    #[test]
    fn test_tie_keeps_first_in_input_order() {
        let rows = vec![
            raw(Some(7), "first", Some((2025, 1, 1))),
            raw(Some(7), "second", Some((2025, 1, 1))),
        ];
        let curated = curate(rows);
        assert_eq!(curated[0].first_name.as_deref(), Some("first"));
    }

    #[test]
    fn test_dated_row_beats_undated() {
        let rows = vec![raw(Some(7), "undated", None), raw(Some(7), "dated", Some((2020, 1, 1)))];
        let curated = curate(rows);
        assert_eq!(curated[0].first_name.as_deref(), Some("dated"));
    }

    #[test]
    fn test_null_ids_dropped_and_fields_normalized() {
        let rows = vec![raw(None, "ghost", Some((2025, 1, 1))), raw(Some(1), "  Jon ", None)];
        let curated = curate(rows);

        assert_eq!(curated.len(), 1);
        let c = &curated[0];
        assert_eq!(c.first_name.as_deref(), Some("Jon"));
        assert_eq!(c.last_name.as_deref(), Some("Yang"));
        assert_eq!(c.marital_status, "Married");
        assert_eq!(c.gender, "Female");
        assert_eq!(c.key.as_deref(), Some("AW00000001"));
    }
}
