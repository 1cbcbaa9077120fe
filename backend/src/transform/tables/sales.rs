//! `crm_sales_details`: order lines with decoded dates and reconciled amounts.
//!
//! Sales is reconciled first against `quantity * |price|`, then a missing or
//! negative price is derived back from it. After curation every line with a
//! defined price satisfies `sales == quantity * price`.

use crate::models::{SalesCurated, SalesRaw};
use crate::transform::normalize::clean_text;
use crate::transform::validate::{amounts_match, parse_yyyymmdd_int};

/// `|sales| / quantity`, undefined when either side is missing or quantity is 0.
fn unit_price(sales: Option<f64>, quantity: Option<i64>) -> Option<f64> {
    let (sales, quantity) = sales.zip(quantity)?;
    if quantity == 0 {
        return None;
    }
    Some(sales.abs() / quantity as f64)
}

/// Final sales amount of a line.
///
/// A positive amount equal to `quantity * |price|` is kept; anything else is
/// recomputed as `quantity * |price|`. Without a raw price only a positive
/// amount survives.
pub fn reconcile_sales(sales: Option<f64>, quantity: Option<i64>, price: Option<f64>) -> Option<f64> {
    let expected = quantity.zip(price).map(|(q, p)| q as f64 * p.abs());
    match (sales, expected) {
        (Some(s), Some(e)) if s > 0.0 && amounts_match(s, e) => Some(s),
        (_, Some(e)) => Some(e),
        (Some(s), None) if s > 0.0 => Some(s),
        _ => None,
    }
}

/// Final price of a line, given its already reconciled sales amount.
///
/// A non-negative price is kept. A missing or negative price becomes
/// `|sales| / quantity`, undefined when quantity is 0.
pub fn reconcile_price(sales: Option<f64>, quantity: Option<i64>, price: Option<f64>) -> Option<f64> {
    match price {
        Some(p) if p >= 0.0 => Some(p),
        _ => unit_price(sales, quantity),
    }
}

pub fn curate(rows: Vec<SalesRaw>) -> Vec<SalesCurated> {
    rows.into_iter()
        .map(|row| {
            let sales = reconcile_sales(row.sales, row.quantity, row.price);
            let price = reconcile_price(sales, row.quantity, row.price);
            SalesCurated {
                order_number: clean_text(row.order_number.as_deref()),
                product_key: clean_text(row.product_key.as_deref()),
                customer_id: row.customer_id,
                order_date: parse_yyyymmdd_int(row.order_date),
                ship_date: parse_yyyymmdd_int(row.ship_date),
                due_date: parse_yyyymmdd_int(row.due_date),
                sales,
                quantity: row.quantity,
                price,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(sales: Option<f64>, quantity: Option<i64>, price: Option<f64>) -> SalesRaw {
        SalesRaw {
            order_number: Some(" SO43697 ".to_string()),
            product_key: Some("BK-R93R-62".to_string()),
            customer_id: Some(21768),
            order_date: Some(20101229),
            ship_date: Some(0),
            due_date: Some(2011011),
            sales,
            quantity,
            price,
        }
    }

    fn check_invariant(line: &SalesCurated) {
        if let (Some(s), Some(q), Some(p)) = (line.sales, line.quantity, line.price) {
            assert!(amounts_match(s, q as f64 * p), "{:?}", line);
        }
    }

    #[test]
    fn test_consistent_line_kept() {
        let out = curate(vec![raw(Some(3578.0), Some(1), Some(3578.0))]);
        assert_eq!(out[0].sales, Some(3578.0));
        assert_eq!(out[0].price, Some(3578.0));
    }

    #[test]
    fn test_dates_decoded() {
        let out = curate(vec![raw(Some(10.0), Some(1), Some(10.0))]);
        assert_eq!(out[0].order_date, NaiveDate::from_ymd_opt(2010, 12, 29));
        assert_eq!(out[0].ship_date, None);
        assert_eq!(out[0].due_date, None);
        assert_eq!(out[0].order_number.as_deref(), Some("SO43697"));
    }

    #[test]
    fn test_wrong_sales_recomputed_from_price() {
        let out = curate(vec![raw(Some(50.0), Some(2), Some(40.0))]);
        assert_eq!(out[0].sales, Some(80.0));
        assert_eq!(out[0].price, Some(40.0));
    }

    #[test]
    fn test_missing_price_derived_from_sales() {
        let out = curate(vec![raw(Some(90.0), Some(3), None)]);
        assert_eq!(out[0].price, Some(30.0));
        assert_eq!(out[0].sales, Some(90.0));
    }

    #[test]
    fn test_negative_values() {
        let out = curate(vec![
            raw(Some(-100.0), Some(2), Some(-50.0)),
            raw(None, Some(2), Some(-50.0)),
            raw(Some(-10.0), Some(1), Some(10.0)),
        ]);
        assert_eq!(out[0].price, Some(50.0));
        assert_eq!(out[0].sales, Some(100.0));
        assert_eq!(out[1].price, Some(50.0));
        assert_eq!(out[1].sales, Some(100.0));
        assert_eq!(out[2].sales, Some(10.0));
    }

    #[test]
    fn test_negative_price_recomputes_sales() {
        let out = curate(vec![raw(Some(50.0), Some(2), Some(-40.0))]);
        assert_eq!(out[0].sales, Some(80.0));
        assert_eq!(out[0].price, Some(40.0));
    }

    #[test]
    fn test_negative_price_with_zero_quantity() {
        let out = curate(vec![raw(Some(100.0), Some(0), Some(-5.0))]);
        assert_eq!(out[0].sales, Some(0.0));
        assert_eq!(out[0].price, None);
    }

    #[test]
    fn test_zero_quantity_leaves_price_undefined() {
        let out = curate(vec![raw(Some(100.0), Some(0), None), raw(None, Some(0), None)]);
        assert_eq!(out[0].price, None);
        assert_eq!(out[0].sales, Some(100.0));
        assert_eq!(out[1].price, None);
        assert_eq!(out[1].sales, None);
    }

    #[test]
    fn test_invariant_over_anomaly_grid() {
        let amounts = [None, Some(-20.0), Some(0.0), Some(7.0), Some(20.0)];
        let quantities = [None, Some(0), Some(1), Some(3)];
        let mut rows = Vec::new();
        for sales in amounts {
            for price in amounts {
                for quantity in quantities {
                    rows.push(raw(sales, quantity, price));
                }
            }
        }
        for line in curate(rows) {
            check_invariant(&line);
        }
    }

    #[test]
    fn test_grid_values_follow_recompute_rule() {
        let amounts = [None, Some(-20.0), Some(0.0), Some(7.0), Some(20.0)];
        let quantities = [Some(0), Some(1), Some(3)];
        for sales in amounts {
            for quantity in quantities {
                for price in [Some(-20.0_f64), Some(-7.0)] {
                    let q = quantity.unwrap();
                    let abs_price = price.unwrap().abs();
                    let out = curate(vec![raw(sales, quantity, price)]);

                    let expected_sales = q as f64 * abs_price;
                    assert_eq!(out[0].sales, Some(expected_sales), "{:?} {:?} {:?}", sales, quantity, price);
                    if q == 0 {
                        assert_eq!(out[0].price, None);
                    } else {
                        assert!(amounts_match(out[0].price.unwrap(), abs_price));
                    }
                }
            }
        }
    }
}
