//! Data quality audit of curated tables.
//!
//! Read-only checks over a curated snapshot. Findings are reported, never
//! enforced: a run with findings still completes.
//!
//! | Table | Checks |
//! |-------|--------|
//! | `crm_cust_info` | duplicate ids, untrimmed text, label sets |
//! | `crm_prd_info` | duplicate/missing ids, negative cost, end before start, label set |
//! | `crm_sales_details` | order after ship/due date, amounts, reconciliation |
//! | `erp_cust_az12` | missing ids, birthdates before 1924, label set |
//! | `erp_loc_a101` | missing ids, hyphenated ids, untrimmed country |
//! | `erp_px_cat_g1v2` | duplicate/missing ids, untrimmed text |

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;

use crate::models::{
    CategoryCurated, CuratedTable, CustomerCurated, DemographicCurated, LocationCurated,
    ProductCurated, SalesCurated, Table,
};
use crate::transform::normalize::{CodeMapping, GENDER, MARITAL_STATUS, PRODUCT_LINE};
use crate::transform::validate::amounts_match;

/// One anomaly found in a curated table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityIssue {
    pub table: Table,
    /// Short identifier of the failed check.
    pub check: &'static str,
    /// Zero-based row index in the curated table.
    pub row: usize,
    pub message: String,
}

/// Findings collector for one table.
struct Audit {
    table: Table,
    issues: Vec<QualityIssue>,
}

impl Audit {
    fn new(table: Table) -> Self {
        Self {
            table,
            issues: Vec::new(),
        }
    }

    fn flag(&mut self, check: &'static str, row: usize, message: impl Into<String>) {
        self.issues.push(QualityIssue {
            table: self.table,
            check,
            row,
            message: message.into(),
        });
    }

    fn untrimmed(&mut self, row: usize, field: &str, value: Option<&str>) {
        if let Some(v) = value {
            if v.trim() != v {
                self.flag("untrimmed", row, format!("{} has surrounding whitespace: '{}'", field, v));
            }
        }
    }

    fn label(&mut self, row: usize, mapping: &CodeMapping, value: &str) {
        if !mapping.is_canonical(value) {
            self.flag("label", row, format!("{} '{}' is not a known label", mapping.name(), value));
        }
    }

    fn missing<T>(&mut self, row: usize, field: &str, value: &Option<T>) {
        if value.is_none() {
            self.flag("missing_key", row, format!("{} is missing", field));
        }
    }

    fn unique<K: Hash + Eq + std::fmt::Display>(&mut self, seen: &mut HashSet<K>, row: usize, field: &str, key: K) {
        let shown = key.to_string();
        if !seen.insert(key) {
            self.flag("duplicate_key", row, format!("{} {} appears more than once", field, shown));
        }
    }
}

/// Earliest plausible birthdate.
fn min_birthdate() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1924, 1, 1)
}

/// Run every check that applies to `records`.
pub fn audit(records: &CuratedTable) -> Vec<QualityIssue> {
    let mut audit = Audit::new(records.table());
    match records {
        CuratedTable::Customers(rows) => audit_customers(&mut audit, rows),
        CuratedTable::Products(rows) => audit_products(&mut audit, rows),
        CuratedTable::Sales(rows) => audit_sales(&mut audit, rows),
        CuratedTable::Demographics(rows) => audit_demographics(&mut audit, rows),
        CuratedTable::Locations(rows) => audit_locations(&mut audit, rows),
        CuratedTable::Categories(rows) => audit_categories(&mut audit, rows),
    }
    audit.issues
}

fn audit_customers(audit: &mut Audit, rows: &[CustomerCurated]) {
    let mut seen = HashSet::new();
    for (i, c) in rows.iter().enumerate() {
        audit.unique(&mut seen, i, "cst_id", c.id);
        audit.untrimmed(i, "cst_firstname", c.first_name.as_deref());
        audit.untrimmed(i, "cst_lastname", c.last_name.as_deref());
        audit.label(i, &MARITAL_STATUS, &c.marital_status);
        audit.label(i, &GENDER, &c.gender);
    }
}

fn audit_products(audit: &mut Audit, rows: &[ProductCurated]) {
    let mut seen = HashSet::new();
    for (i, p) in rows.iter().enumerate() {
        audit.missing(i, "prd_id", &p.id);
        if let Some(id) = p.id {
            audit.unique(&mut seen, i, "prd_id", id);
        }
        audit.untrimmed(i, "prd_nm", p.name.as_deref());
        if p.cost < 0 {
            audit.flag("negative_cost", i, format!("prd_cost is {}", p.cost));
        }
        if let (Some(start), Some(end)) = (p.start_date, p.end_date) {
            if end < start {
                audit.flag("period_order", i, format!("prd_end_dt {} before prd_start_dt {}", end, start));
            }
        }
        audit.label(i, &PRODUCT_LINE, &p.line);
    }
}

fn audit_sales(audit: &mut Audit, rows: &[SalesCurated]) {
    for (i, s) in rows.iter().enumerate() {
        if let Some(order) = s.order_date {
            if s.ship_date.is_some_and(|ship| order > ship) {
                audit.flag("date_order", i, "sls_order_dt after sls_ship_dt");
            }
            if s.due_date.is_some_and(|due| order > due) {
                audit.flag("date_order", i, "sls_order_dt after sls_due_dt");
            }
        }

        match (s.sales, s.quantity, s.price) {
            (Some(sales), Some(quantity), Some(price)) => {
                if !amounts_match(sales, quantity as f64 * price) {
                    audit.flag(
                        "reconciliation",
                        i,
                        format!("sls_sales {} != {} * {}", sales, quantity, price),
                    );
                }
                if sales <= 0.0 || quantity <= 0 || price <= 0.0 {
                    audit.flag("amount", i, "sales, quantity and price should be positive");
                }
            }
            _ => audit.flag("amount", i, "sales, quantity or price is missing"),
        }
    }
}

fn audit_demographics(audit: &mut Audit, rows: &[DemographicCurated]) {
    let floor = min_birthdate();
    for (i, d) in rows.iter().enumerate() {
        audit.missing(i, "cid", &d.customer_id);
        if let Some(bdate) = d.birthdate {
            if floor.is_some_and(|floor| bdate < floor) {
                audit.flag("birthdate_range", i, format!("bdate {} is implausibly old", bdate));
            }
        }
        audit.label(i, &GENDER, &d.gender);
    }
}

fn audit_locations(audit: &mut Audit, rows: &[LocationCurated]) {
    for (i, l) in rows.iter().enumerate() {
        audit.missing(i, "cid", &l.customer_id);
        if l.customer_id.as_deref().is_some_and(|id| id.contains('-')) {
            audit.flag("id_format", i, "cid still contains hyphens");
        }
        audit.untrimmed(i, "cntry", Some(&l.country));
    }
}

fn audit_categories(audit: &mut Audit, rows: &[CategoryCurated]) {
    let mut seen = HashSet::new();
    for (i, c) in rows.iter().enumerate() {
        audit.missing(i, "id", &c.id);
        if let Some(id) = &c.id {
            audit.unique(&mut seen, i, "id", id.as_str());
        }
        audit.untrimmed(i, "cat", c.category.as_deref());
        audit.untrimmed(i, "subcat", c.subcategory.as_deref());
        audit.untrimmed(i, "maintenance", c.maintenance.as_deref());
    }
}
