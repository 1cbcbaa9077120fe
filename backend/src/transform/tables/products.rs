//! `crm_prd_info`: product versions with derived keys and validity periods.

use crate::models::{ProductCurated, ProductRaw};
use crate::transform::normalize::{clean_text, normalize_code, NOT_AVAILABLE, PRODUCT_LINE};
use crate::transform::validate::derive_product_period_end;

/// Length of the category prefix inside a composite product key.
const CATEGORY_LEN: usize = 5;
/// Zero-based offset where the product part of the key starts.
const PRODUCT_OFFSET: usize = 6;

/// Split a composite key such as `AC-HE-HL-U509-B` into `(AC_HE, HL-U509-B)`.
pub fn split_composite_key(key: &str) -> (String, String) {
    let category = key
        .chars()
        .take(CATEGORY_LEN)
        .map(|c| if c == '-' { '_' } else { c })
        .collect();
    let product = key.chars().skip(PRODUCT_OFFSET).collect();
    (category, product)
}

pub fn curate(rows: Vec<ProductRaw>) -> Vec<ProductCurated> {
    let mut curated: Vec<ProductCurated> = rows
        .into_iter()
        .map(|row| {
            let key = row.key.as_deref().map(str::trim).unwrap_or("");
            let (category_id, product_key) = split_composite_key(key);
            ProductCurated {
                id: row.id,
                category_id,
                product_key,
                name: clean_text(row.name.as_deref()),
                cost: row.cost.unwrap_or(0),
                line: normalize_code(row.line.as_deref(), &PRODUCT_LINE, NOT_AVAILABLE),
                start_date: row.start_date,
                end_date: None,
            }
        })
        .collect();

    let periods: Vec<(&str, _)> = curated
        .iter()
        .map(|p| (p.product_key.as_str(), p.start_date))
        .collect();
    let ends = derive_product_period_end(&periods);

    for (product, end) in curated.iter_mut().zip(ends) {
        product.end_date = end;
    }
    curated
}
