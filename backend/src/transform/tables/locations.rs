//! `erp_loc_a101`: customer countries.

use crate::models::{LocationCurated, LocationRaw};
use crate::transform::normalize::{clean_text, normalize_code, strip_chars, COUNTRY, NOT_AVAILABLE};

pub fn curate(rows: Vec<LocationRaw>) -> Vec<LocationCurated> {
    rows.into_iter()
        .map(|row| LocationCurated {
            customer_id: clean_text(row.customer_id.as_deref()).map(|id| strip_chars(&id, &['-'])),
            country: normalize_code(row.country.as_deref(), &COUNTRY, NOT_AVAILABLE),
        })
        .collect()
}
