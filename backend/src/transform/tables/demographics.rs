//! `erp_cust_az12`: birthdates and genders keyed like the CRM customer keys.

use chrono::NaiveDateTime;

use crate::models::{DemographicCurated, DemographicRaw};
use crate::transform::normalize::{
    clean_text, future_date_to_null, normalize_code, strip_prefix, GENDER, NOT_AVAILABLE,
};

/// Legacy prefix some ERP customer ids carry.
pub const LEGACY_ID_PREFIX: &str = "NAS";

pub fn curate(rows: Vec<DemographicRaw>, now: NaiveDateTime) -> Vec<DemographicCurated> {
    rows.into_iter()
        .map(|row| DemographicCurated {
            customer_id: clean_text(row.customer_id.as_deref())
                .map(|id| strip_prefix(&id, LEGACY_ID_PREFIX).to_string()),
            birthdate: future_date_to_null(row.birthdate, now),
            gender: normalize_code(row.gender.as_deref(), &GENDER, NOT_AVAILABLE),
        })
        .collect()
}
