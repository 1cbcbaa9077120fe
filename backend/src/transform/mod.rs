//! Transformation module.
//!
//! This module turns raw snapshots into curated tables:
//! - Normalize: Field normalizers (codes, text, identifiers, dates)
//! - Validate: Record validators and derived columns
//! - Tables: The six table transformers
//! - Pipeline: Run orchestration over all tables

pub mod normalize;
pub mod pipeline;
pub mod tables;
pub mod validate;

pub use normalize::{
    clean_text, future_date_to_null, normalize_code, strip_chars, strip_prefix, CodeMapping,
    Fallback, NOT_AVAILABLE,
};
pub use pipeline::*;
pub use validate::{amounts_match, derive_product_period_end, parse_yyyymmdd_int};
