//! `erp_px_cat_g1v2`: product categories.

use crate::models::{CategoryCurated, CategoryRaw};
use crate::transform::normalize::clean_text;

/// Known stale category id and its replacement.
const STALE_ID: (&str, &str) = ("CO_PD", "CO_PE");

/// Rewrite the one known stale category id; every other id is returned as is.
///
/// Expects an already trimmed id.
pub fn correct_category_id(id: Option<String>) -> Option<String> {
    match id {
        Some(id) if id == STALE_ID.0 => Some(STALE_ID.1.to_string()),
        other => other,
    }
}

pub fn curate(rows: Vec<CategoryRaw>) -> Vec<CategoryCurated> {
    rows.into_iter()
        .map(|row| CategoryCurated {
            id: correct_category_id(clean_text(row.id.as_deref())),
            category: clean_text(row.category.as_deref()),
            subcategory: clean_text(row.subcategory.as_deref()),
            maintenance: clean_text(row.maintenance.as_deref()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_id_corrected() {
        assert_eq!(correct_category_id(Some("CO_PD".into())).as_deref(), Some("CO_PE"));
        assert_eq!(correct_category_id(Some("CO_PE".into())).as_deref(), Some("CO_PE"));
        assert_eq!(correct_category_id(Some("AC_HE".into())).as_deref(), Some("AC_HE"));
        assert_eq!(correct_category_id(Some(" CO_PD".into())).as_deref(), Some(" CO_PD"));
        assert_eq!(correct_category_id(None), None);
    }

    #[test]
    fn test_padded_stale_id_corrected() {
        let out = curate(vec![
            CategoryRaw {
                id: Some(" CO_PD ".into()),
                ..Default::default()
            },
            CategoryRaw {
                id: Some("AC_BR  ".into()),
                ..Default::default()
            },
            CategoryRaw {
                id: Some("   ".into()),
                ..Default::default()
            },
        ]);

        assert_eq!(out[0].id.as_deref(), Some("CO_PE"));
        assert_eq!(out[1].id.as_deref(), Some("AC_BR"));
        assert_eq!(out[2].id, None);
    }

    #[test]
    fn test_text_trimmed() {
        let out = curate(vec![CategoryRaw {
            id: Some("CO_PD".into()),
            category: Some("Components ".into()),
            subcategory: Some(" Pedals".into()),
            maintenance: Some("Yes".into()),
        }]);

        assert_eq!(out[0].id.as_deref(), Some("CO_PE"));
        assert_eq!(out[0].category.as_deref(), Some("Components"));
        assert_eq!(out[0].subcategory.as_deref(), Some("Pedals"));
        assert_eq!(out[0].maintenance.as_deref(), Some("Yes"));
    }
}
