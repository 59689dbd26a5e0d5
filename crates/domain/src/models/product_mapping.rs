//! Listing-title → catalog-product mappings.

use serde::{Deserialize, Serialize};

/// Description stamped on auto-registered candidates.
pub const CANDIDATE_DESCRIPTION: &str = "auto-registered (unmatched)";

/// A (channel, listing title, option title) → product mapping.
///
/// `product_id == None` marks an auto-registered candidate awaiting manual
/// assignment; a candidate is never treated as a resolved match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductNameMapping {
    pub id: i64,
    pub channel_id: i64,
    pub product_id: Option<i64>,
    pub listing_title: String,
    pub option_title: Option<String>,
    pub description: Option<String>,
}

/// Outcome of one product resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchResult {
    /// Resolved catalog product, if any.
    pub product_id: Option<i64>,
    /// Whether this resolution inserted a new unmatched candidate.
    pub candidate_registered: bool,
}

impl MatchResult {
    pub fn miss() -> Self {
        Self::default()
    }

    pub fn hit(product_id: i64) -> Self {
        Self {
            product_id: Some(product_id),
            candidate_registered: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_constructors() {
        assert_eq!(MatchResult::miss().product_id, None);
        assert!(!MatchResult::miss().candidate_registered);
        assert_eq!(MatchResult::hit(7).product_id, Some(7));
    }
}
