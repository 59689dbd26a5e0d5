//! Product-name-mapping entity.

use chrono::{DateTime, Utc};
use domain::models::ProductNameMapping;
use sqlx::FromRow;

/// Database entity for listing-title → product mappings.
///
/// Rows with a NULL `product_id` are auto-registered candidates awaiting
/// manual assignment.
#[derive(Debug, Clone, FromRow)]
pub struct ProductNameMappingEntity {
    pub id: i64,
    pub channel_id: i64,
    pub product_id: Option<i64>,
    pub listing_title: String,
    pub option_title: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductNameMappingEntity {
    pub fn into_domain(self) -> ProductNameMapping {
        ProductNameMapping {
            id: self.id,
            channel_id: self.channel_id,
            product_id: self.product_id,
            listing_title: self.listing_title,
            option_title: self.option_title,
            description: self.description,
        }
    }
}
