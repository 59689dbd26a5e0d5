//! Product-name-mapping repository: exact/substring lookup and idempotent
//! candidate registration.
//!
//! Lookups compare normalized titles (the caller normalizes; the SQL side
//! applies `LOWER(TRIM(...))` so legacy rows with stray whitespace still
//! match). Candidate rows carry a NULL `product_id` and are deduplicated by
//! a partial unique index, so re-encountering the same unresolved titles
//! across uploads never creates a second row.

use domain::models::product_mapping::CANDIDATE_DESCRIPTION;
use domain::models::ProductNameMapping;
use sqlx::PgPool;

use crate::entities::ProductNameMappingEntity;

/// Repository for product-name-mapping database operations.
#[derive(Clone)]
pub struct ProductMappingRepository {
    pool: PgPool,
}

impl ProductMappingRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Exact match on listing + option titles. Candidate rows (NULL
    /// `product_id`) never resolve.
    pub async fn find_exact_with_option(
        &self,
        channel_id: i64,
        listing_title: &str,
        option_title: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT product_id
            FROM product_name_mappings
            WHERE channel_id = $1
              AND product_id IS NOT NULL
              AND LOWER(TRIM(listing_title)) = $2
              AND LOWER(TRIM(COALESCE(option_title, ''))) = $3
            LIMIT 1
            "#,
        )
        .bind(channel_id)
        .bind(listing_title)
        .bind(option_title)
        .fetch_optional(&self.pool)
        .await
    }

    /// Exact match on the listing title alone; only rows whose stored option
    /// title is NULL or empty qualify.
    pub async fn find_exact_without_option(
        &self,
        channel_id: i64,
        listing_title: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT product_id
            FROM product_name_mappings
            WHERE channel_id = $1
              AND product_id IS NOT NULL
              AND LOWER(TRIM(listing_title)) = $2
              AND (option_title IS NULL OR option_title = '')
            LIMIT 1
            "#,
        )
        .bind(channel_id)
        .bind(listing_title)
        .fetch_optional(&self.pool)
        .await
    }

    /// Relaxed substring match; with an option title both columns must
    /// contain their needle.
    pub async fn find_substring(
        &self,
        channel_id: i64,
        listing_title: &str,
        option_title: Option<&str>,
    ) -> Result<Option<i64>, sqlx::Error> {
        let listing_needle = format!("%{listing_title}%");
        match option_title {
            Some(option) => {
                let option_needle = format!("%{option}%");
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT product_id
                    FROM product_name_mappings
                    WHERE channel_id = $1
                      AND product_id IS NOT NULL
                      AND LOWER(listing_title) LIKE $2
                      AND LOWER(COALESCE(option_title, '')) LIKE $3
                    LIMIT 1
                    "#,
                )
                .bind(channel_id)
                .bind(&listing_needle)
                .bind(&option_needle)
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    SELECT product_id
                    FROM product_name_mappings
                    WHERE channel_id = $1
                      AND product_id IS NOT NULL
                      AND LOWER(listing_title) LIKE $2
                    LIMIT 1
                    "#,
                )
                .bind(channel_id)
                .bind(&listing_needle)
                .fetch_optional(&self.pool)
                .await
            }
        }
    }

    /// Register an unresolved (listing, option) pair as a candidate unless an
    /// identical mapping or candidate already exists for the channel.
    ///
    /// Returns the newly inserted candidate, or `None` when a matching row
    /// was already present.
    pub async fn ensure_candidate(
        &self,
        channel_id: i64,
        listing_title: &str,
        option_title: Option<&str>,
    ) -> Result<Option<ProductNameMapping>, sqlx::Error> {
        let exists = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT 1
            FROM product_name_mappings
            WHERE channel_id = $1
              AND LOWER(TRIM(listing_title)) = $2
              AND LOWER(TRIM(COALESCE(option_title, ''))) = $3
            LIMIT 1
            "#,
        )
        .bind(channel_id)
        .bind(listing_title)
        .bind(option_title.unwrap_or(""))
        .fetch_optional(&self.pool)
        .await?;

        if exists.is_some() {
            return Ok(None);
        }

        let inserted = sqlx::query_as::<_, ProductNameMappingEntity>(
            r#"
            INSERT INTO product_name_mappings
                (channel_id, product_id, listing_title, option_title, description)
            VALUES ($1, NULL, $2, $3, $4)
            ON CONFLICT (channel_id, listing_title, COALESCE(option_title, ''))
                WHERE product_id IS NULL
                DO NOTHING
            RETURNING id, channel_id, product_id, listing_title, option_title,
                      description, created_at, updated_at
            "#,
        )
        .bind(channel_id)
        .bind(listing_title)
        .bind(option_title)
        .bind(CANDIDATE_DESCRIPTION)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.map(ProductNameMappingEntity::into_domain))
    }
}
