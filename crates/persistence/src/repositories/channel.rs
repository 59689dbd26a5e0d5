//! Channel repository: profile lookup and rule-snapshot loading.

use domain::models::{ChannelProfile, ChannelSnapshot};
use sqlx::PgPool;

use crate::entities::{ChannelEntity, ChannelFieldMappingEntity, ChannelValidationRuleEntity};

/// Repository for channel-related database operations.
#[derive(Clone)]
pub struct ChannelRepository {
    pool: PgPool,
}

impl ChannelRepository {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a channel by its stable code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<ChannelProfile>, sqlx::Error> {
        let entity = sqlx::query_as::<_, ChannelEntity>(
            r#"
            SELECT id, code, name, is_excel_encrypted, excel_data_start_row,
                   is_active, created_at, updated_at
            FROM channels
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(ChannelEntity::into_profile))
    }

    /// Load a channel's rules as one immutable snapshot.
    ///
    /// Both rule sets are fetched in configured (id) order in a single
    /// round-trip each, so a pipeline run never observes a half-edited rule
    /// set.
    pub async fn load_snapshot(
        &self,
        profile: ChannelProfile,
    ) -> Result<ChannelSnapshot, sqlx::Error> {
        let mappings = sqlx::query_as::<_, ChannelFieldMappingEntity>(
            r#"
            SELECT id, channel_id, field_key, selector_type, selector_value, options
            FROM channel_field_mappings
            WHERE channel_id = $1
            ORDER BY id
            "#,
        )
        .bind(profile.id)
        .fetch_all(&self.pool)
        .await?;

        let validations = sqlx::query_as::<_, ChannelValidationRuleEntity>(
            r#"
            SELECT id, channel_id, cell_ref, expected_label, is_required
            FROM channel_validation_rules
            WHERE channel_id = $1
            ORDER BY id
            "#,
        )
        .bind(profile.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ChannelSnapshot {
            profile,
            field_mappings: mappings
                .into_iter()
                .filter_map(ChannelFieldMappingEntity::into_rule)
                .collect(),
            validation_rules: validations
                .into_iter()
                .map(ChannelValidationRuleEntity::into_rule)
                .collect(),
        })
    }
}
