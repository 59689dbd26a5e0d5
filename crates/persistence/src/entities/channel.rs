//! Channel and channel-rule entities.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use domain::models::{ChannelProfile, FieldMappingRule, SelectorKind, ValidationRule};
use sqlx::FromRow;

/// Database entity for sales channels.
#[derive(Debug, Clone, FromRow)]
pub struct ChannelEntity {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub is_excel_encrypted: bool,
    pub excel_data_start_row: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChannelEntity {
    pub fn into_profile(self) -> ChannelProfile {
        ChannelProfile {
            id: self.id,
            code: self.code,
            name: self.name,
            is_excel_encrypted: self.is_excel_encrypted,
            excel_data_start_row: self.excel_data_start_row.max(1) as u32,
            is_active: self.is_active,
        }
    }
}

/// Database entity for field-mapping rules.
#[derive(Debug, Clone, FromRow)]
pub struct ChannelFieldMappingEntity {
    pub id: i64,
    pub channel_id: i64,
    pub field_key: String,
    pub selector_type: String,
    pub selector_value: String,
    pub options: Option<serde_json::Value>,
}

impl ChannelFieldMappingEntity {
    /// Convert to the domain rule; rows with an unknown selector type are
    /// dropped (with a warning) rather than failing the whole snapshot.
    pub fn into_rule(self) -> Option<FieldMappingRule> {
        match SelectorKind::from_str(&self.selector_type) {
            Ok(kind) => Some(FieldMappingRule {
                id: self.id,
                channel_id: self.channel_id,
                field_key: self.field_key,
                selector_kind: kind,
                selector_value: self.selector_value,
                options: self.options,
            }),
            Err(err) => {
                tracing::warn!(rule_id = self.id, "skipping field mapping: {err}");
                None
            }
        }
    }
}

/// Database entity for header-label validation rules.
#[derive(Debug, Clone, FromRow)]
pub struct ChannelValidationRuleEntity {
    pub id: i64,
    pub channel_id: i64,
    pub cell_ref: String,
    pub expected_label: String,
    pub is_required: bool,
}

impl ChannelValidationRuleEntity {
    pub fn into_rule(self) -> ValidationRule {
        ValidationRule {
            id: self.id,
            channel_id: self.channel_id,
            cell_ref: self.cell_ref,
            expected_label: self.expected_label,
            is_required: self.is_required,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_profile_clamps_start_row() {
        let entity = ChannelEntity {
            id: 1,
            code: "smartstore".into(),
            name: "스마트스토어".into(),
            is_excel_encrypted: true,
            excel_data_start_row: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(entity.into_profile().excel_data_start_row, 1);
    }

    #[test]
    fn test_unknown_selector_type_is_dropped() {
        let entity = ChannelFieldMappingEntity {
            id: 5,
            channel_id: 1,
            field_key: "channel_order_no".into(),
            selector_type: "xpath".into(),
            selector_value: "//a".into(),
            options: None,
        };
        assert!(entity.into_rule().is_none());
    }

    #[test]
    fn test_known_selector_type_converts() {
        let entity = ChannelFieldMappingEntity {
            id: 5,
            channel_id: 1,
            field_key: "channel_order_no".into(),
            selector_type: "col_ref".into(),
            selector_value: "A".into(),
            options: None,
        };
        let rule = entity.into_rule().unwrap();
        assert_eq!(rule.selector_kind, SelectorKind::ColRef);
    }
}
