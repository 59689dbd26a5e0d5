//! Database entity definitions (row mappings).

pub mod channel;
pub mod order;
pub mod product_name_mapping;

pub use channel::{ChannelEntity, ChannelFieldMappingEntity, ChannelValidationRuleEntity};
pub use order::OrderAuditEntity;
pub use product_name_mapping::ProductNameMappingEntity;
