//! Domain models.

pub mod change_log;
pub mod channel;
pub mod commit;
pub mod order_record;
pub mod product_mapping;
pub mod raw_row;
pub mod sheet;

pub use change_log::NewChangeLog;
pub use channel::{
    ChannelProfile, ChannelSnapshot, FieldMappingRule, LabelMismatch, SelectorKind,
    ValidationRule,
};
pub use commit::{CommitOutcome, CommitStats, RowFailure};
pub use order_record::{field_keys, RawAudit, StandardOrderRecord};
pub use product_mapping::{MatchResult, ProductNameMapping};
pub use raw_row::{RawRow, RowMeta};
pub use sheet::SheetGrid;
