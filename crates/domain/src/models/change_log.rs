//! Append-only audit records of order field changes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A change-log row to be inserted for one field transition.
///
/// Entries are created only when the persisted value and the incoming value
/// differ and the incoming value is non-empty; clearing a field to empty is
/// not logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChangeLog {
    pub order_id: i64,

    /// Batch identifier shared by every entry of one commit.
    pub upload_id: Uuid,

    /// Origin tag, e.g. `excel:smartstore`.
    pub source: String,

    pub field: String,
    pub old_value: String,
    pub new_value: String,

    /// Acting administrator, when the change came from an authenticated
    /// session. Uploads record None.
    pub changed_by: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_log_serializes() {
        let entry = NewChangeLog {
            order_id: 11,
            upload_id: Uuid::nil(),
            source: "excel:coupang".into(),
            field: "tracking_no".into(),
            old_value: "".into(),
            new_value: "9999".into(),
            changed_by: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["field"], "tracking_no");
        assert_eq!(json["changed_by"], serde_json::Value::Null);
    }
}
