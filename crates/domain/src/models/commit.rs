//! Commit outcomes and per-row failure reporting.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Numeric summary of one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    /// Rows extracted from the workbook.
    pub received: usize,
    /// Rows that passed validation and were written.
    pub valid: usize,
    /// Rows excluded with reasons.
    pub invalid: usize,
    /// Rows affected by the upsert (inserts + updates as reported by the
    /// database).
    pub affected: u64,
    /// Change-log entries written.
    pub changes: usize,
    /// Batch identifier stamped on every change-log entry.
    pub upload_id: Uuid,
}

/// One excluded row with human-readable reasons, sufficient to correct the
/// source file and re-upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// 1-based worksheet row (falls back to the batch index when the row
    /// carries no provenance).
    pub index: u32,
    pub order_no: Option<String>,
    pub reasons: Vec<String>,
}

/// Terminal states of a commit. Infrastructure failures surface as
/// [`crate::error::IngestError::Database`] instead (terminal Failed, full
/// rollback).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// At least one row was written.
    Committed {
        stats: CommitStats,
        failures: Vec<RowFailure>,
    },
    /// Every row failed validation; nothing was written.
    RejectedAllInvalid { failures: Vec<RowFailure> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_tagging() {
        let outcome = CommitOutcome::RejectedAllInvalid { failures: vec![] };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["state"], "rejected_all_invalid");
    }
}
