//! Error taxonomy for the ingestion pipeline.
//!
//! Stage-level errors are fatal and abort the upload before any row is
//! processed; row-level problems are accumulated as [`RowFailure`] values by
//! the reconciliation planner and never abort a batch.

use thiserror::Error;

use crate::models::channel::LabelMismatch;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The workbook could not be read at all. No partial grid is returned.
    #[error("failed to decode workbook: {0}")]
    Decode(String),

    /// One or more header cells did not carry the expected label.
    #[error("sheet label validation failed ({} mismatch(es))", .0.len())]
    SchemaValidation(Vec<LabelMismatch>),

    /// The external decrypt tool failed, timed out, or produced bad output.
    #[error("decrypt failed: {0}")]
    Decrypt(String),

    /// Database or transaction failure during commit; everything rolls back.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A single reason a row was excluded from a commit batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIssue {
    /// A required field was empty after mapping and normalization.
    MissingField(&'static str),
    /// The verbatim raw payload / meta / hash triple was absent.
    ///
    /// This is a structural defect in how the record was produced, not a
    /// data-quality problem in the source file.
    MissingRawAudit,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} missing"),
            Self::MissingRawAudit => write!(f, "raw payload/meta/hash missing"),
        }
    }
}
