//! Channel profiles and their administrator-managed extraction rules.

use serde::{Deserialize, Serialize};

/// A sales channel with its own spreadsheet export conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub id: i64,

    /// Short stable code, e.g. `smartstore`. Unique across channels.
    pub code: String,

    /// Human-readable label.
    pub name: String,

    /// Whether exports from this channel arrive password-encrypted.
    pub is_excel_encrypted: bool,

    /// 1-based worksheet row where order data begins (header rows above).
    pub excel_data_start_row: u32,

    pub is_active: bool,
}

/// How a [`FieldMappingRule`] locates its value inside a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    /// Direct column reference, e.g. `B`.
    ColRef,
    /// Header text, resolved to a column at configuration time and treated
    /// as a column reference here.
    HeaderText,
    /// Regular expression over the whole row.
    Regex,
    /// Small template expression (`${A}`, `TRIM`, `DIGITS`, `COALESCE`,
    /// `SPLIT`).
    Expr,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ColRef => "col_ref",
            Self::HeaderText => "header_text",
            Self::Regex => "regex",
            Self::Expr => "expr",
        }
    }
}

impl std::str::FromStr for SelectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "col_ref" => Ok(Self::ColRef),
            "header_text" => Ok(Self::HeaderText),
            "regex" => Ok(Self::Regex),
            "expr" => Ok(Self::Expr),
            other => Err(format!("unknown selector type: {other}")),
        }
    }
}

/// One ordered extraction rule: field key → selector.
///
/// Field keys are unique per channel and match `[a-z0-9_.:-]+`. Rules apply
/// in configured order; a later rule overwrites an earlier one on the same
/// field key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMappingRule {
    pub id: i64,
    pub channel_id: i64,
    pub field_key: String,
    pub selector_kind: SelectorKind,
    pub selector_value: String,

    /// Free-form per-rule options. Currently unused by the engine but kept
    /// round-trippable for administrators.
    pub options: Option<serde_json::Value>,
}

/// One header-label assertion checked before any row is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    pub id: i64,
    pub channel_id: i64,

    /// `A1`-style cell reference.
    pub cell_ref: String,

    /// Literal label expected at that cell.
    pub expected_label: String,

    /// Non-required rules are satisfied when the actual cell is empty.
    pub is_required: bool,
}

/// An itemized header-label mismatch, reported back to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMismatch {
    pub cell: String,
    pub expected: String,
    pub actual: String,
}

/// Immutable per-invocation view of a channel and its rules.
///
/// Loaded once at the start of a pipeline run so that concurrent
/// administrator edits cannot split one upload across two rule sets.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    pub profile: ChannelProfile,
    pub field_mappings: Vec<FieldMappingRule>,
    pub validation_rules: Vec<ValidationRule>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_selector_kind_roundtrip() {
        for kind in [
            SelectorKind::ColRef,
            SelectorKind::HeaderText,
            SelectorKind::Regex,
            SelectorKind::Expr,
        ] {
            assert_eq!(SelectorKind::from_str(kind.as_str()), Ok(kind));
        }
    }

    #[test]
    fn test_selector_kind_unknown() {
        assert!(SelectorKind::from_str("xpath").is_err());
    }
}
