//! Commit planning: record validation, change diffing and the
//! tracking-number partition.
//!
//! Everything here is pure; the persistence layer executes the plan inside
//! one transaction. Tracking-number protection is an application-layer
//! invariant: rows without a tracking number exclude the column from their
//! upsert's update list, so a re-upload can never erase a recorded number.
//! This is not safe against two fully concurrent upserts on the same key;
//! same-channel uploads racing on overlapping order numbers need external
//! serialization.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::RowIssue;
use crate::models::{field_keys, NewChangeLog, RowFailure, StandardOrderRecord};

/// Projection of a persisted order onto the audited fields.
#[derive(Debug, Clone, Default)]
pub struct ExistingOrderView {
    pub id: i64,
    pub channel_order_no: String,
    pub tracking_no: Option<String>,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,
    pub receiver_addr_full: Option<String>,
    pub shipping_request: Option<String>,
}

/// Split records into commit-ready ones and itemized failures.
///
/// A record missing its raw audit triple is structurally defective and is
/// reported with that single reason; otherwise every missing required field
/// is listed so the uploader can fix the file in one pass.
pub fn validate_records(
    records: Vec<StandardOrderRecord>,
) -> (Vec<StandardOrderRecord>, Vec<RowFailure>) {
    let mut valid = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for (idx, record) in records.into_iter().enumerate() {
        let index = record
            .raw
            .as_ref()
            .map(|raw| raw.meta.row)
            .unwrap_or((idx + 1) as u32);

        if record.raw.is_none() {
            failures.push(RowFailure {
                index,
                order_no: non_empty(&record.channel_order_no),
                reasons: vec![RowIssue::MissingRawAudit.to_string()],
            });
            continue;
        }

        let mut reasons = Vec::new();
        for (value, field) in [
            (&record.channel_order_no, field_keys::CHANNEL_ORDER_NO),
            (&record.receiver_name, field_keys::RECEIVER_NAME),
            (&record.receiver_postcode, field_keys::RECEIVER_POSTCODE),
            (&record.receiver_addr_full, field_keys::RECEIVER_ADDR_FULL),
            (&record.receiver_phone, field_keys::RECEIVER_PHONE),
        ] {
            if value.trim().is_empty() {
                reasons.push(RowIssue::MissingField(field).to_string());
            }
        }

        if reasons.is_empty() {
            valid.push(record);
        } else {
            failures.push(RowFailure {
                index,
                order_no: non_empty(&record.channel_order_no),
                reasons,
            });
        }
    }

    (valid, failures)
}

/// Compute change-log entries for records whose order number already exists.
///
/// An entry is emitted only when the persisted and incoming values differ
/// and the incoming value is non-empty; clearing a field to empty is not
/// logged.
pub fn diff_changes(
    records: &[StandardOrderRecord],
    existing: &HashMap<String, ExistingOrderView>,
    upload_id: Uuid,
    source: &str,
) -> Vec<NewChangeLog> {
    let mut changes = Vec::new();

    for record in records {
        let Some(current) = existing.get(&record.channel_order_no) else {
            continue;
        };

        let pairs: [(&str, Option<&str>, &str); 5] = [
            (
                field_keys::TRACKING_NO,
                current.tracking_no.as_deref(),
                record.tracking_no.as_deref().unwrap_or(""),
            ),
            (
                field_keys::RECEIVER_NAME,
                current.receiver_name.as_deref(),
                &record.receiver_name,
            ),
            (
                field_keys::RECEIVER_PHONE,
                current.receiver_phone.as_deref(),
                &record.receiver_phone,
            ),
            (
                field_keys::RECEIVER_ADDR_FULL,
                current.receiver_addr_full.as_deref(),
                &record.receiver_addr_full,
            ),
            (
                field_keys::SHIPPING_REQUEST,
                current.shipping_request.as_deref(),
                &record.shipping_request,
            ),
        ];

        for (field, old, new) in pairs {
            if new.is_empty() {
                continue;
            }
            let old = old.unwrap_or("");
            if old == new {
                continue;
            }
            changes.push(NewChangeLog {
                order_id: current.id,
                upload_id,
                source: source.to_string(),
                field: field.to_string(),
                old_value: old.to_string(),
                new_value: new.to_string(),
                changed_by: None,
            });
        }
    }

    changes
}

/// Partition records by tracking-number presence. The first half updates
/// `tracking_no`; the second half leaves any persisted value untouched.
pub fn partition_by_tracking(
    records: &[StandardOrderRecord],
) -> (Vec<&StandardOrderRecord>, Vec<&StandardOrderRecord>) {
    records
        .iter()
        .partition(|r| r.tracking_no.as_deref().is_some_and(|t| !t.is_empty()))
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
