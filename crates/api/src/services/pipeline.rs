//! Pipeline orchestration: decrypt → grid → header validation → field
//! mapping → normalization → product matching.
//!
//! One sequential run per upload request. The same pipeline backs both the
//! preview (`upload`) and the persisting (`commit`) operations; commit
//! re-runs it from the stored file rather than trusting client-supplied
//! preview data.

use std::path::Path;

use serde::Serialize;

use domain::error::IngestError;
use domain::models::{
    field_keys, ChannelSnapshot, FieldMappingRule, RawAudit, RawRow, StandardOrderRecord,
};
use domain::services::{mapping, normalize, sheet_check};
use shared::crypto::sha256_hex;

use super::decryptor::ExcelDecryptor;
use super::matcher::ProductMatcher;
use super::workbook;

/// Provenance reported alongside pipeline output.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineMeta {
    pub sheet: String,
    pub start_row: u32,
    pub channel_code: String,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub records: Vec<StandardOrderRecord>,
    pub meta: PipelineMeta,
}

#[derive(Clone)]
pub struct ChannelExcelPipeline {
    decryptor: ExcelDecryptor,
    matcher: ProductMatcher,
}

impl ChannelExcelPipeline {
    pub fn new(decryptor: ExcelDecryptor, matcher: ProductMatcher) -> Self {
        Self { decryptor, matcher }
    }

    /// Run the full extraction pipeline over one stored file.
    pub async fn run(
        &self,
        snapshot: &ChannelSnapshot,
        path: &Path,
        password: &str,
    ) -> Result<PipelineOutput, IngestError> {
        let profile = &snapshot.profile;

        // 1) decrypt when the channel ships encrypted exports
        let source_path = if profile.is_excel_encrypted {
            self.decryptor
                .decrypt(path, password, profile.excel_data_start_row)
                .await?
                .xlsx
        } else {
            path.to_path_buf()
        };

        // 2) materialize the first worksheet off the async runtime
        let grid = tokio::task::spawn_blocking(move || workbook::open(&source_path))
            .await
            .map_err(|e| IngestError::Decode(format!("workbook read task failed: {e}")))??;

        // 3) header labels gate everything; no row is processed on mismatch
        sheet_check::validate_sheet(&grid, &snapshot.validation_rules)
            .map_err(IngestError::SchemaValidation)?;

        // 4) per-row mapping, normalization and product matching
        let rows = grid.rows_from(profile.excel_data_start_row, &profile.code);
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut record = build_record(&profile.code, row, &snapshot.field_mappings);
            let matched = self
                .matcher
                .resolve(profile.id, &record.product_title, &record.option_title)
                .await?;
            record.product_id = matched.product_id;
            records.push(record);
        }

        tracing::debug!(
            channel = %profile.code,
            rows = records.len(),
            sheet = %grid.title(),
            "pipeline extraction complete"
        );

        Ok(PipelineOutput {
            records,
            meta: PipelineMeta {
                sheet: grid.title().to_string(),
                start_row: profile.excel_data_start_row,
                channel_code: profile.code.clone(),
            },
        })
    }
}

/// Build one canonical record from a raw row and the channel's rules.
pub fn build_record(
    channel_code: &str,
    row: &RawRow,
    rules: &[FieldMappingRule],
) -> StandardOrderRecord {
    let mapped = mapping::apply_all(row, rules);
    let get = |key: &str| mapped.get(key).cloned().unwrap_or_default();

    // some channels label the shipping request a delivery message
    let shipping_request = {
        let primary = get(field_keys::SHIPPING_REQUEST);
        if primary.is_empty() {
            get(field_keys::DELIVERY_MESSAGE)
        } else {
            primary
        }
    };

    let payload = row.payload_json();
    let sha256 = sha256_hex(&payload);

    let mut record = StandardOrderRecord {
        channel_code: channel_code.to_string(),
        channel_order_no: get(field_keys::CHANNEL_ORDER_NO).trim().to_string(),
        product_id: None,
        product_title: get(field_keys::PRODUCT_TITLE),
        option_title: get(field_keys::OPTION_TITLE),
        quantity: normalize::quantity(&get(field_keys::QUANTITY)),
        tracking_no: normalize::tracking(&get(field_keys::TRACKING_NO)),

        buyer_name: get(field_keys::BUYER_NAME),
        buyer_phone: get(field_keys::BUYER_PHONE),
        buyer_postcode: get(field_keys::BUYER_POSTCODE),
        buyer_addr_full: get(field_keys::BUYER_ADDR_FULL),
        buyer_addr1: get(field_keys::BUYER_ADDR1),
        buyer_addr2: get(field_keys::BUYER_ADDR2),

        receiver_name: get(field_keys::RECEIVER_NAME),
        receiver_phone: get(field_keys::RECEIVER_PHONE),
        receiver_postcode: get(field_keys::RECEIVER_POSTCODE),
        receiver_addr_full: get(field_keys::RECEIVER_ADDR_FULL),
        receiver_addr1: get(field_keys::RECEIVER_ADDR1),
        receiver_addr2: get(field_keys::RECEIVER_ADDR2),

        shipping_request,
        customer_note: get(field_keys::CUSTOMER_NOTE),
        admin_memo: get(field_keys::ADMIN_MEMO),

        ordered_at: normalize::datetime(&get(field_keys::ORDERED_AT)),
        status_src: get(field_keys::STATUS_SRC),

        raw: Some(RawAudit {
            payload,
            meta: row.meta().clone(),
            sha256,
        }),
    };

    normalize::normalize_record(&mut record);
    record
}
