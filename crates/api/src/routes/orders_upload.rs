//! Order upload and commit handlers.
//!
//! `upload` stores the file, runs the extraction pipeline and returns a
//! preview without persisting anything. `commit` re-runs the same pipeline
//! from the stored file (client preview data is never trusted) and
//! reconciles the result into the order store.

use std::collections::BTreeSet;
use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain::models::{ChannelProfile, CommitOutcome, CommitStats, StandardOrderRecord};
use domain::services::reconcile;
use persistence::repositories::{ChannelRepository, OrderRepository, ProductMappingRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::decryptor::ExcelDecryptor;
use crate::services::matcher::ProductMatcher;
use crate::services::pipeline::{ChannelExcelPipeline, PipelineMeta};

/// Response for the preview-only upload operation.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// First N extracted records.
    pub preview: Vec<StandardOrderRecord>,
    /// Total extracted row count.
    pub count: usize,
    /// Stored file path, relative to the upload root. Pass back to commit.
    pub stored: String,
    pub meta: PipelineMeta,
}

/// Request body for commit.
#[derive(Debug, Deserialize, Validate)]
pub struct CommitRequest {
    #[validate(length(min = 1, message = "stored_path must not be empty"))]
    pub stored_path: String,

    #[serde(default)]
    pub password: Option<String>,
}

/// Commit response: terminal outcome plus provenance.
#[derive(Debug, Serialize)]
pub struct CommitResponse {
    #[serde(flatten)]
    pub outcome: CommitOutcome,
    pub meta: PipelineMeta,
}

/// Upload a channel workbook and return an extraction preview.
///
/// POST /api/v1/channels/{channel_code}/orders/upload
pub async fn upload(
    State(state): State<AppState>,
    Path(channel_code): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let channel = load_active_channel(&state, &channel_code).await?;

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_name = String::new();
    let mut password = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(format!("file upload failed: {e}")))?;
                file_bytes = Some(bytes.to_vec());
            }
            Some("password") => {
                password = field.text().await.unwrap_or_default();
            }
            _ => {}
        }
    }

    let file_bytes = file_bytes
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ApiError::Validation("file upload failed".to_string()))?;
    require_password(&channel, &password)?;

    let stored = store_upload(&state, &channel.code, &file_name, &file_bytes).await?;
    let abs_path = FsPath::new(&state.config.upload.root).join(&stored);

    let snapshot = ChannelRepository::new(state.pool.clone())
        .load_snapshot(channel)
        .await?;
    let output = build_pipeline(&state)
        .run(&snapshot, &abs_path, &password)
        .await?;

    let count = output.records.len();
    let preview: Vec<StandardOrderRecord> = output
        .records
        .into_iter()
        .take(state.config.upload.preview_rows)
        .collect();

    Ok(Json(UploadResponse {
        preview,
        count,
        stored,
        meta: output.meta,
    }))
}

/// Commit a previously uploaded workbook into the order store.
///
/// POST /api/v1/channels/{channel_code}/orders/commit
pub async fn commit(
    State(state): State<AppState>,
    Path(channel_code): Path<String>,
    Json(request): Json<CommitRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;

    let channel = load_active_channel(&state, &channel_code).await?;
    let password = request.password.unwrap_or_default();
    require_password(&channel, &password)?;

    let path = resolve_stored_path(&state.config.upload.root, &request.stored_path);
    if !path.is_file() {
        tracing::warn!(stored_path = %request.stored_path, resolved = %path.display(), "commit: upload file not found");
        return Err(ApiError::NotFound("upload file not found".to_string()));
    }

    let channel_id = channel.id;
    let source = format!("excel:{}", channel.code);

    let snapshot = ChannelRepository::new(state.pool.clone())
        .load_snapshot(channel)
        .await?;
    let output = build_pipeline(&state).run(&snapshot, &path, &password).await?;

    let received = output.records.len();
    let (valid, failures) = reconcile::validate_records(output.records);
    let invalid = failures.len();

    tracing::info!(
        channel = %channel_code,
        received,
        valid = valid.len(),
        invalid,
        "commit validation summary"
    );

    if valid.is_empty() {
        let body = CommitResponse {
            outcome: CommitOutcome::RejectedAllInvalid { failures },
            meta: output.meta,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response());
    }

    let upload_id = Uuid::new_v4();

    // unique order numbers in the valid set drive the audit-projection load
    let order_nos: Vec<String> = valid
        .iter()
        .map(|r| r.channel_order_no.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let order_repo = OrderRepository::new(state.pool.clone());
    let existing = order_repo.load_audit_views(channel_id, &order_nos).await?;
    let changes = reconcile::diff_changes(&valid, &existing, upload_id, &source);
    let (with_tracking, without_tracking) = reconcile::partition_by_tracking(&valid);

    let affected = order_repo
        .commit_batch(
            channel_id,
            &with_tracking,
            &without_tracking,
            &changes,
            Utc::now(),
        )
        .await?;

    let stats = CommitStats {
        received,
        valid: valid.len(),
        invalid,
        affected,
        changes: changes.len(),
        upload_id,
    };

    tracing::info!(
        channel = %channel_code,
        upload_id = %upload_id,
        affected,
        changes = stats.changes,
        "commit completed"
    );

    let body = CommitResponse {
        outcome: CommitOutcome::Committed { stats, failures },
        meta: output.meta,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

async fn load_active_channel(
    state: &AppState,
    channel_code: &str,
) -> Result<ChannelProfile, ApiError> {
    let channel = ChannelRepository::new(state.pool.clone())
        .find_by_code(channel_code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("unknown channel: {channel_code}")))?;

    if !channel.is_active {
        return Err(ApiError::Validation(format!(
            "channel {channel_code} is not active"
        )));
    }
    Ok(channel)
}

fn require_password(channel: &ChannelProfile, password: &str) -> Result<(), ApiError> {
    if channel.is_excel_encrypted && password.trim().is_empty() {
        return Err(ApiError::Validation(
            "encrypted channel uploads require a password".to_string(),
        ));
    }
    Ok(())
}

fn build_pipeline(state: &AppState) -> ChannelExcelPipeline {
    ChannelExcelPipeline::new(
        ExcelDecryptor::new(state.config.decrypt.clone()),
        ProductMatcher::new(ProductMappingRepository::new(state.pool.clone())),
    )
}

/// Store uploaded bytes under `{root}/{channel_code}/{stamp}_{uuid}.{ext}`
/// and return the root-relative path.
async fn store_upload(
    state: &AppState,
    channel_code: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String, ApiError> {
    let ext = FsPath::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("xlsx");

    let file_name = format!(
        "{}_{}.{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        Uuid::new_v4(),
        ext
    );
    let relative = format!("{channel_code}/{file_name}");

    let abs = FsPath::new(&state.config.upload.root).join(&relative);
    if let Some(parent) = abs.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Internal(format!("failed to create upload dir: {e}")))?;
    }
    tokio::fs::write(&abs, bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to store upload: {e}")))?;

    Ok(relative)
}

/// Absolute stored paths are used as-is; relative ones resolve under the
/// upload root.
fn resolve_stored_path(root: &str, stored_path: &str) -> PathBuf {
    let p = FsPath::new(stored_path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        FsPath::new(root).join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_stored_path_relative() {
        let path = resolve_stored_path("storage/uploads", "smartstore/a.xlsx");
        assert_eq!(path, PathBuf::from("storage/uploads/smartstore/a.xlsx"));
    }

    #[test]
    fn test_resolve_stored_path_absolute() {
        let path = resolve_stored_path("storage/uploads", "/tmp/a.xlsx");
        assert_eq!(path, PathBuf::from("/tmp/a.xlsx"));
    }

    #[test]
    fn test_commit_request_validation() {
        let req = CommitRequest {
            stored_path: String::new(),
            password: None,
        };
        assert!(req.validate().is_err());

        let req = CommitRequest {
            stored_path: "smartstore/a.xlsx".into(),
            password: Some("pw".into()),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_commit_response_serialization_shape() {
        let body = CommitResponse {
            outcome: CommitOutcome::RejectedAllInvalid { failures: vec![] },
            meta: PipelineMeta {
                sheet: "Sheet1".into(),
                start_row: 2,
                channel_code: "smartstore".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["state"], "rejected_all_invalid");
        assert_eq!(json["meta"]["channel_code"], "smartstore");
    }
}
