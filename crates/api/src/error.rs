use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::error::IngestError;
use domain::models::LabelMismatch;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Workbook decode failed: {0}")]
    Decode(String),

    #[error("Sheet validation failed")]
    SchemaValidation(Vec<LabelMismatch>),

    #[error("Decrypt failed: {0}")]
    Decrypt(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed", msg, None)
            }
            ApiError::Decode(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "decode_failed",
                msg,
                None,
            ),
            ApiError::SchemaValidation(mismatches) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "sheet_validation_failed",
                "The workbook does not match this channel's expected layout".to_string(),
                serde_json::to_value(&mismatches).ok(),
            ),
            ApiError::Decrypt(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "decrypt_failed",
                msg,
                None,
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Decode(msg) => ApiError::Decode(msg),
            IngestError::SchemaValidation(mismatches) => ApiError::SchemaValidation(mismatches),
            IngestError::Decrypt(msg) => ApiError::Decrypt(msg),
            IngestError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        let response = ApiError::NotFound("channel".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_status() {
        let response = ApiError::Validation("bad input".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_schema_validation_status() {
        let response = ApiError::SchemaValidation(vec![LabelMismatch {
            cell: "A1".into(),
            expected: "주문번호".into(),
            actual: "상품명".into(),
        }])
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_internal_status() {
        let response = ApiError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_from_ingest_error_decode() {
        let err: ApiError = IngestError::Decode("broken zip".into()).into();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
