use std::collections::BTreeMap;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use tracing::error;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Resource not found")]
    NotFound,

    #[error("Edit conflict")]
    EditConflict,

    #[error("Invalid data: {0}")]
    Validation(#[from] garde::Report),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[source] cinedex_dal::Error),
}

impl From<cinedex_dal::Error> for ApiError {
    fn from(value: cinedex_dal::Error) -> Self {
        use cinedex_dal::Error;
        match value {
            Error::RecordNotFound(_) => ApiError::NotFound,
            Error::EditConflict { .. } => ApiError::EditConflict,
            Error::Validation(report) => ApiError::Validation(report),
            Error::InvalidOrderByField(field) => {
                ApiError::InvalidQuery(format!("invalid sort value {field}"))
            }
            e => ApiError::Storage(e),
        }
    }
}

fn field_errors(report: &garde::Report) -> BTreeMap<String, String> {
    let mut errors = BTreeMap::new();
    for (path, error) in report.iter() {
        errors
            .entry(path.to_string())
            .or_insert_with(|| error.message().to_string());
    }
    errors
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                json!("the requested resource could not be found"),
            ),
            ApiError::EditConflict => (
                StatusCode::CONFLICT,
                json!("unable to update the record due to an edit conflict, please try again"),
            ),
            ApiError::Validation(report) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!(field_errors(&report)))
            }
            ApiError::InvalidQuery(msg) => (StatusCode::UNPROCESSABLE_ENTITY, json!(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!(msg)),
            ApiError::Storage(e) => {
                error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!("the server encountered a problem and could not process your request"),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
