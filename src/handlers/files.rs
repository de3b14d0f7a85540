// src/handlers/files.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    clients::storage::StorageError,
    error::{AppError, WorkflowError},
    state::AppState,
};

/// Serves a stored document read-only.
pub async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let policy = state.retry_policy();
    let bytes = policy
        .run("storage.get", || state.store.get(&key))
        .await
        .map_err(|e| match e {
            WorkflowError::Storage(StorageError::NotFound(_) | StorageError::Rejected(_)) => {
                AppError::NotFound("File not found".to_string())
            }
            other => AppError::from(other),
        })?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}
