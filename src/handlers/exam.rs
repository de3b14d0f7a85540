// src/handlers/exam.rs

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::IntoResponse,
};
use bytes::Bytes;

use crate::{
    error::{AppError, WorkflowError},
    services::{deletion, exams, ingestion::ingest},
    session::SessionContext,
    state::AppState,
};

/// Name of the multipart field carrying the document.
const FILE_FIELD: &str = "file";

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Uploads a PDF exam and generates its questions.
///
/// Expects a `multipart/form-data` body with a `file` field. Returns 201 with
/// the new exam and a synthesis summary.
pub async fn upload_exam(
    State(state): State<AppState>,
    session: SessionContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((name, bytes));
        break;
    }

    let (name, bytes) = upload.ok_or_else(|| {
        WorkflowError::Validation(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;
    let document = ingest(&name, bytes, state.config.max_upload_bytes)?;

    let response = exams::create_exam(&state.workflow(), &session, document).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Lists the caller's exams, newest first.
pub async fn list_exams(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<impl IntoResponse, AppError> {
    let summaries = exams::list_exams(state.repo.as_ref(), &state.retry_policy(), &session).await?;
    Ok(Json(summaries))
}

pub async fn get_exam(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = exams::find_owned_exam(state.repo.as_ref(), &state.retry_policy(), &session, id)
        .await?;
    Ok(Json(exam))
}

/// Deletes an exam with its document and questions.
///
/// Responds 200 with a per-step report even when a step failed.
pub async fn delete_exam(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let report = deletion::delete_exam(
        state.repo.as_ref(),
        &state.store,
        &state.retry_policy(),
        &session,
        id,
    )
    .await?;
    Ok(Json(report))
}

/// Re-runs question generation for an exam that has none.
pub async fn regenerate_questions(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let report = exams::regenerate_questions(&state.workflow(), &session, id).await?;
    Ok(Json(report))
}
