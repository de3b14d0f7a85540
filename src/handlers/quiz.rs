// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::SubmitQuizRequest,
    services::grading,
    session::SessionContext,
    state::AppState,
};

/// Returns the exam's questions with their four display options.
///
/// Correct labels are never part of this response.
pub async fn get_quiz(
    State(state): State<AppState>,
    session: SessionContext,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions =
        grading::load_questions(state.repo.as_ref(), &state.retry_policy(), &session, exam_id)
            .await?;

    Ok(Json(json!({
        "exam_id": exam_id,
        "questions": grading::quiz_view(&questions),
    })))
}

/// Grades a quiz submission.
///
/// Score is the number of questions whose submitted option text matches the
/// correct option text.
pub async fn submit_quiz(
    State(state): State<AppState>,
    session: SessionContext,
    Path(exam_id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let result = grading::submit(
        state.repo.as_ref(),
        &state.retry_policy(),
        &session,
        exam_id,
        &payload.answers,
    )
    .await?;

    Ok(Json(result))
}
