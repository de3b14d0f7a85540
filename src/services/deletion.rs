// src/services/deletion.rs

use crate::{
    clients::storage::DocumentStore,
    error::WorkflowError,
    models::exam::{DeletionReport, StepOutcome},
    repository::ExamRepository,
    services::{exams::find_owned_exam, retry::RetryPolicy},
    session::SessionContext,
};

/// Deletes an owned exam: stored document, then questions, then the exam row.
///
/// Document removal is best effort; its failure is reported and the database
/// steps still run. A failed question delete stops before the exam row so
/// no question is left without its exam.
#[tracing::instrument(skip(repo, store, policy), fields(user_id = session.user_id))]
pub async fn delete_exam(
    repo: &dyn ExamRepository,
    store: &DocumentStore,
    policy: &RetryPolicy,
    session: &SessionContext,
    exam_id: i64,
) -> Result<DeletionReport, WorkflowError> {
    let exam = find_owned_exam(repo, policy, session, exam_id).await?;

    let document = match policy
        .run("storage.delete", || store.delete(&exam.document_key))
        .await
    {
        Ok(()) => StepOutcome::Done { affected: 1 },
        Err(e) => {
            tracing::warn!(key = %exam.document_key, error = %e, "Stored document could not be removed");
            StepOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    let questions = match policy
        .run("questions.delete", || repo.delete_questions(exam.id))
        .await
    {
        Ok(count) => StepOutcome::Done { affected: count },
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete questions");
            StepOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    let exam_step = if questions.is_done() {
        match policy
            .run("exams.delete", || repo.delete_exam(exam.id))
            .await
        {
            Ok(count) => StepOutcome::Done { affected: count },
            Err(e) => {
                tracing::error!(error = %e, "Failed to delete exam record");
                StepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    } else {
        StepOutcome::Failed {
            error: "skipped: questions were not deleted".to_string(),
        }
    };

    tracing::info!(
        document_removed = document.is_done(),
        exam_removed = exam_step.is_done(),
        "Exam deletion finished"
    );

    Ok(DeletionReport {
        exam_id,
        document,
        questions,
        exam: exam_step,
    })
}
