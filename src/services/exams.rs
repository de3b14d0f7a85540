// src/services/exams.rs

use std::sync::atomic::{AtomicU32, Ordering};

use crate::{
    clients::{
        openai::QuestionGenerator,
        storage::{DocumentStore, StorageError},
    },
    config::GenerationSettings,
    error::WorkflowError,
    models::exam::{Exam, ExamSummary, NewExam, SynthesisReport, UploadResponse},
    repository::ExamRepository,
    services::{
        extraction::extract_text, ingestion::IngestedDocument, retry::RetryPolicy,
        synthesis::synthesize,
    },
    session::SessionContext,
};

/// Collaborators shared by the exam workflows.
pub struct Workflow<'a> {
    pub repo: &'a dyn ExamRepository,
    pub store: &'a DocumentStore,
    pub generator: &'a dyn QuestionGenerator,
    pub settings: &'a GenerationSettings,
    pub policy: RetryPolicy,
}

/// The exam with `exam_id` if the session's user owns it.
///
/// Exams of other users are reported as missing.
pub async fn find_owned_exam(
    repo: &dyn ExamRepository,
    policy: &RetryPolicy,
    session: &SessionContext,
    exam_id: i64,
) -> Result<Exam, WorkflowError> {
    policy
        .run("exams.get", || repo.get_exam(exam_id))
        .await?
        .filter(|exam| exam.user_id == session.user_id)
        .ok_or(WorkflowError::ExamNotFound(exam_id))
}

/// The session user's exams, newest first, with their question counts.
pub async fn list_exams(
    repo: &dyn ExamRepository,
    policy: &RetryPolicy,
    session: &SessionContext,
) -> Result<Vec<ExamSummary>, WorkflowError> {
    let exams = policy
        .run("exams.list", || repo.list_exams(session.user_id))
        .await?;

    let mut summaries = Vec::with_capacity(exams.len());
    for exam in exams {
        let question_count = policy
            .run("questions.count", || repo.count_questions(exam.id))
            .await?;
        summaries.push(ExamSummary {
            exam,
            question_count,
        });
    }
    Ok(summaries)
}

/// Stores an ingested document, records the exam, then extracts and
/// synthesizes its questions.
///
/// The exam row is committed before extraction. When a later step fails the
/// exam stays behind with zero questions and can be regenerated.
#[tracing::instrument(skip(flow, document), fields(user_id = session.user_id, key = %document.key))]
pub async fn create_exam(
    flow: &Workflow<'_>,
    session: &SessionContext,
    document: IngestedDocument,
) -> Result<UploadResponse, WorkflowError> {
    let policy = &flow.policy;

    if policy
        .run("storage.exists", || flow.store.exists(&document.key))
        .await?
    {
        return Err(StorageError::Conflict(document.key).into());
    }
    // The key carries a random nonce, so a conflict on a repeated attempt is
    // the write of an earlier attempt that timed out after landing.
    let put_attempts = &AtomicU32::new(0);
    let (store, key, bytes) = (flow.store, &document.key, &document.bytes);
    policy
        .run("storage.put", move || async move {
            let repeated = put_attempts.fetch_add(1, Ordering::Relaxed) > 0;
            match store.put(key, bytes.clone()).await {
                Err(StorageError::Conflict(_)) if repeated => Ok(()),
                other => other,
            }
        })
        .await?;
    tracing::info!(size = document.bytes.len(), "Document stored");

    let new_exam = NewExam {
        user_id: session.user_id,
        document_key: document.key.clone(),
        document_url: flow.store.public_url(&document.key)?,
        original_name: document.original_name.clone(),
    };
    let exam = match policy
        .once()
        .run("exams.insert", || flow.repo.insert_exam(&new_exam))
        .await
    {
        Ok(exam) => exam,
        Err(e) => {
            // Nothing references the document yet.
            if let Err(cleanup) = flow.store.delete(&document.key).await {
                tracing::warn!(error = %cleanup, "Failed to remove orphaned document");
            }
            return Err(e);
        }
    };
    tracing::info!(exam_id = exam.id, "Exam created");

    let text = extract_text(document.bytes, policy.call_timeout).await?;
    let synthesis = synthesize(
        flow.repo,
        flow.generator,
        flow.settings,
        policy,
        exam.id,
        &text,
    )
    .await?;

    Ok(UploadResponse { exam, synthesis })
}

/// Re-runs extraction and synthesis from the stored document of an exam
/// that has no questions.
#[tracing::instrument(skip(flow), fields(user_id = session.user_id))]
pub async fn regenerate_questions(
    flow: &Workflow<'_>,
    session: &SessionContext,
    exam_id: i64,
) -> Result<SynthesisReport, WorkflowError> {
    let policy = &flow.policy;
    let exam = find_owned_exam(flow.repo, policy, session, exam_id).await?;

    let existing = policy
        .run("questions.count", || flow.repo.count_questions(exam.id))
        .await?;
    if existing > 0 {
        return Err(WorkflowError::QuestionsExist(exam.id));
    }

    let bytes = policy
        .run("storage.get", || flow.store.get(&exam.document_key))
        .await?;
    let text = extract_text(bytes, policy.call_timeout).await?;
    synthesize(
        flow.repo,
        flow.generator,
        flow.settings,
        policy,
        exam.id,
        &text,
    )
    .await
}
