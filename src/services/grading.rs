// src/services/grading.rs

use std::collections::HashMap;

use crate::{
    error::WorkflowError,
    models::{
        question::{PublicQuestion, Question},
        quiz::{GradedQuestion, QuizResult},
    },
    repository::ExamRepository,
    services::{exams::find_owned_exam, retry::RetryPolicy},
    session::SessionContext,
};

/// Questions of an owned exam, in creation order. An exam without
/// questions cannot be taken.
pub async fn load_questions(
    repo: &dyn ExamRepository,
    policy: &RetryPolicy,
    session: &SessionContext,
    exam_id: i64,
) -> Result<Vec<Question>, WorkflowError> {
    let exam = find_owned_exam(repo, policy, session, exam_id).await?;
    let questions = policy
        .run("questions.list", || repo.list_questions(exam.id))
        .await?;

    if questions.is_empty() {
        tracing::warn!(exam_id, "Quiz requested for exam without questions");
        return Err(WorkflowError::NoQuestions(exam_id));
    }
    Ok(questions)
}

/// Quiz view: stems and the four display options, correct labels hidden.
pub fn quiz_view(questions: &[Question]) -> Vec<PublicQuestion> {
    questions.iter().map(PublicQuestion::from).collect()
}

/// Compares each submitted option text with the text the question's correct
/// label resolves to.
///
/// Unanswered questions count as an empty selection. Both sides are trimmed
/// and compared case-sensitively. A label that resolves to no option never
/// matches. Answers for ids outside `questions` are ignored.
pub fn grade(exam_id: i64, questions: &[Question], answers: &HashMap<i64, String>) -> QuizResult {
    let results: Vec<GradedQuestion> = questions
        .iter()
        .map(|question| {
            let selected = answers
                .get(&question.id)
                .map(|s| s.trim())
                .unwrap_or_default();
            let correct = question.correct_answer().map(str::trim);
            GradedQuestion {
                question_id: question.id,
                stem: question.stem.clone(),
                selected: selected.to_string(),
                correct_answer: correct.map(str::to_string),
                is_correct: correct.is_some_and(|c| c == selected),
            }
        })
        .collect();

    let score = results.iter().filter(|r| r.is_correct).count();

    QuizResult {
        exam_id,
        score,
        total_questions: results.len(),
        results,
    }
}

/// Loads the exam's questions and grades one submission against them.
#[tracing::instrument(skip(repo, policy, answers), fields(user_id = session.user_id))]
pub async fn submit(
    repo: &dyn ExamRepository,
    policy: &RetryPolicy,
    session: &SessionContext,
    exam_id: i64,
    answers: &HashMap<i64, String>,
) -> Result<QuizResult, WorkflowError> {
    let questions = load_questions(repo, policy, session, exam_id).await?;
    let result = grade(exam_id, &questions, answers);

    tracing::info!(
        score = result.score,
        total = result.total_questions,
        "Quiz graded"
    );
    Ok(result)
}
