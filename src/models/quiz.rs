// src/models/quiz.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: Text of the selected option
    #[validate(custom(function = validate_answers))]
    pub answers: HashMap<i64, String>,
}

/// Caps the submission so one request cannot carry an unbounded map.
fn validate_answers(answers: &HashMap<i64, String>) -> Result<(), validator::ValidationError> {
    if answers.len() > 500 {
        return Err(validator::ValidationError::new("too_many_answers"));
    }
    if answers.values().any(|text| text.len() > 2000) {
        return Err(validator::ValidationError::new("answer_too_long"));
    }
    Ok(())
}

/// Grading of one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GradedQuestion {
    pub question_id: i64,
    pub stem: String,
    /// Submitted option text; empty when the question was left unanswered.
    pub selected: String,
    /// Option text the correct label resolves to, if any.
    pub correct_answer: Option<String>,
    pub is_correct: bool,
}

/// Quiz score, counted out of the number of questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizResult {
    pub exam_id: i64,
    pub score: usize,
    pub total_questions: usize,
    pub results: Vec<GradedQuestion>,
}
