// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'exams' table: an uploaded source document plus its
/// generated question set (a "pré-prova").
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    /// Owning user.
    pub user_id: i64,

    /// Object-store key of the source document.
    pub document_key: String,

    /// Public read URL of the source document.
    pub document_url: String,

    /// File name as uploaded, before sanitization.
    pub original_name: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Exam row used when inserting; the id and timestamp are server-generated.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub user_id: i64,
    pub document_key: String,
    pub document_url: String,
    pub original_name: String,
}

/// Exam listing entry.
#[derive(Debug, Serialize)]
pub struct ExamSummary {
    #[serde(flatten)]
    pub exam: Exam,
    pub question_count: i64,
}

/// Outcome of one question-synthesis run.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SynthesisReport {
    /// Number of question blocks parsed out of the generation response.
    pub generated: usize,
    pub persisted: usize,
    /// Blocks not stored: emptied by HTML sanitizing, or their insert failed.
    pub skipped: usize,
}

/// Response of a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub exam: Exam,
    pub synthesis: SynthesisReport,
}

/// Result of a single exam-deletion step.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Done { affected: u64 },
    Failed { error: String },
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done { .. })
    }
}

/// Per-step report of an exam deletion.
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReport {
    pub exam_id: i64,
    pub document: StepOutcome,
    pub questions: StepOutcome,
    pub exam: StepOutcome,
}
