// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Labels of the four answer slots, in display order.
pub const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];

/// Shown in place of an option the generator left empty.
pub const MISSING_OPTION_PLACEHOLDER: &str = "(option not provided)";

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Owning exam.
    pub exam_id: i64,

    /// The text content of the question.
    pub stem: String,

    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,

    /// Label ("A".."D") of the correct option.
    pub correct_label: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Question {
    /// Option text stored under `label`, if the label is one of A–D and the
    /// slot holds non-blank text.
    pub fn option(&self, label: &str) -> Option<&str> {
        let slot = match label.trim().to_ascii_uppercase().as_str() {
            "A" => &self.option_a,
            "B" => &self.option_b,
            "C" => &self.option_c,
            "D" => &self.option_d,
            _ => return None,
        };
        slot.as_deref().filter(|text| !text.trim().is_empty())
    }

    /// Option text the correct label resolves to. `None` means no response
    /// can match this question.
    pub fn correct_answer(&self) -> Option<&str> {
        self.option(&self.correct_label)
    }

    /// The four options as shown to the user, placeholders filling the gaps.
    pub fn display_options(&self) -> Vec<DisplayOption> {
        OPTION_LABELS
            .iter()
            .map(|label| DisplayOption {
                label: (*label).to_string(),
                text: self
                    .option(label)
                    .unwrap_or(MISSING_OPTION_PLACEHOLDER)
                    .to_string(),
            })
            .collect()
    }
}

/// Question row used when inserting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub exam_id: i64,
    pub stem: String,
    /// Options A–D, in order.
    pub options: [Option<String>; 4],
    pub correct_label: String,
}

/// One answer slot as displayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayOption {
    pub label: String,
    pub text: String,
}

/// DTO for sending a question to the client (excludes the correct label).
///
/// Stem and option texts are stored HTML-sanitized, so `<` and `&` arrive as
/// `&lt;` and `&amp;`. Submissions are graded against this served text.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub stem: String,
    pub options: Vec<DisplayOption>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id,
            stem: q.stem.clone(),
            options: q.display_options(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_question(id: i64, correct_label: &str) -> Question {
    Question {
        id,
        exam_id: 1,
        stem: format!("Question {}", id),
        option_a: Some(format!("alpha {}", id)),
        option_b: Some(format!("beta {}", id)),
        option_c: Some(format!("gamma {}", id)),
        option_d: Some(format!("delta {}", id)),
        correct_label: correct_label.to_string(),
        created_at: chrono::Utc::now(),
    }
}
