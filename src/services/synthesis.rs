// src/services/synthesis.rs

//! Question synthesis: prompt the generator with a bounded prefix of the
//! document text, parse the response into question records and persist them.
//!
//! Each generated choice holds one or more blocks separated by a `---` line:
//!
//! ```text
//! QUESTION: <stem, may continue on following lines>
//! A) <option>
//! B) <option>
//! C) <option>
//! D) <option>
//! ANSWER: <A|B|C|D>
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    clients::openai::{GenerationError, QuestionGenerator},
    config::GenerationSettings,
    error::WorkflowError,
    models::{exam::SynthesisReport, question::NewQuestion},
    repository::ExamRepository,
    services::retry::RetryPolicy,
    utils::html::clean_html,
};

static QUESTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*question\s*:\s*(.*)$").unwrap());

static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*([abcd])\s*(?:\)|\.|:|\s-)\s*(.*)$").unwrap());

static ANSWER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*answer\s*:\s*(.*?)\s*$").unwrap());

static ANSWER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([a-z])(?:\)|\.)?$").unwrap());

/// A question block that satisfied the response grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuestion {
    pub stem: String,
    pub options: [Option<String>; 4],
    pub correct_label: String,
}

/// Truncates to at most `max_chars` characters, never splitting one.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn system_role(settings: &GenerationSettings) -> String {
    format!(
        "You create multiple-choice flashcards for {}. Follow the requested output format exactly.",
        settings.subject
    )
}

pub fn build_prompt(settings: &GenerationSettings, text: &str) -> String {
    format!(
        "Create {count} flashcard-style multiple-choice questions about {subject} based on the text below.\n\
         Write each question in exactly this format and separate questions with a line containing only ---\n\
         \n\
         QUESTION: <question text>\n\
         A) <option>\n\
         B) <option>\n\
         C) <option>\n\
         D) <option>\n\
         ANSWER: <letter of the correct option>\n\
         \n\
         Text:\n{text}",
        count = settings.question_count,
        subject = settings.subject,
        text = truncate_chars(text, settings.prompt_chars),
    )
}

fn option_index(label: &str) -> Option<usize> {
    match label.to_ascii_uppercase().as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    }
}

fn parse_block(block: &str) -> Result<ParsedQuestion, String> {
    let mut stem: Option<String> = None;
    let mut options: [Option<String>; 4] = Default::default();
    let mut answer: Option<String> = None;
    // Stem continuation lines are allowed until the first option line.
    let mut in_stem = false;

    for line in block.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(caps) = QUESTION_LINE.captures(line) {
            if stem.is_some() {
                return Err("more than one QUESTION line".to_string());
            }
            stem = Some(caps[1].trim().to_string());
            in_stem = true;
        } else if let Some(caps) = ANSWER_LINE.captures(line) {
            if answer.is_some() {
                return Err("more than one ANSWER line".to_string());
            }
            answer = Some(caps[1].to_string());
            in_stem = false;
        } else if let Some(caps) = OPTION_LINE.captures(line) {
            let index = option_index(&caps[1]).ok_or("unknown option label")?;
            if options[index].is_some() {
                return Err(format!("option {} given twice", &caps[1].to_ascii_uppercase()));
            }
            let text = caps[2].trim();
            options[index] = (!text.is_empty()).then(|| text.to_string());
            in_stem = false;
        } else if in_stem {
            if let Some(stem) = stem.as_mut() {
                stem.push('\n');
                stem.push_str(line.trim());
            }
        } else {
            return Err(format!("unexpected line: {}", line.trim()));
        }
    }

    let stem = stem
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or("missing or empty QUESTION")?;

    let answer = answer.ok_or("missing ANSWER")?;
    let label = ANSWER_LABEL
        .captures(&answer)
        .map(|caps| caps[1].to_ascii_uppercase())
        .ok_or_else(|| format!("ANSWER is not a single option label: {}", answer))?;
    let index = option_index(&label).ok_or_else(|| format!("ANSWER label {} is not A-D", label))?;
    if options[index].is_none() {
        return Err(format!("ANSWER names option {} which is empty", label));
    }

    Ok(ParsedQuestion {
        stem,
        options,
        correct_label: label,
    })
}

/// Parses one generated choice into its question blocks.
pub fn parse_candidate(text: &str) -> Result<Vec<ParsedQuestion>, String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim() == "---" {
            blocks.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    blocks.push(current);

    let questions = blocks
        .iter()
        .filter(|b| !b.trim().is_empty())
        .map(|b| parse_block(b))
        .collect::<Result<Vec<_>, _>>()?;

    if questions.is_empty() {
        return Err("no question blocks".to_string());
    }
    Ok(questions)
}

/// Parses every choice; the first malformed one fails the whole response.
pub fn parse_generation(choices: &[String]) -> Result<Vec<ParsedQuestion>, WorkflowError> {
    let mut questions = Vec::new();
    for (candidate, choice) in choices.iter().enumerate() {
        let parsed = parse_candidate(choice)
            .map_err(|reason| WorkflowError::MalformedGeneration { candidate, reason })?;
        questions.extend(parsed);
    }
    Ok(questions)
}

/// Strips markup. `None` when the stem or the correct option ends up empty.
fn sanitize(question: ParsedQuestion) -> Option<ParsedQuestion> {
    let stem = clean_html(&question.stem).trim().to_string();
    if stem.is_empty() {
        return None;
    }
    let options = question.options.map(|option| {
        option
            .map(|text| clean_html(&text).trim().to_string())
            .filter(|text| !text.is_empty())
    });
    option_index(&question.correct_label).and_then(|i| options[i].as_ref())?;
    Some(ParsedQuestion {
        stem,
        options,
        ..question
    })
}

/// Generates, parses and stores the questions of one exam.
///
/// Nothing is stored unless the whole response parses. Individual inserts
/// that fail are skipped and counted.
#[tracing::instrument(skip_all, fields(exam_id = exam_id))]
pub async fn synthesize(
    repo: &dyn ExamRepository,
    generator: &dyn QuestionGenerator,
    settings: &GenerationSettings,
    policy: &RetryPolicy,
    exam_id: i64,
    text: &str,
) -> Result<SynthesisReport, WorkflowError> {
    let system = system_role(settings);
    let prompt = build_prompt(settings, text);

    let choices = policy
        .run("generation", || generator.generate(&system, &prompt))
        .await?;
    if choices.is_empty() {
        return Err(GenerationError::EmptyResponse.into());
    }

    let parsed = parse_generation(&choices)?;
    let mut report = SynthesisReport {
        generated: parsed.len(),
        ..Default::default()
    };

    for question in parsed {
        let Some(question) = sanitize(question) else {
            tracing::warn!("Dropping question left without stem or answer after sanitization");
            report.skipped += 1;
            continue;
        };
        let row = NewQuestion {
            exam_id,
            stem: question.stem,
            options: question.options,
            correct_label: question.correct_label,
        };
        // Single attempt: a retried insert could store the row twice.
        match policy
            .once()
            .run("questions.insert", || repo.insert_question(&row))
            .await
        {
            Ok(_) => report.persisted += 1,
            Err(e) => {
                tracing::error!(error = %e, "Failed to persist question, skipping");
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        generated = report.generated,
        persisted = report.persisted,
        skipped = report.skipped,
        "Question synthesis complete"
    );
    Ok(report)
}
