// src/repository/memory.rs

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{ExamRepository, PersistenceError};
use crate::models::{
    exam::{Exam, NewExam},
    question::{NewQuestion, Question},
    user::User,
};

/// In-process `ExamRepository` for tests.
#[derive(Default)]
pub struct MemoryExamRepository {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    exams: Vec<Exam>,
    questions: Vec<Question>,
    /// Question inserts whose stem contains this text fail.
    #[cfg(test)]
    failing_stem: Option<String>,
    /// Delay applied to every user lookup.
    #[cfg(test)]
    user_lookup_stall: Option<std::time::Duration>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryExamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every question insert whose stem contains `needle` fail.
    #[cfg(test)]
    pub(crate) fn fail_question_inserts_containing(&self, needle: impl Into<String>) {
        if let Ok(mut tables) = self.inner.lock() {
            tables.failing_stem = Some(needle.into());
        }
    }

    /// Makes every user lookup sleep for `delay` before answering.
    #[cfg(test)]
    pub(crate) fn stall_user_lookups(&self, delay: std::time::Duration) {
        if let Ok(mut tables) = self.inner.lock() {
            tables.user_lookup_stall = Some(delay);
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, PersistenceError> {
        self.inner
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl ExamRepository for MemoryExamRepository {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, PersistenceError> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(PersistenceError::Duplicate(format!(
                "username '{}' already exists",
                username
            )));
        }
        let user = User {
            id: tables.next_id(),
            username: username.to_string(),
            password: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, PersistenceError> {
        #[cfg(test)]
        {
            let stall = self.tables()?.user_lookup_stall;
            if let Some(delay) = stall {
                tokio::time::sleep(delay).await;
            }
        }
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn insert_exam(&self, exam: &NewExam) -> Result<Exam, PersistenceError> {
        let mut tables = self.tables()?;
        if tables
            .exams
            .iter()
            .any(|e| e.document_key == exam.document_key)
        {
            return Err(PersistenceError::Duplicate(exam.document_key.clone()));
        }
        let row = Exam {
            id: tables.next_id(),
            user_id: exam.user_id,
            document_key: exam.document_key.clone(),
            document_url: exam.document_url.clone(),
            original_name: exam.original_name.clone(),
            created_at: Utc::now(),
        };
        tables.exams.push(row.clone());
        Ok(row)
    }

    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, PersistenceError> {
        let tables = self.tables()?;
        Ok(tables.exams.iter().find(|e| e.id == id).cloned())
    }

    async fn list_exams(&self, user_id: i64) -> Result<Vec<Exam>, PersistenceError> {
        let tables = self.tables()?;
        let mut exams: Vec<Exam> = tables
            .exams
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(exams)
    }

    async fn delete_exam(&self, id: i64) -> Result<u64, PersistenceError> {
        let mut tables = self.tables()?;
        if tables.questions.iter().any(|q| q.exam_id == id) {
            return Err(PersistenceError::QueryFailed(format!(
                "exam {} still has questions",
                id
            )));
        }
        let before = tables.exams.len();
        tables.exams.retain(|e| e.id != id);
        Ok((before - tables.exams.len()) as u64)
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<Question, PersistenceError> {
        let mut tables = self.tables()?;
        #[cfg(test)]
        {
            if let Some(needle) = &tables.failing_stem {
                if question.stem.contains(needle.as_str()) {
                    return Err(PersistenceError::QueryFailed(format!(
                        "insert rejected for stem containing '{}'",
                        needle
                    )));
                }
            }
        }
        if !tables.exams.iter().any(|e| e.id == question.exam_id) {
            return Err(PersistenceError::QueryFailed(format!(
                "exam {} does not exist",
                question.exam_id
            )));
        }
        let [a, b, c, d] = question.options.clone();
        let row = Question {
            id: tables.next_id(),
            exam_id: question.exam_id,
            stem: question.stem.clone(),
            option_a: a,
            option_b: b,
            option_c: c,
            option_d: d,
            correct_label: question.correct_label.clone(),
            created_at: Utc::now(),
        };
        tables.questions.push(row.clone());
        Ok(row)
    }

    async fn list_questions(&self, exam_id: i64) -> Result<Vec<Question>, PersistenceError> {
        let tables = self.tables()?;
        Ok(tables
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn count_questions(&self, exam_id: i64) -> Result<i64, PersistenceError> {
        let tables = self.tables()?;
        Ok(tables
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .count() as i64)
    }

    async fn delete_questions(&self, exam_id: i64) -> Result<u64, PersistenceError> {
        let mut tables = self.tables()?;
        let before = tables.questions.len();
        tables.questions.retain(|q| q.exam_id != exam_id);
        Ok((before - tables.questions.len()) as u64)
    }
}
