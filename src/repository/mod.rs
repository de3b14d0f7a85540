// src/repository/mod.rs

//! Relational data access for users, exams and questions.

mod memory;
mod postgres;

pub use memory::MemoryExamRepository;
pub use postgres::PgExamRepository;

use async_trait::async_trait;

use crate::{
    models::{
        exam::{Exam, NewExam},
        question::{NewQuestion, Question},
        user::User,
    },
    services::retry::Transient,
};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Pool exhausted, connection dropped, or the database is unreachable.
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("unique constraint violated: {0}")]
    Duplicate(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl Transient for PersistenceError {
    fn is_transient(&self) -> bool {
        matches!(self, PersistenceError::Unavailable(_))
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                PersistenceError::Unavailable(err.to_string())
            }
            // Postgres error code for unique violation is 23505
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                PersistenceError::Duplicate(db.message().to_string())
            }
            _ => PersistenceError::QueryFailed(err.to_string()),
        }
    }
}

#[async_trait]
pub trait ExamRepository: Send + Sync {
    async fn create_user(&self, username: &str, password_hash: &str)
    -> Result<User, PersistenceError>;

    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<User>, PersistenceError>;

    async fn insert_exam(&self, exam: &NewExam) -> Result<Exam, PersistenceError>;

    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, PersistenceError>;

    /// Exams owned by `user_id`, newest first.
    async fn list_exams(&self, user_id: i64) -> Result<Vec<Exam>, PersistenceError>;

    async fn delete_exam(&self, id: i64) -> Result<u64, PersistenceError>;

    async fn insert_question(&self, question: &NewQuestion) -> Result<Question, PersistenceError>;

    /// Questions of one exam in creation order.
    async fn list_questions(&self, exam_id: i64) -> Result<Vec<Question>, PersistenceError>;

    async fn count_questions(&self, exam_id: i64) -> Result<i64, PersistenceError>;

    async fn delete_questions(&self, exam_id: i64) -> Result<u64, PersistenceError>;
}
