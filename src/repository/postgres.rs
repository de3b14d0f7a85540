// src/repository/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::{ExamRepository, PersistenceError};
use crate::models::{
    exam::{Exam, NewExam},
    question::{NewQuestion, Question},
    user::User,
};

const EXAM_COLUMNS: &str = "id, user_id, document_key, document_url, original_name, created_at";

const QUESTION_COLUMNS: &str =
    "id, exam_id, stem, option_a, option_b, option_c, option_d, correct_label, created_at";

/// `ExamRepository` backed by Postgres.
#[derive(Clone)]
pub struct PgExamRepository {
    pool: PgPool,
}

impl PgExamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExamRepository for PgExamRepository {
    #[instrument(skip(self, password_hash))]
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<User, PersistenceError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            RETURNING id, username, password, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, PersistenceError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self, exam), fields(user_id = exam.user_id, key = %exam.document_key))]
    async fn insert_exam(&self, exam: &NewExam) -> Result<Exam, PersistenceError> {
        let sql = format!(
            "INSERT INTO exams (user_id, document_key, document_url, original_name) \
             VALUES ($1, $2, $3, $4) RETURNING {EXAM_COLUMNS}"
        );
        let exam = sqlx::query_as::<_, Exam>(&sql)
            .bind(exam.user_id)
            .bind(&exam.document_key)
            .bind(&exam.document_url)
            .bind(&exam.original_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(exam)
    }

    #[instrument(skip(self))]
    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, PersistenceError> {
        let sql = format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1");
        let exam = sqlx::query_as::<_, Exam>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(exam)
    }

    #[instrument(skip(self))]
    async fn list_exams(&self, user_id: i64) -> Result<Vec<Exam>, PersistenceError> {
        let sql = format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let exams = sqlx::query_as::<_, Exam>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(exams)
    }

    #[instrument(skip(self))]
    async fn delete_exam(&self, id: i64) -> Result<u64, PersistenceError> {
        let result = sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self, question), fields(exam_id = question.exam_id))]
    async fn insert_question(&self, question: &NewQuestion) -> Result<Question, PersistenceError> {
        let [a, b, c, d] = &question.options;
        let sql = format!(
            "INSERT INTO questions \
             (exam_id, stem, option_a, option_b, option_c, option_d, correct_label) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {QUESTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Question>(&sql)
            .bind(question.exam_id)
            .bind(&question.stem)
            .bind(a)
            .bind(b)
            .bind(c)
            .bind(d)
            .bind(&question.correct_label)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    #[instrument(skip(self))]
    async fn list_questions(&self, exam_id: i64) -> Result<Vec<Question>, PersistenceError> {
        let sql =
            format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY id ASC");
        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(questions)
    }

    #[instrument(skip(self))]
    async fn count_questions(&self, exam_id: i64) -> Result<i64, PersistenceError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE exam_id = $1")
            .bind(exam_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn delete_questions(&self, exam_id: i64) -> Result<u64, PersistenceError> {
        let result = sqlx::query("DELETE FROM questions WHERE exam_id = $1")
            .bind(exam_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
