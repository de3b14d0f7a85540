// src/services/mod.rs

pub mod deletion;
pub mod exams;
pub mod extraction;
pub mod grading;
pub mod ingestion;
pub mod retry;
pub mod synthesis;
