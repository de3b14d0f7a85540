// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    clients::{openai::QuestionGenerator, storage::DocumentStore},
    config::Config,
    repository::ExamRepository,
    services::{exams::Workflow, retry::RetryPolicy},
};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ExamRepository>,
    pub store: DocumentStore,
    pub generator: Arc<dyn QuestionGenerator>,
    pub config: Config,
}

impl AppState {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config.retry)
    }

    pub fn workflow(&self) -> Workflow<'_> {
        Workflow {
            repo: self.repo.as_ref(),
            store: &self.store,
            generator: self.generator.as_ref(),
            settings: &self.config.generation,
            policy: self.retry_policy(),
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for DocumentStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
