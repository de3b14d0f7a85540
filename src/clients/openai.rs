// src/clients/openai.rs

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{config::GenerationSettings, services::retry::Transient};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("api request failed: {0}")]
    Transport(String),
    #[error("rate limited")]
    RateLimited,
    #[error("api returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("response contained no choices")]
    EmptyResponse,
}

impl Transient for GenerationError {
    fn is_transient(&self) -> bool {
        match self {
            GenerationError::Transport(_) | GenerationError::RateLimited => true,
            GenerationError::Status { status, .. } => *status >= 500,
            GenerationError::InvalidResponse(_) | GenerationError::EmptyResponse => false,
        }
    }
}

/// Text-generation collaborator: one system role plus one user prompt in,
/// the ordered generated choices out.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<Vec<String>, GenerationError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    n: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// `QuestionGenerator` over an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(settings: &GenerationSettings) -> Self {
        Self {
            client: Client::new(),
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiGenerator {
    #[tracing::instrument(skip(self, system, prompt), fields(model = %self.model))]
    async fn generate(&self, system: &str, prompt: &str) -> Result<Vec<String>, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            n: 1,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Generation endpoint rate limited the request");
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let choices: Vec<String> = parsed
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .collect();

        debug!(choices = choices.len(), "Generation call returned");

        if choices.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(choices)
    }
}
