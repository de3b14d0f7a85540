// src/services/retry.rs

use std::{future::Future, time::Duration};

use crate::{config::RetrySettings, error::WorkflowError};

/// Collaborator errors that may succeed if the call is repeated.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Bounded retry with exponential backoff and a timeout on every attempt.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub call_timeout: Duration,
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay: settings.base_delay,
            call_timeout: settings.call_timeout,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, used where a repeat would duplicate a side effect.
    pub fn once(self) -> Self {
        Self {
            max_attempts: 1,
            ..self
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Runs `call` until it succeeds, fails permanently, or the attempts run out.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, WorkflowError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Into<WorkflowError> + std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match tokio::time::timeout(self.call_timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if err.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        operation,
                        attempt,
                        error = %err,
                        "Transient failure, retrying"
                    );
                }
                Ok(Err(err)) => return Err(err.into()),
                Err(_) if attempt < max_attempts => {
                    tracing::warn!(operation, attempt, "Call timed out, retrying");
                }
                Err(_) => {
                    tracing::error!(operation, attempt, "Call timed out");
                    return Err(WorkflowError::Timeout {
                        operation,
                        elapsed: self.call_timeout,
                    });
                }
            }

            tokio::time::sleep(self.backoff(attempt)).await;
        }
    }
}
