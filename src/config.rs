// src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

/// Default cap for uploaded documents (10 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub storage: StorageSettings,
    pub generation: GenerationSettings,
    pub retry: RetrySettings,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub local_dir: String,
    /// Prefix for public read URLs; must end with `/`.
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Subject domain phrased into the system role and the prompt.
    pub subject: String,
    pub question_count: usize,
    /// Number of characters of extracted text sent to the model.
    pub prompt_chars: usize,
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub call_timeout: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let jwt_expiration = parsed("JWT_EXPIRATION", 86_400)?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let mut public_base_url = env::var("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/files/".to_string());
        if !public_base_url.ends_with('/') {
            public_base_url.push('/');
        }
        url::Url::parse(&public_base_url).map_err(|_| ConfigError::Invalid {
            name: "STORAGE_PUBLIC_BASE_URL",
            value: public_base_url.clone(),
        })?;

        let storage = StorageSettings {
            local_dir: env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string()),
            public_base_url,
        };

        let generation = GenerationSettings {
            api_key: required("OPENAI_API_KEY")?,
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            subject: env::var("GENERATION_SUBJECT")
                .unwrap_or_else(|_| "medical study".to_string()),
            question_count: parsed("GENERATION_QUESTION_COUNT", 5)?,
            prompt_chars: parsed("GENERATION_PROMPT_CHARS", 2000)?,
        };

        let retry = RetrySettings {
            call_timeout: Duration::from_secs(parsed("CALL_TIMEOUT_SECS", 30)?),
            max_attempts: parsed("RETRY_MAX_ATTEMPTS", 3)?,
            base_delay: Duration::from_millis(parsed("RETRY_BASE_DELAY_MS", 200)?),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            storage,
            generation,
            retry,
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}
