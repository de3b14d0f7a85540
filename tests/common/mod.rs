// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use lopdf::{
    Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use preprova::{
    clients::{
        openai::{GenerationError, QuestionGenerator},
        storage::DocumentStore,
    },
    config::{Config, GenerationSettings, RetrySettings, StorageSettings},
    repository::MemoryExamRepository,
    routes,
    state::AppState,
};

pub const PUBLIC_BASE: &str = "http://localhost:3000/files/";

/// Two well-formed questions; the correct answers are "Heart" and "Oxygen".
pub const TWO_QUESTIONS: &str = "QUESTION: Which organ pumps blood?
A) Liver
B) Heart
C) Lung
D) Kidney
ANSWER: B
---
QUESTION: Which gas do red cells carry to tissues?
A) Oxygen
B) Nitrogen
C) Helium
D) Argon
ANSWER: a";

/// Generator returning queued responses, then `TWO_QUESTIONS` forever.
#[derive(Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<Vec<String>, GenerationError>>>,
}

impl ScriptedGenerator {
    pub fn push(&self, response: Result<Vec<String>, GenerationError>) {
        self.responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<Vec<String>, GenerationError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![TWO_QUESTIONS.to_string()]))
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: DocumentStore,
    pub generator: Arc<ScriptedGenerator>,
}

pub fn test_config(max_upload_bytes: usize) -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        storage: StorageSettings {
            local_dir: String::new(),
            public_base_url: PUBLIC_BASE.to_string(),
        },
        generation: GenerationSettings {
            api_key: "test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
            subject: "medical study".to_string(),
            question_count: 2,
            prompt_chars: 2000,
        },
        retry: RetrySettings {
            call_timeout: Duration::from_secs(10),
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        },
        max_upload_bytes,
    }
}

/// Spawns the app on a random port with in-memory collaborators.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_limit(1024 * 1024).await
}

pub async fn spawn_app_with_limit(max_upload_bytes: usize) -> TestApp {
    let store = DocumentStore::in_memory(PUBLIC_BASE.parse().expect("valid base url"));
    let generator = Arc::new(ScriptedGenerator::default());

    let state = AppState {
        repo: Arc::new(MemoryExamRepository::new()),
        store: store.clone(),
        generator: generator.clone(),
        config: test_config(max_upload_bytes),
    };
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
        generator,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a fresh user and returns a bearer token for it.
    pub async fn signed_in_user(&self) -> String {
        let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let password = "password123";

        let register = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(register.status().as_u16(), 201);

        let login: serde_json::Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        login["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn upload(&self, token: &str, name: &str, bytes: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str("application/pdf")
            .unwrap();
        let form = reqwest::multipart::Form::new().part("file", part);

        self.client
            .post(self.url("/api/exams"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Upload failed")
    }

    /// Uploads a one-page PDF and returns the created exam id.
    pub async fn uploaded_exam(&self, token: &str) -> i64 {
        let response = self
            .upload(token, "cardio exam.pdf", pdf_with_pages(&["The heart pumps blood."]))
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: serde_json::Value = response.json().await.unwrap();
        body["exam"]["id"].as_i64().expect("exam id")
    }
}

/// Builds a PDF with one page per entry of `pages`, each showing its text.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
