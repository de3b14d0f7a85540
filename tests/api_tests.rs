// tests/api_tests.rs

mod common;

use common::{pdf_with_pages, spawn_app, spawn_app_with_limit};
use preprova::clients::openai::GenerationError;

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Username that is too short
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({
            "username": "yo",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = spawn_app().await;
    let body = serde_json::json!({ "username": "ana_costa", "password": "password123" });

    for expected in [201, 409] {
        let response = app
            .client
            .post(app.url("/api/auth/register"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), expected);
    }
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;
    app.client
        .post(app.url("/api/auth/register"))
        .json(&serde_json::json!({ "username": "bruno", "password": "password123" }))
        .send()
        .await
        .expect("Register failed");

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&serde_json::json!({ "username": "bruno", "password": "wrong-password" }))
        .send()
        .await
        .expect("Login failed");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn exam_routes_require_a_token() {
    let app = spawn_app().await;

    let list = app
        .client
        .get(app.url("/api/exams"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(list.status().as_u16(), 401);

    let upload = app
        .upload("not-a-token", "exam.pdf", pdf_with_pages(&["text"]))
        .await;
    assert_eq!(upload.status().as_u16(), 401);
}

#[tokio::test]
async fn upload_creates_exam_with_questions() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let response = app
        .upload(&token, "Pré prova (1).pdf", pdf_with_pages(&["Cardiology notes"]))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    let key = body["exam"]["document_key"].as_str().unwrap();
    assert!(key.starts_with("pdfs/"));
    assert!(key.ends_with("-Prprova1.pdf"));
    assert_eq!(body["exam"]["original_name"], "Pré prova (1).pdf");
    assert_eq!(body["synthesis"]["generated"], 2);
    assert_eq!(body["synthesis"]["persisted"], 2);
    assert!(app.store.exists(key).await.unwrap());

    let listed: Vec<serde_json::Value> = app
        .client
        .get(app.url("/api/exams"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["question_count"], 2);
    assert_eq!(listed[0]["id"], body["exam"]["id"]);
}

#[tokio::test]
async fn identical_names_get_distinct_keys() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let mut keys = Vec::new();
    for _ in 0..2 {
        let body: serde_json::Value = app
            .upload(&token, "exam.pdf", pdf_with_pages(&["same"]))
            .await
            .json()
            .await
            .unwrap();
        keys.push(body["exam"]["document_key"].as_str().unwrap().to_string());
    }

    assert_ne!(keys[0], keys[1]);
}

#[tokio::test]
async fn upload_rejects_non_pdf_and_missing_field() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;

    let response = app
        .upload(&token, "notes.pdf", b"just some text".to_vec())
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let form = reqwest::multipart::Form::new().text("title", "no file here");
    let response = app
        .client
        .post(app.url("/api/exams"))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = spawn_app_with_limit(512).await;
    let token = app.signed_in_user().await;

    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(2048, b' ');
    let response = app.upload(&token, "big.pdf", bytes).await;

    assert_eq!(response.status().as_u16(), 413);
    assert!(app.store.list("pdfs").await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_generation_keeps_exam_without_questions() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;
    app.generator
        .push(Ok(vec!["Sure! Here are five questions about the heart.".to_string()]));

    let response = app
        .upload(&token, "exam.pdf", pdf_with_pages(&["The heart"]))
        .await;
    assert_eq!(response.status().as_u16(), 422);

    let listed: Vec<serde_json::Value> = app
        .client
        .get(app.url("/api/exams"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["question_count"], 0);
    let exam_id = listed[0]["id"].as_i64().unwrap();

    // The quiz cannot be taken until questions exist.
    let quiz = app
        .client
        .get(app.url(&format!("/api/exams/{}/quiz", exam_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(quiz.status().as_u16(), 422);

    let regenerate = app
        .client
        .post(app.url(&format!("/api/exams/{}/questions/regenerate", exam_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(regenerate.status().as_u16(), 200);
    let report: serde_json::Value = regenerate.json().await.unwrap();
    assert_eq!(report["persisted"], 2);

    let again = app
        .client
        .post(app.url(&format!("/api/exams/{}/questions/regenerate", exam_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);
}

#[tokio::test]
async fn generator_failure_is_bad_gateway() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;
    app.generator.push(Err(GenerationError::Status {
        status: 401,
        body: "invalid api key".to_string(),
    }));

    let response = app
        .upload(&token, "exam.pdf", pdf_with_pages(&["The heart"]))
        .await;

    assert_eq!(response.status().as_u16(), 502);
}

#[tokio::test]
async fn other_users_cannot_see_an_exam() {
    let app = spawn_app().await;
    let owner = app.signed_in_user().await;
    let intruder = app.signed_in_user().await;
    let exam_id = app.uploaded_exam(&owner).await;

    for path in [
        format!("/api/exams/{}", exam_id),
        format!("/api/exams/{}/quiz", exam_id),
    ] {
        let response = app
            .client
            .get(app.url(&path))
            .bearer_auth(&intruder)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }

    let delete = app
        .client
        .delete(app.url(&format!("/api/exams/{}", exam_id)))
        .bearer_auth(&intruder)
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status().as_u16(), 404);

    let still_there = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam_id)))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();
    assert_eq!(still_there.status().as_u16(), 200);
}

#[tokio::test]
async fn stored_document_is_served_from_its_public_url() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;
    let pdf = pdf_with_pages(&["Served back"]);

    let body: serde_json::Value = app
        .upload(&token, "exam.pdf", pdf.clone())
        .await
        .json()
        .await
        .unwrap();
    let key = body["exam"]["document_key"].as_str().unwrap();
    assert_eq!(
        body["exam"]["document_url"],
        format!("{}{}", common::PUBLIC_BASE, key)
    );

    let response = app
        .client
        .get(app.url(&format!("/files/{}", key)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/pdf"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), pdf.as_slice());

    let missing = app
        .client
        .get(app.url("/files/pdfs/nope.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_reports_every_step() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;
    let exam_id = app.uploaded_exam(&token).await;

    let response = app
        .client
        .delete(app.url(&format!("/api/exams/{}", exam_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let report: serde_json::Value = response.json().await.unwrap();
    assert_eq!(report["exam_id"], exam_id);
    assert_eq!(report["document"]["status"], "done");
    assert_eq!(report["questions"]["status"], "done");
    assert_eq!(report["questions"]["affected"], 2);
    assert_eq!(report["exam"]["status"], "done");

    assert!(app.store.list("pdfs").await.unwrap().is_empty());
    let gone = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_continues_when_document_is_already_gone() {
    let app = spawn_app().await;
    let token = app.signed_in_user().await;
    let exam_id = app.uploaded_exam(&token).await;

    let exam: serde_json::Value = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    app.store
        .delete(exam["document_key"].as_str().unwrap())
        .await
        .unwrap();

    let report: serde_json::Value = app
        .client
        .delete(app.url(&format!("/api/exams/{}", exam_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(report["document"]["status"], "failed");
    assert_eq!(report["questions"]["status"], "done");
    assert_eq!(report["exam"]["status"], "done");
}
