// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, exam, files, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Room for multipart framing on top of the document itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, exams, files).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Every exam route requires a valid Bearer token.
    let exam_routes = Router::new()
        .route("/", post(exam::upload_exam).get(exam::list_exams))
        .route("/{id}", get(exam::get_exam).delete(exam::delete_exam))
        .route(
            "/{id}/questions/regenerate",
            post(exam::regenerate_questions),
        )
        .route("/{id}/quiz", get(quiz::get_quiz))
        .route("/{id}/quiz/submit", post(quiz::submit_quiz))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + MULTIPART_OVERHEAD,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exams", exam_routes)
        .route("/files/{*key}", get(files::get_file))
        // Global Middleware (applied from top to bottom)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
