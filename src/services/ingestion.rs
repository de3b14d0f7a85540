// src/services/ingestion.rs

//! Upload validation and storage-key generation.

use std::sync::LazyLock;

use bytes::Bytes;
use chrono::Utc;
use regex::Regex;

use crate::error::WorkflowError;

/// Prefix under which uploaded documents are stored.
pub const DOCUMENT_PREFIX: &str = "pdfs";

const PDF_SIGNATURE: &[u8] = b"%PDF-";

const FALLBACK_NAME: &str = "document.pdf";

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").unwrap());

/// An upload that passed validation and has a storage key.
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    pub key: String,
    pub original_name: String,
    pub bytes: Bytes,
}

/// Keeps only `[A-Za-z0-9._-]`, drops leading dots, falls back to a fixed
/// name when nothing survives.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(name, "");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Key of the form `pdfs/{unix_millis}-{8 hex}-{sanitized name}`.
///
/// The millisecond prefix keeps keys ordered by upload time; the random
/// segment separates uploads landing in the same millisecond.
pub fn storage_key(name: &str) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}-{}-{}",
        DOCUMENT_PREFIX,
        Utc::now().timestamp_millis(),
        &nonce[..8],
        sanitize_file_name(name)
    )
}

/// Checks an upload before anything touches the network.
pub fn ingest(
    original_name: &str,
    bytes: Bytes,
    max_bytes: usize,
) -> Result<IngestedDocument, WorkflowError> {
    if bytes.is_empty() {
        return Err(WorkflowError::Validation("Uploaded file is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(WorkflowError::PayloadTooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }
    if !bytes.starts_with(PDF_SIGNATURE) {
        return Err(WorkflowError::Validation(
            "Uploaded file is not a PDF document".to_string(),
        ));
    }

    Ok(IngestedDocument {
        key: storage_key(original_name),
        original_name: original_name.to_string(),
        bytes,
    })
}
