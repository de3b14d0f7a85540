// src/services/extraction.rs

use std::time::Duration;

use bytes::Bytes;
use lopdf::Document;

use crate::error::WorkflowError;

fn extract_pages(data: &[u8]) -> Result<Vec<String>, WorkflowError> {
    let doc = Document::load_mem(data)
        .map_err(|e| WorkflowError::Extraction(format!("failed to parse PDF: {}", e)))?;

    // get_pages is keyed by page number, so iteration is in page order.
    let mut pages = Vec::new();
    for (page_number, _object_id) in doc.get_pages() {
        let text = doc.extract_text(&[page_number]).map_err(|e| {
            WorkflowError::Extraction(format!("failed to read page {}: {}", page_number, e))
        })?;
        pages.push(text);
    }
    Ok(pages)
}

/// Plain text of every page, in page order, joined with `\n`.
///
/// Parsing runs on a blocking thread bounded by `timeout`. A document that
/// parses but carries no text is an extraction failure.
#[tracing::instrument(skip(data), fields(bytes = data.len()))]
pub async fn extract_text(data: Bytes, timeout: Duration) -> Result<String, WorkflowError> {
    let pages = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || extract_pages(&data)),
    )
    .await
    .map_err(|_| WorkflowError::Timeout {
        operation: "pdf.extract",
        elapsed: timeout,
    })?
    .map_err(|e| WorkflowError::Extraction(format!("extraction task failed: {}", e)))??;

    let page_count = pages.len();
    let text = pages.join("\n");

    if text.trim().is_empty() {
        tracing::warn!(page_count, "PDF contained no extractable text");
        return Err(WorkflowError::Extraction(
            "document contains no extractable text".to_string(),
        ));
    }

    tracing::info!(page_count, chars = text.chars().count(), "PDF text extraction complete");
    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn joins_pages_in_order() {
        let pdf = fixtures::pdf_with_pages(&["Mitochondria", "Ribosomes"]);
        let text = extract_text(Bytes::from(pdf), TIMEOUT).await.unwrap();

        let first = text.find("Mitochondria").unwrap();
        let second = text.find("Ribosomes").unwrap();
        assert!(first < second);
        assert!(text[first..second].contains('\n'));
    }

    #[tokio::test]
    async fn extraction_is_deterministic() {
        let pdf = Bytes::from(fixtures::pdf_with_pages(&["Cardiology basics"]));
        let a = extract_text(pdf.clone(), TIMEOUT).await.unwrap();
        let b = extract_text(pdf, TIMEOUT).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn garbage_is_an_extraction_error() {
        let err = extract_text(Bytes::from_static(b"%PDF-1.4 not really"), TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Extraction(_)));
    }

    #[tokio::test]
    async fn blank_pages_are_an_extraction_error() {
        let pdf = fixtures::pdf_with_pages(&["   "]);
        let err = extract_text(Bytes::from(pdf), TIMEOUT).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Extraction(_)));
    }
}
