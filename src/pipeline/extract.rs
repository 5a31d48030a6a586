//! Text extraction: turn downloaded PDF bytes into one text blob.
//!
//! Only the text layer is read; there is no layout analysis or OCR. Pages
//! are concatenated in document order with no separator, and a page whose
//! text layer is missing or unreadable contributes an empty string instead
//! of failing the document.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state, and locating it may
//! download it through a blocking HTTP client. Neither may run on a Tokio
//! worker thread, so [`PdfiumExtractor::prepare`] and [`extract_blocking`]
//! move the work onto the blocking pool.

use crate::error::{AttemptError, HarvestError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Converts raw PDF bytes to text.
///
/// Implementations run on the blocking thread pool, hence the
/// `Send + Sync + 'static` bound.
pub trait TextExtractor: Send + Sync + 'static {
    /// Extract the concatenated page text of `bytes`.
    ///
    /// Returns [`AttemptError::MalformedPdf`] when the bytes cannot be loaded
    /// as a document at all.
    fn extract_text(&self, bytes: &[u8]) -> Result<String, AttemptError>;
}

/// Run `extractor` on `bytes` inside `tokio::task::spawn_blocking`.
pub async fn extract_blocking<E: TextExtractor>(
    extractor: &Arc<E>,
    bytes: Vec<u8>,
) -> Result<String, AttemptError> {
    let extractor = Arc::clone(extractor);
    tokio::task::spawn_blocking(move || extractor.extract_text(&bytes))
        .await
        .map_err(|e| AttemptError::Extraction {
            detail: format!("extraction task panicked: {}", e),
        })?
}

/// [`TextExtractor`] backed by the pdfium engine.
///
/// Holds only the resolved library path; each document binds its own
/// engine on the blocking thread that parses it.
#[derive(Debug, Clone)]
pub struct PdfiumExtractor {
    library_path: PathBuf,
}

impl PdfiumExtractor {
    /// Locate pdfium (downloading and caching it on first use) off the async
    /// worker threads.
    pub async fn prepare() -> Result<Self, HarvestError> {
        tokio::task::spawn_blocking(Self::locate)
            .await
            .map_err(|e| HarvestError::Internal(format!("pdfium setup task panicked: {}", e)))?
    }

    /// Blocking form of [`prepare`](Self::prepare). Do not call from inside
    /// an async task.
    pub fn locate() -> Result<Self, HarvestError> {
        let path = pdfium_auto::ensure_pdfium_library(None)
            .map_err(|e| HarvestError::PdfiumBindingFailed(e.to_string()))?;
        Self::at_path(path)
    }

    /// Use the pdfium library at `path`, checking once that it binds.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self, HarvestError> {
        let library_path = path.into();
        pdfium_auto::bind_pdfium_from_path(&library_path)
            .map_err(|e| HarvestError::PdfiumBindingFailed(e.to_string()))?;
        debug!("pdfium bound from {}", library_path.display());
        Ok(Self { library_path })
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, AttemptError> {
        let pdfium = pdfium_auto::bind_pdfium_from_path(&self.library_path).map_err(|e| {
            AttemptError::Extraction {
                detail: e.to_string(),
            }
        })?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| AttemptError::MalformedPdf {
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        let page_texts = pages.iter().enumerate().map(|(idx, page)| match page.text() {
            Ok(text) => Some(text.all()),
            Err(e) => {
                debug!("Page {}: no text layer ({:?})", idx + 1, e);
                None
            }
        });

        let text = concat_pages(page_texts);
        debug!("Extracted {} chars from {} pages", text.len(), pages.len());
        Ok(text)
    }
}

/// Join per-page text in order; `None` pages contribute nothing.
pub fn concat_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    pages.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_join_in_order() {
        let text = concat_pages(vec![Some("Title 5, ".into()), Some("Section 552".into())]);
        assert_eq!(text, "Title 5, Section 552");
    }

    #[test]
    fn missing_pages_contribute_nothing() {
        let text = concat_pages(vec![Some("a".into()), None, Some(String::new()), Some("b".into())]);
        assert_eq!(text, "ab");
    }

    #[test]
    fn empty_document_is_empty_text() {
        assert_eq!(concat_pages(Vec::<Option<String>>::new()), "");
    }

    struct Upper;

    impl TextExtractor for Upper {
        fn extract_text(&self, bytes: &[u8]) -> Result<String, AttemptError> {
            Ok(String::from_utf8_lossy(bytes).to_uppercase())
        }
    }

    struct Exploding;

    impl TextExtractor for Exploding {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String, AttemptError> {
            panic!("engine crashed");
        }
    }

    #[tokio::test]
    async fn extract_blocking_runs_on_current_thread_runtime() {
        let text = extract_blocking(&Arc::new(Upper), b"title 5".to_vec()).await;
        assert_eq!(text, Ok("TITLE 5".to_string()));
    }

    #[tokio::test]
    async fn extractor_panic_becomes_attempt_error() {
        let err = extract_blocking(&Arc::new(Exploding), b"%PDF".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AttemptError::Extraction { .. }), "got {err:?}");
    }

    #[test]
    fn binding_a_missing_library_is_fatal() {
        let err = PdfiumExtractor::at_path("/nonexistent/libpdfium.so").unwrap_err();
        assert!(matches!(err, HarvestError::PdfiumBindingFailed(_)), "got {err:?}");
    }
}
