//! Error types for the uscode-cite library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`HarvestError`] — **Fatal**: the run cannot proceed at all (input
//!   table missing, output not writable, bad configuration, PDF engine
//!   unavailable). Returned as `Err(HarvestError)` from the top-level
//!   entry points.
//!
//! * [`AttemptError`] — **Transient**: one fetch attempt for one URL failed
//!   (network, timeout, HTTP status, garbage payload). The fetcher logs it
//!   and retries.
//!
//! * [`DocumentError`] — **Non-fatal**: every attempt for one URL failed.
//!   Stored inside [`crate::output::UrlOutcome`]; the run moves on to the
//!   next URL and that URL simply contributes no records.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the uscode-cite library.
#[derive(Debug, Error)]
pub enum HarvestError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input spreadsheet was not found at the given path.
    #[error("URL list not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// The input file exists but could not be opened as a spreadsheet.
    #[error("Cannot read URL list '{path}': {detail}")]
    InputUnreadable { path: PathBuf, detail: String },

    /// The workbook has no worksheet, or the first worksheet has no rows.
    #[error("URL list '{path}' contains no rows")]
    EmptyTable { path: PathBuf },

    /// The header row does not contain the expected URL column.
    #[error("URL list '{path}' has no '{column}' column in its header row")]
    MissingColumn { path: PathBuf, column: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create, write or rename the output spreadsheet.
    #[error("Failed to write results to '{path}': {detail}")]
    OutputWriteFailed { path: PathBuf, detail: String },

    // ── Setup errors ──────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The shared HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single fetch attempt failed.
///
/// Every variant is retried the same way; the fetcher cannot tell a
/// truncated download from a resource that is genuinely not a PDF.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    /// Connection refused, DNS failure, reset mid-body, etc.
    #[error("network error: {detail}")]
    Network { detail: String },

    /// The request did not complete within the per-attempt timeout.
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    /// The payload does not start with the `%PDF` magic bytes.
    #[error("payload is not a PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// The payload looked like a PDF but the engine could not load it.
    #[error("malformed PDF: {detail}")]
    MalformedPdf { detail: String },

    /// The extraction itself broke down (engine unavailable, worker panicked).
    #[error("text extraction failed: {detail}")]
    Extraction { detail: String },
}

/// A non-fatal error for a single URL.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// Every fetch attempt failed.
    #[error("{url}: all {attempts} attempts failed; last error: {last_error}")]
    AllAttemptsFailed {
        url: String,
        attempts: u32,
        last_error: String,
    },
}
