//! # uscode-cite
//!
//! Harvest U.S. Code citations from a spreadsheet of PDF URLs.
//!
//! Given a workbook whose `URL` column lists PDF documents, download each
//! one, pull out its text layer, find every `Title N, Section M` reference,
//! and write a `(URL, U.S. Code Citation)` table.
//!
//! ## Pipeline Overview
//!
//! ```text
//! url-list.xlsx
//!  │
//!  ├─ 1. Source   read the URL column (calamine)
//!  ├─ 2. Fetch    GET with browser User-Agent, 3 attempts, 2–5 s backoff
//!  ├─ 3. Extract  concatenate page text (pdfium)
//!  ├─ 4. Scan     distinct "Title N, Section M" matches (regex)
//!  └─ 5. Sink     USCode-from-URL-list.xlsx (rust_xlsxwriter)
//! ```
//!
//! URLs are processed one at a time with a random 5–10 s pause before each,
//! to stay polite to the document hosts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use uscode_cite::{harvest_to_file, HarvestConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarvestConfig::default();
//!     let output = harvest_to_file("url-list.xlsx", "USCode-from-URL-list.xlsx", &config).await?;
//!     eprintln!("{} citations from {} URLs",
//!         output.stats.total_records,
//!         output.stats.total_urls);
//!     Ok(())
//! }
//! ```
//!
//! ## Scanning text directly
//!
//! ```rust
//! use uscode_cite::CitationScanner;
//!
//! let found = CitationScanner::default()
//!     .scan("See Title 5, Section 552 and title 5,section 552 for details.");
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].to_string(), "Title 5, Section 552");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `uscode-cite` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod harvest;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    DelayRange, HarvestConfig, HarvestConfigBuilder, BROWSER_USER_AGENT, DEFAULT_INPUT_FILE,
    DEFAULT_OUTPUT_FILE,
};
pub use error::{AttemptError, DocumentError, HarvestError};
pub use harvest::{harvest_sync, harvest_to_file, harvest_urls_to_file, Harvester};
pub use output::{HarvestOutput, HarvestStats, ResultRecord, UrlOutcome};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::fetch::{FetchResult, HttpTransport, Transport};
pub use pipeline::pace::{Pacer, Sleeper, TokioSleeper};
pub use pipeline::scan::{Citation, CitationPattern, CitationScanner, US_CODE_PATTERN};
pub use progress::{HarvestProgressCallback, NoopProgressCallback, ProgressCallback};
