//! Progress-callback trait for per-URL harvesting events.
//!
//! Inject an [`Arc<dyn HarvestProgressCallback>`] via
//! [`crate::config::HarvestConfigBuilder::progress_callback`] to receive
//! events as the run works through its URL list. The CLI uses this to drive
//! its progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use uscode_cite::{HarvestConfig, HarvestProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     citations: AtomicUsize,
//! }
//!
//! impl HarvestProgressCallback for CountingCallback {
//!     fn on_url_complete(&self, _index: usize, _total: usize, url: &str, citations: usize) {
//!         self.citations.fetch_add(citations, Ordering::SeqCst);
//!         eprintln!("{url}: {citations} citations");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { citations: AtomicUsize::new(0) });
//!
//! let config = HarvestConfig::builder()
//!     .progress_callback(counter as Arc<dyn HarvestProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each URL.
///
/// URLs are processed one at a time, so events arrive strictly in order,
/// but the trait is `Send + Sync` so a callback can be shared with other
/// threads (a UI, a logger). All methods default to no-ops.
pub trait HarvestProgressCallback: Send + Sync {
    /// Called once before the first URL.
    fn on_run_start(&self, total_urls: usize) {
        let _ = total_urls;
    }

    /// Called before the throttling pause for a URL.
    ///
    /// `index` is 1-based.
    fn on_url_start(&self, index: usize, total_urls: usize, url: &str) {
        let _ = (index, total_urls, url);
    }

    /// Called after each failed fetch attempt, before the backoff pause.
    ///
    /// Fires for attempts that are later recovered from as well as for the
    /// final one; `attempt` is 1-based.
    fn on_attempt_failed(
        &self,
        index: usize,
        url: &str,
        attempt: u32,
        max_attempts: u32,
        error: &str,
    ) {
        let _ = (index, url, attempt, max_attempts, error);
    }

    /// Called when a URL was fetched, with the number of distinct citations.
    fn on_url_complete(&self, index: usize, total_urls: usize, url: &str, citations: usize) {
        let _ = (index, total_urls, url, citations);
    }

    /// Called when every fetch attempt for a URL failed.
    fn on_url_failed(&self, index: usize, total_urls: usize, url: &str, error: &str) {
        let _ = (index, total_urls, url, error);
    }

    /// Called once after the last URL, before the output table is written.
    fn on_run_complete(&self, total_urls: usize, total_records: usize) {
        let _ = (total_urls, total_records);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl HarvestProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::HarvestConfig`].
pub type ProgressCallback = Arc<dyn HarvestProgressCallback>;
