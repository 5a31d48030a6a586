//! Result types produced by a harvesting run.

use crate::error::DocumentError;
use crate::pipeline::scan::Citation;
use serde::{Deserialize, Serialize};

/// One row of the output table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub url: String,
    /// Canonical citation text, e.g. `Title 5, Section 552`.
    pub citation: String,
}

impl ResultRecord {
    pub fn new(url: impl Into<String>, citation: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            citation: citation.into(),
        }
    }
}

/// What happened to one input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlOutcome {
    pub url: String,
    /// Fetch attempts made (1 on first-try success).
    pub attempts: u32,
    /// Distinct citations found, in first-occurrence order.
    pub citations: Vec<Citation>,
    /// Set when every attempt failed.
    pub error: Option<DocumentError>,
}

impl UrlOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestStats {
    pub total_urls: usize,
    pub fetched_urls: usize,
    pub failed_urls: usize,
    pub total_records: usize,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestOutput {
    /// Output table rows in processing order.
    pub records: Vec<ResultRecord>,
    /// One entry per processed URL, in input order.
    pub outcomes: Vec<UrlOutcome>,
    pub stats: HarvestStats,
}
