//! Run orchestration: URL list in, citation table out.
//!
//! [`Harvester`] owns every collaborator of a run (HTTP client, PDF engine,
//! delay source, scanner) and walks the URL list strictly in order:
//!
//! ```text
//! for each URL:  throttle pause ──▶ fetch (retries) ──▶ scan ──▶ append records
//! ```
//!
//! A URL whose fetch fails outright contributes zero records; the run keeps
//! going. Nothing is written until the whole list has been processed, so an
//! interrupted run loses everything collected so far.

use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::output::{HarvestOutput, HarvestStats, ResultRecord, UrlOutcome};
use crate::pipeline::extract::{PdfiumExtractor, TextExtractor};
use crate::pipeline::fetch::{fetch_text, HttpTransport, Transport};
use crate::pipeline::pace::{Pacer, Sleeper, TokioSleeper};
use crate::pipeline::scan::CitationScanner;
use crate::pipeline::{sink, source};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Sequential citation harvester.
pub struct Harvester<T = HttpTransport, E = PdfiumExtractor, S = TokioSleeper> {
    transport: T,
    extractor: Arc<E>,
    pacer: Pacer<S>,
    scanner: CitationScanner,
    config: HarvestConfig,
}

impl Harvester {
    /// Build the production harvester: reqwest transport, pdfium extractor,
    /// wall-clock delays.
    ///
    /// Locating pdfium may download the library on first use; that work runs
    /// on the blocking pool.
    pub async fn from_config(config: HarvestConfig) -> Result<Self, HarvestError> {
        let transport = HttpTransport::new(&config)?;
        let extractor = PdfiumExtractor::prepare().await?;
        let pacer = Pacer::new(config.seed);
        Ok(Self::with_parts(config, transport, extractor, pacer))
    }
}

impl<T, E, S> Harvester<T, E, S>
where
    T: Transport,
    E: TextExtractor,
    S: Sleeper,
{
    /// Assemble a harvester from explicit collaborators.
    pub fn with_parts(config: HarvestConfig, transport: T, extractor: E, pacer: Pacer<S>) -> Self {
        let scanner = CitationScanner::new(config.pattern.clone());
        Self {
            transport,
            extractor: Arc::new(extractor),
            pacer,
            scanner,
            config,
        }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Process every URL in order and collect the results.
    pub async fn harvest(&mut self, urls: &[String]) -> HarvestOutput {
        let start = Instant::now();
        let total = urls.len();
        let cb = self.config.progress_callback.clone();

        if let Some(ref cb) = cb {
            cb.on_run_start(total);
        }

        let mut records = Vec::new();
        let mut outcomes = Vec::with_capacity(total);

        for (i, url) in urls.iter().enumerate() {
            let index = i + 1;
            info!("Processing {}", url);
            if let Some(ref cb) = cb {
                cb.on_url_start(index, total, url);
            }

            self.pacer
                .pause(self.config.throttle_delay, "pre-fetch throttle")
                .await;

            let max_attempts = self.config.max_attempts;
            let fetched = fetch_text(
                &self.transport,
                &self.extractor,
                &mut self.pacer,
                url,
                &self.config,
                |attempt, err| {
                    if let Some(ref cb) = cb {
                        cb.on_attempt_failed(index, url, attempt, max_attempts, &err.to_string());
                    }
                },
            )
            .await;

            let citations = if fetched.text.is_empty() {
                Vec::new()
            } else {
                self.scanner.scan(&fetched.text)
            };
            debug!("{}: {} distinct citations", url, citations.len());

            records.extend(
                citations
                    .iter()
                    .map(|c| ResultRecord::new(url.as_str(), c.to_string())),
            );

            if let Some(ref cb) = cb {
                match &fetched.error {
                    None => cb.on_url_complete(index, total, url, citations.len()),
                    Some(e) => cb.on_url_failed(index, total, url, &e.to_string()),
                }
            }

            outcomes.push(UrlOutcome {
                url: url.clone(),
                attempts: fetched.attempts,
                citations,
                error: fetched.error,
            });
        }

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        let stats = HarvestStats {
            total_urls: total,
            fetched_urls: total - failed,
            failed_urls: failed,
            total_records: records.len(),
            total_duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Harvest complete: {}/{} URLs fetched, {} records, {}ms",
            stats.fetched_urls, total, stats.total_records, stats.total_duration_ms
        );

        if let Some(ref cb) = cb {
            cb.on_run_complete(total, records.len());
        }

        HarvestOutput {
            records,
            outcomes,
            stats,
        }
    }

    /// Load URLs from `input`, harvest them, and write the table to `output`.
    pub async fn harvest_file(
        &mut self,
        input: &Path,
        output: &Path,
    ) -> Result<HarvestOutput, HarvestError> {
        let urls = source::load_urls(input, &self.config.url_column)?;
        let result = self.harvest(&urls).await;
        sink::write_records(
            output,
            &result.records,
            &self.config.url_column,
            &self.config.citation_column,
        )?;
        Ok(result)
    }
}

/// Run the whole pipeline with production collaborators.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(HarvestError)` only for fatal errors: unreadable input table,
/// unwritable output, pdfium unavailable. Individual URL failures are
/// reported in [`HarvestOutput::outcomes`].
pub async fn harvest_to_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &HarvestConfig,
) -> Result<HarvestOutput, HarvestError> {
    let input = input.as_ref();
    let output = output.as_ref();
    info!("Starting harvest: {} → {}", input.display(), output.display());

    // Fail on a bad input table before binding pdfium or touching the network.
    let urls = source::load_urls(input, &config.url_column)?;
    harvest_urls_to_file(&urls, output, config).await
}

/// Harvest an already-loaded URL list and write the table to `output`.
///
/// Lets callers validate the input (and report on it) before pdfium is
/// located or downloaded.
pub async fn harvest_urls_to_file(
    urls: &[String],
    output: impl AsRef<Path>,
    config: &HarvestConfig,
) -> Result<HarvestOutput, HarvestError> {
    let output = output.as_ref();
    let mut harvester = Harvester::from_config(config.clone()).await?;
    let result = harvester.harvest(urls).await;
    sink::write_records(
        output,
        &result.records,
        &config.url_column,
        &config.citation_column,
    )?;
    Ok(result)
}

/// Synchronous wrapper around [`harvest_to_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn harvest_sync(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &HarvestConfig,
) -> Result<HarvestOutput, HarvestError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| HarvestError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(harvest_to_file(input, output, config))
}
