//! Document retrieval: download a URL and extract its text, with retries.
//!
//! ## Retry Strategy
//!
//! An attempt is one GET plus one extraction. Network errors, timeouts,
//! non-success statuses, non-PDF payloads and unparseable PDFs all fail the
//! attempt the same way: log it, pause for a random 2–5 s (configurable),
//! try again. After `max_attempts` failures the URL is given up on and the
//! caller receives an empty text with the error attached; nothing here ever
//! aborts the run.

use crate::config::HarvestConfig;
use crate::error::{AttemptError, DocumentError, HarvestError};
use crate::pipeline::extract::{extract_blocking, TextExtractor};
use crate::pipeline::pace::{Pacer, Sleeper};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Issues one GET and returns the response body.
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, AttemptError>> + Send;
}

/// [`Transport`] over one shared `reqwest::Client`.
///
/// Build it once per run: the client pools connections and keeps a cookie
/// jar across every URL it fetches.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| HarvestError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(AttemptError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify(e, self.timeout_secs))?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

fn classify(e: reqwest::Error, timeout_secs: u64) -> AttemptError {
    if e.is_timeout() {
        AttemptError::Timeout { secs: timeout_secs }
    } else {
        AttemptError::Network {
            detail: e.to_string(),
        }
    }
}

/// Reject payloads that do not start with `%PDF`.
///
/// Servers that block scrapers tend to answer 200 with an HTML page; this
/// turns that into a clean attempt failure before pdfium sees it.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), AttemptError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(AttemptError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Outcome of fetching one URL.
///
/// `text` is empty whenever `error` is set. A successful fetch of a PDF with
/// no text layer also has empty text but no error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub url: String,
    pub text: String,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub error: Option<DocumentError>,
}

impl FetchResult {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Download `url` and extract its text, retrying per `config`.
///
/// `on_attempt_failed(attempt, error)` is invoked for every failed attempt,
/// before the backoff pause, so callers can surface retries as they happen.
///
/// Always returns a `FetchResult`; total failure is reported through
/// `result.error` and logged, never propagated.
pub async fn fetch_text<T, E, S, F>(
    transport: &T,
    extractor: &Arc<E>,
    pacer: &mut Pacer<S>,
    url: &str,
    config: &HarvestConfig,
    mut on_attempt_failed: F,
) -> FetchResult
where
    T: Transport,
    E: TextExtractor,
    S: Sleeper,
    F: FnMut(u32, &AttemptError),
{
    let mut last_err: Option<AttemptError> = None;

    for attempt in 1..=config.max_attempts {
        match attempt_once(transport, extractor, url).await {
            Ok(text) => {
                return FetchResult {
                    url: url.to_string(),
                    text,
                    attempts: attempt,
                    error: None,
                };
            }
            Err(e) => {
                warn!("Attempt {} failed for {}: {}", attempt, url, e);
                on_attempt_failed(attempt, &e);
                last_err = Some(e);
                pacer.pause(config.retry_delay, "retry backoff").await;
            }
        }
    }

    error!("All {} attempts failed for {}", config.max_attempts, url);

    FetchResult {
        url: url.to_string(),
        text: String::new(),
        attempts: config.max_attempts,
        error: Some(DocumentError::AllAttemptsFailed {
            url: url.to_string(),
            attempts: config.max_attempts,
            last_error: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
        }),
    }
}

async fn attempt_once<T, E>(
    transport: &T,
    extractor: &Arc<E>,
    url: &str,
) -> Result<String, AttemptError>
where
    T: Transport,
    E: TextExtractor,
{
    let bytes = transport.get(url).await?;
    check_pdf_magic(&bytes)?;
    extract_blocking(extractor, bytes).await
}
