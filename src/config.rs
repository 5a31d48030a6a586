//! Configuration types for a citation-harvesting run.
//!
//! All run behaviour is controlled through [`HarvestConfig`], built via its
//! [`HarvestConfigBuilder`]. Every knob has a default equal to the fixed
//! behaviour of the standalone tool, so `HarvestConfig::default()` reproduces
//! a bare `uscode-cite` invocation exactly.

use crate::error::HarvestError;
use crate::pipeline::scan::CitationPattern;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Input spreadsheet read when no path is given.
pub const DEFAULT_INPUT_FILE: &str = "url-list.xlsx";

/// Output spreadsheet written when no path is given.
pub const DEFAULT_OUTPUT_FILE: &str = "USCode-from-URL-list.xlsx";

/// Header of the input column holding document URLs.
pub const DEFAULT_URL_COLUMN: &str = "URL";

/// Header of the output column holding citations.
pub const DEFAULT_CITATION_COLUMN: &str = "U.S. Code Citation";

/// Desktop Chrome identification sent with every request.
///
/// Several government document hosts answer 403 to anything that does not
/// look like a browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// Configuration for a harvesting run.
///
/// # Example
/// ```rust
/// use uscode_cite::{DelayRange, HarvestConfig};
///
/// let config = HarvestConfig::builder()
///     .max_attempts(5)
///     .request_timeout_secs(10)
///     .throttle_delay(DelayRange::none())
///     .seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_attempts, 5);
/// ```
#[derive(Clone)]
pub struct HarvestConfig {
    /// Total fetch attempts per URL, including the first. Default: 3.
    pub max_attempts: u32,

    /// Per-attempt HTTP timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Pause after each failed attempt. Default: uniform 2–5 s.
    pub retry_delay: DelayRange,

    /// Pause before every URL is fetched. Default: uniform 5–10 s.
    ///
    /// Keeps the request rate low enough that hosts do not flag the run as
    /// automated traffic.
    pub throttle_delay: DelayRange,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Header of the input column holding URLs. Default: `URL`.
    pub url_column: String,

    /// Header of the output citation column. Default: `U.S. Code Citation`.
    pub citation_column: String,

    /// Pattern the scanner applies to document text.
    pub pattern: CitationPattern,

    /// Seed for the delay random source. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Optional per-URL progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            request_timeout_secs: 30,
            retry_delay: DelayRange::from_secs(2, 5),
            throttle_delay: DelayRange::from_secs(5, 10),
            user_agent: BROWSER_USER_AGENT.to_string(),
            url_column: DEFAULT_URL_COLUMN.to_string(),
            citation_column: DEFAULT_CITATION_COLUMN.to_string(),
            pattern: CitationPattern::default(),
            seed: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("max_attempts", &self.max_attempts)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry_delay", &self.retry_delay)
            .field("throttle_delay", &self.throttle_delay)
            .field("user_agent", &self.user_agent)
            .field("url_column", &self.url_column)
            .field("citation_column", &self.citation_column)
            .field("pattern", &self.pattern.as_str())
            .field("seed", &self.seed)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn HarvestProgressCallback>"),
            )
            .finish()
    }
}

impl HarvestConfig {
    /// Create a new builder for `HarvestConfig`.
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`HarvestConfig`].
#[derive(Debug)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn retry_delay(mut self, range: DelayRange) -> Self {
        self.config.retry_delay = range;
        self
    }

    pub fn throttle_delay(mut self, range: DelayRange) -> Self {
        self.config.throttle_delay = range;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn url_column(mut self, name: impl Into<String>) -> Self {
        self.config.url_column = name.into();
        self
    }

    pub fn citation_column(mut self, name: impl Into<String>) -> Self {
        self.config.citation_column = name.into();
        self
    }

    pub fn pattern(mut self, pattern: CitationPattern) -> Self {
        self.config.pattern = pattern;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<HarvestConfig, HarvestError> {
        let c = &self.config;
        if c.max_attempts == 0 {
            return Err(HarvestError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        if c.request_timeout_secs == 0 {
            return Err(HarvestError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        for (name, range) in [("retry", &c.retry_delay), ("throttle", &c.throttle_delay)] {
            if range.min_ms > range.max_ms {
                return Err(HarvestError::InvalidConfig(format!(
                    "{name} delay minimum ({}ms) exceeds maximum ({}ms)",
                    range.min_ms, range.max_ms
                )));
            }
        }
        if c.url_column.trim().is_empty() || c.citation_column.trim().is_empty() {
            return Err(HarvestError::InvalidConfig(
                "column names must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Delay range ──────────────────────────────────────────────────────────

/// Closed range of milliseconds a random delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self::from_millis(min * 1000, max * 1000)
    }

    /// A range that always yields zero: no pause at all.
    pub const fn none() -> Self {
        Self::from_millis(0, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.max_ms == 0
    }

    /// Draw a uniformly distributed delay from the range.
    ///
    /// An inverted range (rejected by the builder, but constructible by hand)
    /// yields its `min_ms`.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.u64(self.min_ms..=self.max_ms))
    }
}
