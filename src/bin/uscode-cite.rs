//! CLI binary for uscode-cite.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `HarvestConfig` and prints results. With no arguments it reads
//! `url-list.xlsx` and writes `USCode-from-URL-list.xlsx` in the current
//! directory.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uscode_cite::pipeline::source::load_urls;
use uscode_cite::{
    harvest_urls_to_file, DelayRange, HarvestConfig, HarvestProgressCallback, ProgressCallback,
    DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_FILE,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the URL list plus a log line
/// per URL and per failed attempt.
///
/// The bar stays undrawn until the run starts.
struct CliProgressCallback {
    bar: ProgressBar,
    failures: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: ProgressBar::new(0),
            failures: AtomicUsize::new(0),
        })
    }

    /// Tear the bar down when the run ends in a fatal error.
    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl HarvestProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_urls: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} URLs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_urls as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Harvesting");
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_url_start(&self, index: usize, _total: usize, url: &str) {
        self.bar.set_message(format!("#{index} {url}"));
    }

    fn on_attempt_failed(&self, index: usize, url: &str, attempt: u32, max: u32, error: &str) {
        self.bar.println(format!(
            "  {} {:>3}      {}  {}",
            yellow("↻"),
            index,
            url,
            yellow(&format!("attempt {attempt}/{max} failed: {error}")),
        ));
    }

    fn on_url_complete(&self, index: usize, total: usize, url: &str, citations: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            url,
            dim(&format!("{citations} citations")),
        ));
        self.bar.inc(1);
    }

    fn on_url_failed(&self, index: usize, total: usize, url: &str, error: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            url,
            red(error),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_urls: usize, total_records: usize) {
        self.bar.finish_and_clear();
        let failed = self.failures.load(Ordering::SeqCst);
        eprintln!(
            "{} {} URLs processed, {} failed, {} citations",
            if failed == 0 { green("✔") } else { red("⚠") },
            bold(&total_urls.to_string()),
            failed,
            bold(&total_records.to_string()),
        );
    }
}

/// Harvest U.S. Code citations from a spreadsheet of PDF URLs.
#[derive(Parser, Debug)]
#[command(
    name = "uscode-cite",
    version,
    about = "Harvest \"Title N, Section M\" citations from a spreadsheet of PDF URLs",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Spreadsheet whose `URL` column lists the PDFs to scan.
    #[arg(short, long, env = "USCODE_CITE_INPUT", default_value = DEFAULT_INPUT_FILE)]
    input: PathBuf,

    /// Where to write the (URL, citation) table.
    #[arg(short, long, env = "USCODE_CITE_OUTPUT", default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Fetch attempts per URL.
    #[arg(long, env = "USCODE_CITE_ATTEMPTS", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..))]
    attempts: u32,

    /// Per-attempt HTTP timeout in seconds.
    #[arg(long, env = "USCODE_CITE_TIMEOUT", default_value_t = 30,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Seed for the random delays (reproducible pacing).
    #[arg(long, env = "USCODE_CITE_SEED")]
    seed: Option<u64>,

    /// Skip the throttle and backoff pauses. Only for hosts you control.
    #[arg(long, env = "USCODE_CITE_NO_DELAY")]
    no_delay: bool,

    /// Print the full run result as JSON on stdout.
    #[arg(long, env = "USCODE_CITE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "USCODE_CITE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "USCODE_CITE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "USCODE_CITE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries per-URL and per-attempt feedback through the
    // callback; library INFO/WARN logs would interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(&cli, progress.clone().map(|p| p as ProgressCallback))?;

    // ── Read the URL list ────────────────────────────────────────────────
    // A missing or malformed input table stops the run before anything is
    // downloaded.
    let urls = match read_urls(&cli, &config) {
        Ok(urls) => urls,
        Err(e) => {
            if let Some(ref p) = progress {
                p.abandon();
            }
            return Err(e);
        }
    };
    if !cli.quiet {
        eprintln!(
            "{} URLs to process from {}",
            bold(&urls.len().to_string()),
            cli.input.display()
        );
    }

    // ── Ensure PDFium engine is available ───────────────────────────────
    // First run downloads the library (~30 MB) into the user cache dir.
    if !pdfium_auto::is_pdfium_cached() {
        download_pdfium(cli.quiet).await?;
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let output = match harvest_urls_to_file(&urls, &cli.output, &config).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(ref p) = progress {
                p.abandon();
            }
            return Err(e).context("Harvest failed");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        if !show_progress {
            eprintln!(
                "Processed {} URLs ({} failed), {} citations in {}ms",
                output.stats.total_urls,
                output.stats.failed_urls,
                output.stats.total_records,
                output.stats.total_duration_ms
            );
        }
        eprintln!("Results saved to {}", bold(&cli.output.display().to_string()));
    }

    Ok(())
}

/// Load and validate the URL column of the input table.
fn read_urls(cli: &Cli, config: &HarvestConfig) -> Result<Vec<String>> {
    load_urls(&cli.input, &config.url_column)
        .with_context(|| format!("Cannot read URL list from {}", cli.input.display()))
}

/// Fetch the PDFium library on the blocking pool, with a byte-level bar
/// unless `quiet`.
async fn download_pdfium(quiet: bool) -> Result<()> {
    let dl_bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        bar.set_prefix("PDF engine");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    };

    let bar = dl_bar.clone();
    let result = tokio::task::spawn_blocking(move || {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                bar.set_length(t);
            }
            bar.set_position(downloaded);
        }))
    })
    .await
    .context("PDFium download task panicked")?;

    match result {
        Ok(_) => {
            dl_bar.finish_with_message("ready ✓");
            Ok(())
        }
        Err(e) => {
            dl_bar.finish_and_clear();
            Err(e).context("Failed to download PDFium engine")
        }
    }
}

/// Map CLI args to `HarvestConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<HarvestConfig> {
    let mut builder = HarvestConfig::builder()
        .max_attempts(cli.attempts)
        .request_timeout_secs(cli.timeout);

    if cli.no_delay {
        builder = builder
            .retry_delay(DelayRange::none())
            .throttle_delay(DelayRange::none());
    }
    if let Some(seed) = cli.seed {
        builder = builder.seed(seed);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_fails_before_any_download() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("url-list.xlsx");
        let cli = Cli::parse_from(["uscode-cite", "-i", missing.to_str().unwrap(), "--no-delay"]);
        let config = build_config(&cli, None).unwrap();

        let err = read_urls(&cli, &config).unwrap_err();

        assert!(format!("{err:#}").contains("url-list.xlsx"), "got: {err:#}");
        assert!(!dir.path().join(DEFAULT_OUTPUT_FILE).exists());
    }

    #[test]
    fn abandon_clears_a_running_bar() {
        let cb = CliProgressCallback::new();
        cb.on_run_start(3);
        cb.on_url_start(1, 3, "https://a.gov/1.pdf");
        cb.on_attempt_failed(1, "https://a.gov/1.pdf", 1, 3, "HTTP 503");

        cb.abandon();

        assert!(cb.bar.is_finished());
    }

    #[test]
    fn abandon_before_the_run_starts_is_harmless() {
        let cb = CliProgressCallback::new();
        cb.abandon();
        assert!(cb.bar.is_finished());
    }
}
