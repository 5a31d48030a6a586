//! Pipeline integration tests: spreadsheet in, spreadsheet out, with the
//! network and PDF engine replaced by in-memory fakes.

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uscode_cite::{
    AttemptError, CitationScanner, DelayRange, DocumentError, HarvestConfig, HarvestError,
    Harvester, Pacer, Sleeper, TextExtractor, Transport,
};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Serves fixed bodies per URL; unknown URLs answer HTTP 404.
#[derive(Clone, Default)]
struct FakeWeb {
    pages: HashMap<String, Vec<u8>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeWeb {
    fn serve_pdf(mut self, url: &str, text: &str) -> Self {
        self.pages
            .insert(url.to_string(), format!("%PDF-1.7\n{text}").into_bytes());
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FakeWeb {
    async fn get(&self, url: &str) -> Result<Vec<u8>, AttemptError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or(AttemptError::HttpStatus { status: 404 })
    }
}

/// Everything after the first line of the payload is the document text.
struct FirstLineHeader;

impl TextExtractor for FirstLineHeader {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, AttemptError> {
        let text = String::from_utf8_lossy(bytes);
        Ok(text.split_once('\n').map(|(_, t)| t.to_string()).unwrap_or_default())
    }
}

#[derive(Clone, Default)]
struct CountingSleeper(Arc<Mutex<Vec<Duration>>>);

impl Sleeper for CountingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.0.lock().unwrap().push(duration);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn write_url_list(path: &Path, header: &str, urls: &[&str]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Notes").unwrap();
    sheet.write_string(0, 1, header).unwrap();
    for (i, url) in urls.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, format!("row {row}")).unwrap();
        if !url.is_empty() {
            sheet.write_string(row, 1, *url).unwrap();
        }
    }
    workbook.save(path).unwrap();
}

fn read_table(path: &Path) -> Vec<Vec<String>> {
    let mut wb = open_workbook_auto(path).unwrap();
    let range = wb.worksheet_range_at(0).unwrap().unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|c| match c {
                    Data::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

fn harvester(web: FakeWeb, sleeper: CountingSleeper) -> Harvester<FakeWeb, FirstLineHeader, CountingSleeper> {
    let config = HarvestConfig::builder().seed(2024).build().unwrap();
    Harvester::with_parts(config, web, FirstLineHeader, Pacer::with_sleeper(Some(2024), sleeper))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn scanner_collapses_case_and_spacing_variants() {
    let found = CitationScanner::default()
        .scan("See Title 5, Section 552 and title 5,section 552 for details.");
    let found: Vec<String> = found.iter().map(ToString::to_string).collect();
    assert_eq!(found, vec!["Title 5, Section 552"]);
}

#[tokio::test]
async fn one_success_one_total_failure_gives_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("url-list.xlsx");
    let output = dir.path().join("USCode-from-URL-list.xlsx");
    let url1 = "https://agency.gov/report.pdf";
    let url2 = "https://agency.gov/gone.pdf";
    write_url_list(&input, "URL", &[url1, url2]);

    let web = FakeWeb::default().serve_pdf(url1, "Authority: Title 5, Section 552.");
    let sleeper = CountingSleeper::default();
    let mut h = harvester(web.clone(), sleeper.clone());

    let result = h.harvest_file(&input, &output).await.unwrap();

    assert_eq!(
        read_table(&output),
        vec![
            vec!["URL".to_string(), "U.S. Code Citation".to_string()],
            vec![url1.to_string(), "Title 5, Section 552".to_string()],
        ]
    );
    assert_eq!(result.stats.failed_urls, 1);
    assert!(matches!(
        result.outcomes[1].error,
        Some(DocumentError::AllAttemptsFailed { attempts: 3, .. })
    ));
    // 1 request for url1, 3 for url2
    assert_eq!(web.requested().len(), 4);
    // 2 throttle pauses + 3 backoff pauses
    assert_eq!(sleeper.0.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn empty_url_rows_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("url-list.xlsx");
    let output = dir.path().join("out.xlsx");
    let urls = ["https://a.gov/1.pdf", "", "https://a.gov/2.pdf", "https://a.gov/3.pdf"];
    write_url_list(&input, "URL", &urls);

    let web = FakeWeb::default()
        .serve_pdf(urls[0], "Title 1, Section 1")
        .serve_pdf(urls[2], "nothing")
        .serve_pdf(urls[3], "Title 2, Section 2; TITLE 2 , SECTION 2");
    let mut h = harvester(web.clone(), CountingSleeper::default());

    let result = h.harvest_file(&input, &output).await.unwrap();

    assert_eq!(result.stats.total_urls, 3);
    assert_eq!(result.outcomes.len(), 3);
    assert_eq!(web.requested(), vec![urls[0], urls[2], urls[3]]);
    assert_eq!(result.stats.total_records, 2);
    assert_eq!(read_table(&output).len(), 3);
}

#[tokio::test]
async fn missing_url_column_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("url-list.xlsx");
    let output = dir.path().join("out.xlsx");
    write_url_list(&input, "Link", &["https://a.gov/1.pdf"]);

    let web = FakeWeb::default();
    let mut h = harvester(web.clone(), CountingSleeper::default());

    let err = h.harvest_file(&input, &output).await.unwrap_err();

    assert!(matches!(err, HarvestError::MissingColumn { .. }), "got: {err}");
    assert!(web.requested().is_empty());
    assert!(!output.exists());
}

#[tokio::test]
async fn missing_input_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harvester(FakeWeb::default(), CountingSleeper::default());

    let err = h
        .harvest_file(&dir.path().join("absent.xlsx"), &dir.path().join("out.xlsx"))
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::InputNotFound { .. }));
}

#[tokio::test]
async fn custom_columns_flow_through() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.xlsx");
    let output = dir.path().join("out.xlsx");
    write_url_list(&input, "Document", &["https://a.gov/1.pdf"]);

    let config = HarvestConfig::builder()
        .url_column("Document")
        .citation_column("Citation")
        .throttle_delay(DelayRange::none())
        .build()
        .unwrap();
    let web = FakeWeb::default().serve_pdf("https://a.gov/1.pdf", "Title 26, Section 501");
    let mut h = Harvester::with_parts(
        config,
        web,
        FirstLineHeader,
        Pacer::with_sleeper(None, CountingSleeper::default()),
    );

    h.harvest_file(&input, &output).await.unwrap();

    let table = read_table(&output);
    assert_eq!(table[0], vec!["Document", "Citation"]);
    assert_eq!(table[1][1], "Title 26, Section 501");
}
