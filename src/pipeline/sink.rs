//! Result table writing.
//!
//! The workbook is rendered into a temporary file next to the destination
//! and then renamed over it, so an interrupted run never leaves a truncated
//! spreadsheet behind. An empty result set still produces a file with just
//! the header row.

use crate::error::HarvestError;
use crate::output::ResultRecord;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Write `records` as a two-column sheet: `url_header`, `citation_header`.
pub fn write_records(
    path: &Path,
    records: &[ResultRecord],
    url_header: &str,
    citation_header: &str,
) -> Result<(), HarvestError> {
    let write_failed = |detail: String| HarvestError::OutputWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let mut workbook = build_workbook(records, url_header, citation_header)
        .map_err(|e| write_failed(e.to_string()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| write_failed(e.to_string()))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_failed(e.to_string()))?;
    workbook
        .save_to_writer(&mut tmp)
        .map_err(|e| write_failed(e.to_string()))?;
    tmp.persist(path)
        .map_err(|e| write_failed(e.error.to_string()))?;

    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

fn build_workbook(
    records: &[ResultRecord],
    url_header: &str,
    citation_header: &str,
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    sheet.write_string_with_format(0, 0, url_header, &header)?;
    sheet.write_string_with_format(0, 1, citation_header, &header)?;

    for (i, record) in records.iter().enumerate() {
        let row = u32::try_from(i + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        sheet.write_string(row, 0, record.url.as_str())?;
        sheet.write_string(row, 1, record.citation.as_str())?;
    }

    sheet.set_column_width(0, 60)?;
    sheet.set_column_width(1, 28)?;
    Ok(workbook)
}
