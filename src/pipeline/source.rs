//! URL list loading: read one named column from the first worksheet.
//!
//! Any workbook format calamine understands is accepted (`.xlsx`, `.xls`,
//! `.xlsb`, `.ods`). The first row is the header. Blank cells, whitespace-only
//! cells and rows too short to reach the URL column are dropped; everything
//! else is kept in sheet order, trimmed. Numeric or date cells are kept as
//! their display text and will simply fail to fetch.

use crate::error::HarvestError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::{debug, info};

/// Load the URL list from the spreadsheet at `path`.
///
/// Every failure here is fatal: with no URL list there is nothing to do.
pub fn load_urls(path: &Path, column: &str) -> Result<Vec<String>, HarvestError> {
    if !path.exists() {
        return Err(HarvestError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| HarvestError::InputUnreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| HarvestError::EmptyTable {
            path: path.to_path_buf(),
        })?
        .map_err(|e| HarvestError::InputUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let urls = urls_from_range(&range, column).map_err(|e| match e {
        ColumnError::NoRows => HarvestError::EmptyTable {
            path: path.to_path_buf(),
        },
        ColumnError::NoSuchColumn => HarvestError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        },
    })?;

    info!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ColumnError {
    NoRows,
    NoSuchColumn,
}

/// Pull the non-empty cells of the `column` column out of a sheet range.
pub(crate) fn urls_from_range(range: &Range<Data>, column: &str) -> Result<Vec<String>, ColumnError> {
    let mut rows = range.rows();
    let header = rows.next().ok_or(ColumnError::NoRows)?;

    let col = header
        .iter()
        .position(|cell| cell_text(cell).as_deref() == Some(column))
        .ok_or(ColumnError::NoSuchColumn)?;

    let mut urls = Vec::new();
    let mut skipped = 0usize;
    for row in rows {
        match row.get(col).and_then(cell_text) {
            Some(url) => urls.push(url),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} rows with an empty '{}' cell", skipped, column);
    }
    Ok(urls)
}

/// Trimmed display text of a cell, or `None` for blank and error cells.
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
