//! Loading raw per-document records from the source files.
//!
//! News come as `.xlsx` or `.csv` tables with a header row; papers come as a JSON
//! export holding a list of objects. Both end up as [`RawRecord`]s in file order.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde_json::Value as Json;
use walkdir::WalkDir;

use crate::config::{NewsColumns, PaperFields};
use crate::error::{AnalysisError, Result};
use crate::office::read_xlsx_rows;

/// One source row before keyword extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub keywords: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub authors: Option<String>,
}

/// Collect `.xlsx` and `.csv` files under `path` (or `path` itself), sorted.
pub fn collect_news_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| matches!(extension(p).as_deref(), Some("xlsx") | Some("csv")))
        .collect();
    files.sort();
    files
}

fn extension(p: &Path) -> Option<String> {
    p.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Load news rows from every file, dropping rows whose category is excluded.
pub fn load_news(
    paths: &[PathBuf],
    columns: &NewsColumns,
    exclude_categories: &[String],
) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for input in paths {
        let files = collect_news_files(input);
        if files.is_empty() {
            return Err(AnalysisError::UnsupportedFile(input.clone()));
        }
        for file in files {
            let rows = read_table(&file)?;
            let loaded = rows.len();
            let kept = rows_to_records(&file, rows, columns, exclude_categories)?;
            info!(
                "{}: {} rows, {} excluded by category",
                file.display(),
                loaded.saturating_sub(1),
                loaded.saturating_sub(1) - kept.len()
            );
            records.extend(kept);
        }
    }
    Ok(records)
}

fn read_table(file: &Path) -> Result<Vec<Vec<String>>> {
    match extension(file).as_deref() {
        Some("xlsx") => read_xlsx_rows(file).map_err(AnalysisError::Xlsx),
        Some("csv") => read_csv_rows(file),
        _ => Err(AnalysisError::UnsupportedFile(file.to_path_buf())),
    }
}

fn read_csv_rows(file: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(file)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn rows_to_records(
    file: &Path,
    rows: Vec<Vec<String>>,
    columns: &NewsColumns,
    exclude_categories: &[String],
) -> Result<Vec<RawRecord>> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        warn!("{} is empty", file.display());
        return Ok(Vec::new());
    };
    let find = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
    };
    let keyword_col = find(&columns.keywords).ok_or_else(|| AnalysisError::MissingColumn {
        column: columns.keywords.clone(),
        path: file.to_path_buf(),
    })?;
    let category_col = find(&columns.category);
    let title_col = find(&columns.title);
    if category_col.is_none() && !exclude_categories.is_empty() {
        debug!(
            "{}: no {:?} column, category exclusion skipped",
            file.display(),
            columns.category
        );
    }

    let cell = |row: &[String], col: Option<usize>| -> Option<String> {
        col.and_then(|c| row.get(c))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut out = Vec::new();
    for row in rows {
        let category = cell(&row, category_col);
        if category
            .as_ref()
            .is_some_and(|c| exclude_categories.iter().any(|x| x == c))
        {
            continue;
        }
        out.push(RawRecord {
            keywords: cell(&row, Some(keyword_col)),
            title: cell(&row, title_col),
            category,
            authors: None,
        });
    }
    Ok(out)
}

/// Load paper records from a JSON export.
///
/// The keyword field may be missing, null, a string or another scalar; scalars are
/// stringified and anything else counts as missing.
pub fn load_papers(path: &Path, fields: &PaperFields) -> Result<Vec<RawRecord>> {
    let text = fs::read_to_string(path)?;
    let data: Json = serde_json::from_str(&text)?;
    let list = data
        .get(&fields.list)
        .and_then(Json::as_array)
        .ok_or_else(|| AnalysisError::MissingColumn {
            column: fields.list.clone(),
            path: path.to_path_buf(),
        })?;

    let records: Vec<RawRecord> = list
        .iter()
        .map(|item| RawRecord {
            keywords: scalar_text(item.get(&fields.keywords)),
            title: scalar_text(item.get(&fields.title)),
            category: None,
            authors: scalar_text(item.get(&fields.authors)),
        })
        .collect();
    info!("{}: {} paper records", path.display(), records.len());
    Ok(records)
}

fn scalar_text(value: Option<&Json>) -> Option<String> {
    match value? {
        Json::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
