use std::borrow::Cow;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::models::RawRecord;

pub const COL_PRINCIPAL_NAME: &str = "User principal name";
pub const COL_LICENSES: &str = "Licenses";
pub const COL_BLOCK_CREDENTIAL: &str = "Block credential";
pub const COL_DISPLAY_NAME: &str = "Display name";

/// Columns without which no aggregate can be computed.
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_PRINCIPAL_NAME, COL_LICENSES, COL_BLOCK_CREDENTIAL];

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Supported export formats, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    pub fn detect(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            _ => Err(LoadError::UnsupportedFormat(ext)),
        }
    }
}

/// Header row plus string cells, before column lookup.
#[derive(Debug, Default)]
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Load an account export and map it onto [`RawRecord`]s.
///
/// Fails with [`LoadError::MissingRequiredColumns`] before returning any row
/// if one of [`REQUIRED_COLUMNS`] is absent.
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>, LoadError> {
    let format = FileFormat::detect(path)?;
    info!(path = %path.display(), ?format, "loading account export");

    let table = match format {
        FileFormat::Csv => {
            let bytes = std::fs::read(path)?;
            let content = String::from_utf8_lossy(&bytes);
            if let Cow::Owned(_) = content {
                warn!(path = %path.display(), "export is not valid UTF-8; invalid bytes replaced");
            }
            read_csv(&content)?
        }
        FileFormat::Xlsx => read_xlsx(path)?,
    };

    into_records(table)
}

/// Pick the candidate delimiter that occurs most often, outside quotes, in
/// the header line. Falls back to `,`.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let header = sample.lines().next().unwrap_or("");
    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;

    for b in header.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|d| *d == b) {
            counts[i] += 1;
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    CANDIDATE_DELIMITERS[best]
}

fn read_csv(content: &str) -> Result<Table, LoadError> {
    let delimiter = sniff_delimiter(content);
    debug!(delimiter = %(delimiter as char).escape_default(), "sniffed csv delimiter");

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

fn read_xlsx(path: &Path) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::EmptyWorkbook)??;

    let mut rows = range.rows().map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
    let headers = rows.next().unwrap_or_default();
    Ok(Table {
        headers,
        rows: rows.collect(),
    })
}

/// Render a spreadsheet cell the way it would read in a CSV export, so the
/// same block-flag normalization applies to both formats.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').to_string()
}

fn into_records(table: Table) -> Result<Vec<RawRecord>, LoadError> {
    let headers: Vec<String> = table.headers.iter().map(|h| normalize_header(h)).collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let (upn_col, lic_col, block_col) = match (
        column(COL_PRINCIPAL_NAME),
        column(COL_LICENSES),
        column(COL_BLOCK_CREDENTIAL),
    ) {
        (Some(upn), Some(lic), Some(block)) => (upn, lic, block),
        _ => {
            let missing = REQUIRED_COLUMNS
                .iter()
                .filter(|c| column(**c).is_none())
                .map(|c| c.to_string())
                .collect();
            return Err(LoadError::MissingRequiredColumns(missing));
        }
    };
    let name_col = column(COL_DISPLAY_NAME);
    if name_col.is_none() {
        warn!("no '{}' column, falling back to principal names", COL_DISPLAY_NAME);
    }

    let cell = |row: &[String], idx: usize| -> Option<String> {
        row.get(idx)
            .map(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        if row.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let principal_name = cell(row, upn_col).unwrap_or_default();
        if principal_name.is_empty() {
            warn!("row without a principal name");
        }
        let display_name = name_col
            .and_then(|i| cell(row, i))
            .unwrap_or_else(|| principal_name.clone());

        records.push(RawRecord {
            principal_name,
            display_name,
            licenses: cell(row, lic_col),
            block_credential: cell(row, block_col),
        });
    }

    debug!(rows = records.len(), "loaded account rows");
    Ok(records)
}
