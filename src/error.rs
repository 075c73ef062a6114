use thiserror::Error;

/// Failures that halt a run before any aggregate is computed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file format: {0:?} (expected .csv or .xlsx)")]
    UnsupportedFormat(String),

    #[error("file is missing required columns: {}", .0.join(", "))]
    MissingRequiredColumns(Vec<String>),

    #[error("workbook contains no worksheets")]
    EmptyWorkbook,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),
}
