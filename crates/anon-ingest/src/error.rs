//! Error types for reading input files.

use std::path::PathBuf;

use anon_model::ParameterError;
use thiserror::Error;

/// Errors that can occur while extracting parameters from an input file.
#[derive(Debug, Error)]
pub enum InputFileError {
    // === File System Errors ===
    /// Input file not found.
    #[error("input file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File type that cannot be read.
    #[error("cannot read '{path}': unsupported file type '{extension}', save it as .csv or .xlsx")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Failed to open an Excel workbook.
    #[error("failed to read workbook {path}: {source}")]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    /// The workbook has no sheets.
    #[error("workbook {path} has no sheets")]
    NoSheet { path: PathBuf },

    // === Parsing Errors ===
    /// Failed to parse CSV.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// No row contains any of the headers looked for.
    #[error("could not find any of the column headers {expected:?} in {file}")]
    NoHeaderRow {
        file: String,
        expected: Vec<String>,
    },

    /// The header row was found but a required column is not in it.
    #[error("required column '{column}' not found in {file}")]
    MissingColumn { column: String, file: String },

    /// Some of the matched columns have a value in this row, others do not.
    #[error(
        "Problem in row {row}. Columns {filled:?} have a value, but columns {empty:?} are \
         empty. What do you want?"
    )]
    RowParse {
        row: usize,
        filled: Vec<String>,
        empty: Vec<String>,
    },

    /// A cell could not be parsed into a parameter.
    #[error("error parsing {column} in row {row}: {source}")]
    Value {
        row: usize,
        column: String,
        #[source]
        source: ParameterError,
    },
}

impl InputFileError {
    /// Errors pointing at a specific row of the input.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::RowParse { row, .. } | Self::Value { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// Result type for input file operations.
pub type Result<T> = std::result::Result<T, InputFileError>;
