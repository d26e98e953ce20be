//! Files holding rows of cells.

use std::fs;
use std::path::{Path, PathBuf};

use anon_map::{Dialect, decode_text, sniff_dialect_safe};
use calamine::{Data, Range, Reader, Xlsx, XlsxError, open_workbook};
use tracing::debug;

use crate::error::{InputFileError, Result};

/// One row of cells. `None` is a cell that holds nothing at all, as opposed
/// to an empty string.
pub type Row = Vec<Option<String>>;

/// Something that can be read as rows of cells.
pub trait TabularFile {
    /// Name used in messages.
    fn name(&self) -> String;

    /// All rows, top to bottom.
    fn rows(&self) -> Result<Vec<Row>>;

    /// Number shown to a user for the row directly below the header. Rows
    /// further down count up from there.
    fn row_offset(&self) -> usize;
}

/// Comma or semicolon separated file. The delimiter is sniffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    path: PathBuf,
    row_offset: usize,
}

impl CsvFile {
    /// Data rows are counted from 1, starting below the header.
    pub const DEFAULT_ROW_OFFSET: usize = 1;

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            row_offset: Self::DEFAULT_ROW_OFFSET,
        }
    }

    pub fn with_row_offset(mut self, row_offset: usize) -> Self {
        self.row_offset = row_offset;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_text(&self) -> Result<String> {
        let bytes = fs::read(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                InputFileError::FileNotFound {
                    path: self.path.clone(),
                }
            } else {
                InputFileError::FileRead {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;
        Ok(decode_text(&bytes).into_owned())
    }
}

impl TabularFile for CsvFile {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn rows(&self) -> Result<Vec<Row>> {
        let text = self.read_text()?;
        let lines: Vec<&str> = text.lines().collect();
        let dialect = sniff_dialect_safe(&lines, Dialect::default());
        debug!(path = %self.path.display(), %dialect, "reading input file");

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(dialect.delimiter())
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        reader
            .records()
            .map(|record| {
                record
                    .map(|record| record.iter().map(|cell| Some(cell.to_string())).collect())
                    .map_err(|source| InputFileError::Csv {
                        path: self.path.clone(),
                        source,
                    })
            })
            .collect()
    }

    fn row_offset(&self) -> usize {
        self.row_offset
    }
}

/// Rows already in memory, for example copied from a spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    name: String,
    rows: Vec<Row>,
    row_offset: usize,
}

impl Table {
    /// The row below the header is row 2, as a spreadsheet program shows it
    /// when the header is in row 1.
    pub const DEFAULT_ROW_OFFSET: usize = 2;

    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
            row_offset: Self::DEFAULT_ROW_OFFSET,
        }
    }

    /// Table from rows of string cells, none of them null.
    pub fn from_strings<S: AsRef<str>>(name: impl Into<String>, rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| Some(cell.as_ref().to_string())).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn with_row_offset(mut self, row_offset: usize) -> Self {
        self.row_offset = row_offset;
        self
    }
}

impl TabularFile for Table {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn rows(&self) -> Result<Vec<Row>> {
        Ok(self.rows.clone())
    }

    fn row_offset(&self) -> usize {
        self.row_offset
    }
}

/// First sheet of an Excel workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XlsxFile {
    path: PathBuf,
    row_offset: usize,
}

impl XlsxFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            row_offset: Table::DEFAULT_ROW_OFFSET,
        }
    }

    pub fn with_row_offset(mut self, row_offset: usize) -> Self {
        self.row_offset = row_offset;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spreadsheet_error(&self, source: XlsxError) -> InputFileError {
        match source {
            XlsxError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                InputFileError::FileNotFound {
                    path: self.path.clone(),
                }
            }
            source => InputFileError::Spreadsheet {
                path: self.path.clone(),
                source,
            },
        }
    }
}

impl TabularFile for XlsxFile {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn rows(&self) -> Result<Vec<Row>> {
        let mut workbook: Xlsx<_> =
            open_workbook(&self.path).map_err(|e| self.spreadsheet_error(e))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| InputFileError::NoSheet {
                path: self.path.clone(),
            })?
            .map_err(|e| self.spreadsheet_error(e))?;
        debug!(path = %self.path.display(), size = ?range.get_size(), "reading first sheet");
        Ok(rows_from_range(&range))
    }

    fn row_offset(&self) -> usize {
        self.row_offset
    }
}

/// Cells of a sheet as rows. Rows and columns before the used range are
/// included as empty so positions match the sheet.
fn rows_from_range(range: &Range<Data>) -> Vec<Row> {
    let (first_row, first_column) = range.start().unwrap_or((0, 0));
    let leading_cells = first_column as usize;
    let mut rows: Vec<Row> = vec![Vec::new(); first_row as usize];
    rows.extend(range.rows().map(|cells| {
        std::iter::repeat_n(None, leading_cells)
            .chain(cells.iter().map(cell_text))
            .collect()
    }));
    rows
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Open `path` as a tabular file, chosen by extension.
pub fn as_tabular_file(path: impl AsRef<Path>) -> Result<Box<dyn TabularFile>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match extension.as_str() {
        "csv" | "txt" => Ok(Box::new(CsvFile::new(path))),
        "xlsx" | "xlsm" => Ok(Box::new(XlsxFile::new(path))),
        _ => Err(InputFileError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_file_rows_with_semicolons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        fs::write(&path, "Accession Number;Pseudonym\n1234.5;patient1\n").unwrap();

        let rows = CsvFile::new(&path).rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![Some("1234.5".to_string()), Some("patient1".to_string())]);
    }

    #[test]
    fn test_missing_csv_file() {
        let err = CsvFile::new("/does/not/exist.csv").rows().unwrap_err();
        assert!(matches!(err, InputFileError::FileNotFound { .. }));
    }

    #[test]
    fn test_as_tabular_file_by_extension() {
        assert!(as_tabular_file("input.CSV").is_ok());
        assert_eq!(as_tabular_file("input.xlsx").unwrap().row_offset(), 2);
        let err = as_tabular_file("input.ods").err().unwrap();
        assert!(matches!(
            err,
            InputFileError::UnsupportedFormat { ref extension, .. } if extension == "ods"
        ));
    }

    #[test]
    fn test_sheet_rows_keep_their_position() {
        let mut range = Range::new((2, 1), (4, 2));
        range.set_value((2, 1), Data::String("Accession Number".to_string()));
        range.set_value((2, 2), Data::String("Pseudonym".to_string()));
        range.set_value((3, 1), Data::Float(12345678.0));
        range.set_value((3, 2), Data::String("p1".to_string()));

        let rows = rows_from_range(&range);
        assert_eq!(rows.len(), 5);
        assert!(rows[0].is_empty());
        assert_eq!(
            rows[3],
            vec![None, Some("12345678".to_string()), Some("p1".to_string())]
        );
        assert_eq!(rows[4], vec![None, None, None]);
    }

    #[test]
    fn test_missing_xlsx_file() {
        let err = XlsxFile::new("/does/not/exist.xlsx").rows().unwrap_err();
        assert!(matches!(err, InputFileError::FileNotFound { .. }));
    }

    #[test]
    fn test_xlsx_that_is_not_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.xlsx");
        fs::write(&path, "Accession Number,Pseudonym\n").unwrap();
        let err = XlsxFile::new(&path).rows().unwrap_err();
        assert!(matches!(err, InputFileError::Spreadsheet { .. }));
    }
}
