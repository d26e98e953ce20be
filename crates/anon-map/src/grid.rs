//! Grid of job rows, one job per row, one parameter per column.

use std::io::Write;

use anon_model::{Parameter, ParameterKind, SourceIdentifier};
use tracing::debug;

use crate::dialect::{Dialect, sniff_dialect_safe};
use crate::error::{MapperError, Result};

const EMPTY_GRID_COLUMNS: [ParameterKind; 3] = [
    ParameterKind::Source,
    ParameterKind::PseudoName,
    ParameterKind::Description,
];

/// Rows of parameters. Rows may be sparse; on save every column present in
/// any row is written, and a row without that parameter gets an empty cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobParameterGrid {
    rows: Vec<Vec<Parameter>>,
}

impl JobParameterGrid {
    pub fn new(rows: Vec<Vec<Parameter>>) -> Self {
        Self { rows }
    }

    /// A grid showing each kind of source, for new users.
    pub fn example() -> Self {
        let row = |source: SourceIdentifier, name: &str, description: &str| {
            vec![
                Parameter::Source(source),
                Parameter::PseudoName(name.to_string()),
                Parameter::Description(description.to_string()),
            ]
        };
        Self::new(vec![
            row(
                SourceIdentifier::Folder(r"example\folder1".to_string()),
                "Patient1",
                "All files from folder1",
            ),
            row(
                SourceIdentifier::StudyInstanceUid("123.12121212.12345678".to_string()),
                "Patient2",
                "A study which should be retrieved from PACS, identified by StudyInstanceUID",
            ),
            row(
                SourceIdentifier::AccessionNumber("12345678.1234567".to_string()),
                "Patient3",
                "A study which should be retrieved from PACS, identified by AccessionNumber",
            ),
            row(
                SourceIdentifier::FileSelection(r"folder2\fileselection.txt".to_string()),
                "Patient4",
                "A selection of files in folder2",
            ),
        ])
    }

    pub fn rows(&self) -> &[Vec<Parameter>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn append_row(&mut self, row: Vec<Parameter>) {
        self.rows.push(row);
    }

    pub fn append_grid(&mut self, grid: JobParameterGrid) {
        self.rows.extend(grid.rows);
    }

    /// Every kind present in any row, in canonical order.
    pub fn parameter_kinds(&self) -> Vec<ParameterKind> {
        ParameterKind::ALL
            .into_iter()
            .filter(|kind| {
                self.rows
                    .iter()
                    .any(|row| row.iter().any(|param| param.kind() == *kind))
            })
            .collect()
    }

    /// Columns written on save. An empty grid gets the columns a user is
    /// expected to fill in.
    pub fn header_kinds(&self) -> Vec<ParameterKind> {
        if self.rows.is_empty() {
            return EMPTY_GRID_COLUMNS.to_vec();
        }
        self.parameter_kinds()
    }

    /// Number of columns written on save.
    pub fn width(&self) -> usize {
        self.header_kinds().len()
    }

    /// Parse CSV lines with a header row, sniffing the delimiter.
    pub fn load(lines: &[&str]) -> Result<Self> {
        let dialect = sniff_dialect_safe(lines, Dialect::default());
        Self::parse(lines, dialect)
    }

    /// Parse CSV lines with a header row.
    ///
    /// Empty cells become parameters with an empty value, fully empty rows
    /// are skipped. Values without a column header are an error.
    pub fn parse(lines: &[&str], dialect: Dialect) -> Result<Self> {
        let text = lines.join("\n");
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(dialect.delimiter())
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut records = reader.records();

        let header = records.next().ok_or(MapperError::MissingGridHeader)??;
        let mut columns: Vec<ParameterKind> = Vec::with_capacity(header.len());
        for name in header.iter().map(str::trim) {
            if name.is_empty() {
                break;
            }
            let kind = ParameterKind::from_field_name(name).ok_or_else(|| {
                MapperError::UnknownColumn {
                    column: name.to_string(),
                }
            })?;
            columns.push(kind);
        }
        if columns.is_empty() {
            return Err(MapperError::MissingGridHeader);
        }

        let mut rows = Vec::new();
        for (index, record) in records.enumerate() {
            let record = record?;
            // header is row 1
            let row_number = index + 2;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                debug!(row = row_number, "skipping empty grid row");
                continue;
            }
            let unlabeled: Vec<&str> = record
                .iter()
                .skip(columns.len())
                .filter(|cell| !cell.trim().is_empty())
                .collect();
            if !unlabeled.is_empty() {
                return Err(MapperError::GridRow {
                    row: row_number,
                    message: format!(
                        "Missing column header. Got values {unlabeled:?} beyond the {} \
                         headers {columns:?}. Which is which?",
                        columns.len()
                    ),
                });
            }
            let row = columns
                .iter()
                .enumerate()
                .map(|(position, kind)| {
                    let value = record.get(position).unwrap_or_default();
                    Parameter::of_kind(*kind, value).map_err(|err| MapperError::GridRow {
                        row: row_number,
                        message: err.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }
        debug!(rows = rows.len(), columns = columns.len(), "parsed parameter grid");
        Ok(Self { rows })
    }

    /// Write header and rows as CSV, each line padded to `width` fields.
    pub fn save<W: Write>(&self, writer: W, dialect: Dialect, width: usize) -> Result<()> {
        let kinds = self.header_kinds();
        let mut csv_writer = csv_writer(writer, dialect);

        let mut header: Vec<String> = kinds.iter().map(|kind| kind.field_name().to_string()).collect();
        header.resize(width.max(header.len()), String::new());
        csv_writer.write_record(&header)?;

        for row in &self.rows {
            let mut record: Vec<String> = kinds
                .iter()
                .map(|kind| {
                    row.iter()
                        .find(|param| param.kind() == *kind)
                        .map(Parameter::value)
                        .unwrap_or_default()
                })
                .collect();
            record.resize(width.max(record.len()), String::new());
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush().map_err(|source| MapperError::Write {
            location: "parameter grid".to_string(),
            source,
        })?;
        Ok(())
    }
}

pub(crate) fn csv_writer<W: Write>(writer: W, dialect: Dialect) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(dialect.delimiter())
        .terminator(csv::Terminator::CRLF)
        .flexible(true)
        .from_writer(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn test_empty_cells_become_empty_parameters() {
        let grid = JobParameterGrid::load(&lines(
            "source,patient_id,pims_key\nfolder:a,,\n,,\nfolder:b,002,\n",
        ))
        .unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.rows()[0][1], Parameter::PseudoId(String::new()));
        assert_eq!(grid.rows()[1][1], Parameter::PseudoId("002".to_string()));
    }

    #[test]
    fn test_short_rows_are_filled() {
        let grid = JobParameterGrid::parse(&lines("source;pseudo_name\nfolder:a"), Dialect::SEMICOLON)
            .unwrap();
        assert_eq!(grid.rows()[0].len(), 2);
    }

    #[test]
    fn test_missing_column_header() {
        let err = JobParameterGrid::load(&lines("source,patient_id\nfolder:a,1,extra\n")).unwrap_err();
        assert!(err.is_load_error());
        assert!(err.to_string().contains("Missing column header"));
    }

    #[test]
    fn test_unknown_source_key_is_load_error() {
        let err = JobParameterGrid::load(&lines("source,patient_id\nunknown:a,1\n")).unwrap_err();
        assert!(matches!(err, MapperError::GridRow { row: 2, .. }));
    }

    #[test]
    fn test_unknown_column() {
        let err = JobParameterGrid::load(&lines("source,shoe_size\nfolder:a,44\n")).unwrap_err();
        assert!(matches!(err, MapperError::UnknownColumn { .. }));
    }

    #[test]
    fn test_save_writes_union_of_columns() {
        let grid = JobParameterGrid::new(vec![
            vec![Parameter::Source(SourceIdentifier::Folder("a".to_string()))],
            vec![
                Parameter::PimsKey("1".to_string()),
                Parameter::Source(SourceIdentifier::Folder("b".to_string())),
            ],
        ]);
        let mut out = Vec::new();
        grid.save(&mut out, Dialect::COMMA, 3).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "source,pims_key,\r\nfolder:a,,\r\nfolder:b,1,\r\n");
    }

    #[test]
    fn test_empty_grid_keeps_a_header() {
        let mut out = Vec::new();
        JobParameterGrid::default()
            .save(&mut out, Dialect::SEMICOLON, 0)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "source;pseudo_name;description\r\n");
        let loaded = JobParameterGrid::parse(&lines(&text), Dialect::SEMICOLON).unwrap();
        assert!(loaded.is_empty());
    }
}
