//! Extracting a parameter grid from a tabular file.

use anon_map::JobParameterGrid;
use tracing::{debug, warn};

use crate::column::ColumnType;
use crate::error::{InputFileError, Result};
use crate::tabular::{Row, TabularFile};

/// A recognized column and its 0-based position in the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Column {
    column_type: ColumnType,
    index: usize,
}

impl Column {
    fn cell<'a>(&self, row: &'a Row) -> Option<&'a str> {
        row.get(self.index)
            .and_then(Option::as_deref)
            .filter(|cell| !cell.trim().is_empty())
    }
}

/// Known columns in `row`, in the order they appear. A column type found
/// twice is only used the first time.
fn parse_columns(row: &Row, column_types: &[ColumnType]) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for (index, cell) in row.iter().enumerate() {
        let Some(header) = cell.as_deref() else {
            continue;
        };
        let Some(column_type) = column_types.iter().copied().find(|t| t.matches_header(header))
        else {
            continue;
        };
        if columns.iter().any(|column| column.column_type == column_type) {
            warn!(header, index, "column header found twice, using the first one");
            continue;
        }
        columns.push(Column { column_type, index });
    }
    columns
}

/// Read parameters from `file`.
///
/// The first row containing any of the `optional` or `required` column
/// headers is taken as the header row. Each following row gives one grid
/// row with a parameter per recognized column, in column order. Rows with
/// no value in any recognized column are skipped. Rows with some of them
/// filled are an error.
///
/// Rows in errors are numbered from the header down: the row directly below
/// the header gets [`TabularFile::row_offset`].
pub fn extract_parameter_grid(
    file: &dyn TabularFile,
    optional: &[ColumnType],
    required: &[ColumnType],
) -> Result<JobParameterGrid> {
    let mut column_types: Vec<ColumnType> = required.to_vec();
    column_types.extend(optional.iter().copied().filter(|t| !required.contains(t)));

    let rows = file.rows()?;
    let Some((header_index, columns)) = rows.iter().enumerate().find_map(|(index, row)| {
        let columns = parse_columns(row, &column_types);
        (!columns.is_empty()).then_some((index, columns))
    }) else {
        return Err(InputFileError::NoHeaderRow {
            file: file.name(),
            expected: column_types.iter().map(ToString::to_string).collect(),
        });
    };
    debug!(
        file = %file.name(),
        row = header_index + 1,
        columns = ?columns.iter().map(|c| c.column_type).collect::<Vec<_>>(),
        "found header row"
    );

    if let Some(missing) = required
        .iter()
        .find(|t| !columns.iter().any(|column| column.column_type == **t))
    {
        return Err(InputFileError::MissingColumn {
            column: missing.to_string(),
            file: file.name(),
        });
    }

    let mut grid = JobParameterGrid::default();
    for (position, row) in rows.iter().enumerate().skip(header_index + 1) {
        let row_number = position - header_index - 1 + file.row_offset();
        let (filled, empty): (Vec<&Column>, Vec<&Column>) =
            columns.iter().partition(|column| column.cell(row).is_some());
        if filled.is_empty() {
            debug!(row = row_number, "skipping empty row");
            continue;
        }
        if !empty.is_empty() {
            return Err(InputFileError::RowParse {
                row: row_number,
                filled: filled.iter().map(|c| c.column_type.to_string()).collect(),
                empty: empty.iter().map(|c| c.column_type.to_string()).collect(),
            });
        }
        let parameters = columns
            .iter()
            .map(|column| {
                let value = column.cell(row).unwrap_or_default();
                column
                    .column_type
                    .parameter_from(value)
                    .map_err(|source| InputFileError::Value {
                        row: row_number,
                        column: column.column_type.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        grid.append_row(parameters);
    }
    debug!(file = %file.name(), rows = grid.len(), "extracted parameter grid");
    Ok(grid)
}
