//! Reading job parameters from tabular input files.
//!
//! Users often have a spreadsheet with accession numbers or folders and
//! pseudonyms. [`extract_parameter_grid`] finds the known columns in such a
//! file and turns each row into parameters for a mapping.

pub mod column;
pub mod error;
pub mod extract;
pub mod tabular;

pub use column::{ColumnType, clean_string};
pub use error::{InputFileError, Result};
pub use extract::extract_parameter_grid;
pub use tabular::{CsvFile, Row, TabularFile, Table, XlsxFile, as_tabular_file};
