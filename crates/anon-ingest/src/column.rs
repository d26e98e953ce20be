//! Known kinds of columns in input files.

use std::fmt;

use anon_model::{Parameter, ParameterError, SourceIdentifier, SourceKey};

/// A kind of column that can be recognized by its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    AccessionNumber,
    Pseudonym,
    Folder,
}

impl ColumnType {
    pub const ALL: [ColumnType; 3] = [Self::AccessionNumber, Self::Pseudonym, Self::Folder];

    /// Headers that can be above this column. The first is used in messages.
    pub fn header_names(self) -> &'static [&'static str] {
        match self {
            Self::AccessionNumber => &["Accession Number", "Acc Nr"],
            Self::Pseudonym => &["PseudoID", "Pseudonym"],
            Self::Folder => &["Folder", "Path", "Folder Path"],
        }
    }

    /// Whether `header` names this column, ignoring case and separators.
    pub fn matches_header(self, header: &str) -> bool {
        let header = clean_string(header);
        !header.is_empty()
            && self
                .header_names()
                .iter()
                .any(|name| clean_string(name) == header)
    }

    /// Parameter for a cell in this column.
    pub fn parameter_from(self, value: &str) -> Result<Parameter, ParameterError> {
        let value = value.trim();
        match self {
            Self::AccessionNumber => Ok(Parameter::Source(SourceIdentifier::new(
                SourceKey::AccessionNumber,
                value,
            ))),
            Self::Folder => Ok(Parameter::Source(SourceIdentifier::new(SourceKey::Folder, value))),
            Self::Pseudonym => Ok(Parameter::PseudoName(value.to_string())),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column {}", self.header_names()[0])
    }
}

/// Lowercase with spaces, underscores, dashes and dots removed.
pub fn clean_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}
