//! Error types for reading and writing mappings.

use std::io;
use std::path::PathBuf;

use anon_model::ParameterError;
use thiserror::Error;

/// Errors raised by the mapping engine.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Neither `,` nor `;` separates the given lines consistently.
    #[error("Could not determine dialect")]
    UndeterminedDialect,

    // === Load errors ===
    /// A section header is missing, misspelled or out of order.
    #[error("could not find required section header \"{expected}\"{}", found_suffix(.found))]
    MissingSection {
        expected: &'static str,
        found: Option<String>,
    },

    /// A line in the options section could not be parsed.
    #[error("problem parsing option '{line}': {source}")]
    Option {
        line: String,
        #[source]
        source: ParameterError,
    },

    /// A grid row could not be parsed.
    #[error("problem parsing mapping row {row}: {message}")]
    GridRow { row: usize, message: String },

    /// A grid column header is not a known parameter.
    #[error("unknown column '{column}' in mapping header")]
    UnknownColumn { column: String },

    /// The grid has no header row.
    #[error("mapping section has no header row")]
    MissingGridHeader,

    /// Low level CSV failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file is there but cannot be read, usually because another program
    /// holds it open.
    #[error("cannot read mapping at {location}: is this file opened in another editor? ({source})")]
    Locked {
        location: String,
        #[source]
        source: io::Error,
    },

    // === I/O errors ===
    /// No mapping file at this path.
    #[error("no mapping found at {path}")]
    NotFound { path: PathBuf },

    /// Failed to read a mapping.
    #[error("failed to read mapping at {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: io::Error,
    },

    /// Failed to write a mapping.
    #[error("failed to write mapping to {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: io::Error,
    },

    // === Content errors ===
    /// A row added to a mapping has no source.
    #[error(
        "invalid set of parameters for mapping: no source found. Where should the data come from?"
    )]
    NoSource,

    /// Path is absolute but not inside the mapping folder.
    #[error("'{path}' is not inside mapping folder '{folder}'")]
    OutsideFolder { path: PathBuf, folder: PathBuf },

    /// Path was expected to be relative.
    #[error("'{path}' is already absolute")]
    AlreadyAbsolute { path: PathBuf },
}

fn found_suffix(found: &Option<String>) -> String {
    match found {
        Some(line) => format!(", found \"{line}\""),
        None => String::new(),
    }
}

impl MapperError {
    /// True if the content of a mapping could not be loaded.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSection { .. }
                | Self::Option { .. }
                | Self::GridRow { .. }
                | Self::UnknownColumn { .. }
                | Self::MissingGridHeader
                | Self::Csv(_)
                | Self::Locked { .. }
        )
    }

    /// Translate an I/O error from reading. Missing files and files locked by
    /// another program get their own variants.
    pub fn from_read(location: impl Into<String>, path: Option<PathBuf>, source: io::Error) -> Self {
        let location = location.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                path: path.unwrap_or_else(|| PathBuf::from(&location)),
            },
            _ if is_locked(&source) => Self::Locked { location, source },
            _ => Self::Read { location, source },
        }
    }
}

/// Errors that editors cause by holding a file open. Windows reports a
/// sharing or lock violation, shares often report a permission error.
fn is_locked(err: &io::Error) -> bool {
    const ERROR_SHARING_VIOLATION: i32 = 32;
    const ERROR_LOCK_VIOLATION: i32 = 33;
    err.kind() == io::ErrorKind::PermissionDenied
        || matches!(
            err.raw_os_error(),
            Some(ERROR_SHARING_VIOLATION | ERROR_LOCK_VIOLATION)
        )
        || err.to_string().contains("returned invalid length")
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, MapperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_file_gets_hint() {
        let err = MapperError::from_read(
            "anon_mapping.csv",
            None,
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.is_load_error());
        assert!(err.to_string().contains("opened in another editor?"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = MapperError::from_read(
            "anon_mapping.csv",
            Some(PathBuf::from("anon_mapping.csv")),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(matches!(err, MapperError::NotFound { .. }));
        assert!(!err.is_load_error());
    }

    #[test]
    fn test_missing_section_quotes_header() {
        let err = MapperError::MissingSection {
            expected: "## Description ##",
            found: Some("## Desc ##".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "could not find required section header \"## Description ##\", found \"## Desc ##\""
        );
    }
}
