//! Error types for parameter parsing and job parameter validation.

use thiserror::Error;

/// Errors raised while parsing or transforming a single parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
    /// Input could not be cast to any known source identifier.
    #[error("unknown source identifier '{input}': {reason}")]
    UnknownSourceIdentifier { input: String, reason: String },

    /// No source identifier variant claims this kind of object.
    #[error("unknown object {object}, cannot create an identifier for this")]
    UnknownObject { object: String },

    /// Input could not be parsed as any known parameter.
    #[error("could not parse parameter '{input}': {reason}")]
    ParameterParsing { input: String, reason: String },

    /// Relative path could not be resolved against the given root.
    #[error("cannot make '{path}' absolute with root '{root}': {reason}")]
    CannotMakeAbsolute {
        path: String,
        root: String,
        reason: String,
    },
}

impl ParameterError {
    pub(crate) fn parsing(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ParameterParsing {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while preparing a set of parameters for job creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobSetError {
    /// Parameters cannot be mapped to job creation keywords.
    #[error("{message}")]
    ParameterMapping { message: String },

    /// There are relative paths but no usable absolute root to resolve them.
    #[error("no absolute root path: {message}")]
    NoAbsoluteRootPath { message: String },

    /// The set cannot be used to create a job.
    #[error("invalid job parameters: {message}")]
    Validation { message: String },
}

impl JobSetError {
    /// True for the errors that come from mapping parameters to keywords,
    /// including a missing root path.
    pub fn is_mapping_error(&self) -> bool {
        matches!(
            self,
            Self::ParameterMapping { .. } | Self::NoAbsoluteRootPath { .. }
        )
    }

    pub(crate) fn mapping(message: impl Into<String>) -> Self {
        Self::ParameterMapping {
            message: message.into(),
        }
    }
}

/// Result type for parameter operations.
pub type Result<T> = std::result::Result<T, ParameterError>;
