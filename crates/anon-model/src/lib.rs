//! Typed parameters for anonymization jobs.
//!
//! - [`SourceIdentifier`]: where the data for a job comes from
//! - [`Parameter`]: a typed `field,value` pair
//! - [`ParameterSet`]: at most one parameter per kind
//! - [`JobParameterSet`]: validation and job creation keywords for one job
//! - [`WinPath`]: the Windows/UNC path model all paths are checked against

pub mod error;
pub mod identifier;
pub mod job;
pub mod parameter;
pub mod path;
pub mod set;

pub use error::{JobSetError, ParameterError, Result};
pub use identifier::{FileSelectionFile, SourceIdentifier, SourceKey, SourceObject};
pub use job::{JobKind, JobParameterSet};
pub use parameter::{Parameter, ParameterKind};
pub use path::WinPath;
pub use set::ParameterSet;
