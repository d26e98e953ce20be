//! Mapping engine: the human editable files that say which jobs to create.
//!
//! - [`dialect`]: `,` versus `;` detection
//! - [`grid`]: one row of parameters per job
//! - [`mapping`]: the sectioned description/options/grid format
//! - [`file`]: mappings on disk
//! - [`legacy`]: the older single-table mapping list

pub mod dialect;
pub mod error;
pub mod file;
pub mod grid;
pub mod legacy;
pub mod mapping;

pub use dialect::{Dialect, sniff_dialect, sniff_dialect_safe};
pub use error::{MapperError, Result};
pub use file::{DEFAULT_MAPPING_NAME, MappingFile, MappingFolder};
pub use grid::JobParameterGrid;
pub use legacy::{AnonymizationParameters, MappingList};
pub use mapping::{Mapping, MappingParameterSet, Section, Sections, decode_text, parse_sections};
