//! Typed key/value parameters used to create anonymization jobs.
//!
//! A parameter is persisted as `field_name,value`. The set of kinds is
//! closed; every dispatch on kind is an exhaustive match.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::{ParameterError, Result};
use crate::identifier::SourceIdentifier;
use crate::path::WinPath;

/// The kind of a parameter. A parameter set holds at most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKind {
    Source,
    PseudoId,
    PseudoName,
    Description,
    PimsKey,
    DestinationPath,
    RootSourcePath,
    Project,
}

impl ParameterKind {
    /// All kinds in canonical order. Per-job kinds first, then kinds that
    /// usually apply to a whole mapping.
    pub const ALL: [ParameterKind; 8] = [
        ParameterKind::Source,
        ParameterKind::PseudoId,
        ParameterKind::PseudoName,
        ParameterKind::Description,
        ParameterKind::PimsKey,
        ParameterKind::DestinationPath,
        ParameterKind::RootSourcePath,
        ParameterKind::Project,
    ];

    /// Kinds that can carry a path.
    pub const PATHS: [ParameterKind; 3] = [
        ParameterKind::Source,
        ParameterKind::DestinationPath,
        ParameterKind::RootSourcePath,
    ];

    /// Current name, written on save.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::PseudoId => "pseudo_id",
            Self::PseudoName => "pseudo_name",
            Self::Description => "description",
            Self::PimsKey => "pims_key",
            Self::DestinationPath => "destination_path",
            Self::RootSourcePath => "root_source_path",
            Self::Project => "project",
        }
    }

    /// Historical names, still accepted when reading older files.
    pub fn legacy_field_names(self) -> &'static [&'static str] {
        match self {
            Self::PseudoId => &["patient_id"],
            Self::PseudoName => &["patient_name"],
            _ => &[],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Source => "Data to anonymize comes from this source",
            Self::PseudoId => "Pseudonym for Patient ID to set in anonymized data",
            Self::PseudoName => "Pseudonym for Patient name to set in anonymized data",
            Self::Description => "Job description, free text",
            Self::PimsKey => "Use this PIMS project to pseudonymize",
            Self::DestinationPath => "Write data to this UNC path after anonymization",
            Self::RootSourcePath => "Path sources are all relative to this UNC path",
            Self::Project => "Anonymize according to this project",
        }
    }

    /// Look up a kind by its current or legacy field name.
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            kind.field_name() == name || kind.legacy_field_names().contains(&name)
        })
    }

    pub(crate) fn known_field_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.field_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl serde::Serialize for ParameterKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.field_name())
    }
}

impl<'de> serde::Deserialize<'de> for ParameterKind {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_field_name(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown parameter '{s}'")))
    }
}

/// A typed, persistable key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    Source(SourceIdentifier),
    PseudoId(String),
    PseudoName(String),
    Description(String),
    PimsKey(String),
    DestinationPath(WinPath),
    RootSourcePath(WinPath),
    Project(String),
}

impl Parameter {
    /// Build a parameter from its field name (current or legacy) and raw
    /// value. An empty value is kept as an empty parameter, except for
    /// `source` which needs a valid identifier.
    pub fn from_key_value(field_name: &str, raw_value: &str) -> Result<Self> {
        let field_name = field_name.trim();
        let kind = ParameterKind::from_field_name(field_name).ok_or_else(|| {
            ParameterError::parsing(
                format!("{field_name},{raw_value}"),
                format!(
                    "unknown parameter '{field_name}', known parameters: {}",
                    ParameterKind::known_field_names()
                ),
            )
        })?;
        Self::of_kind(kind, raw_value)
    }

    /// Build a parameter of a known kind from a raw value.
    pub fn of_kind(kind: ParameterKind, raw_value: &str) -> Result<Self> {
        let param = match kind {
            ParameterKind::Source => {
                let identifier = SourceIdentifier::parse(raw_value).map_err(|err| {
                    ParameterError::parsing(
                        format!("source,{raw_value}"),
                        format!("error parsing source identifier: {err}"),
                    )
                })?;
                Self::Source(identifier)
            }
            ParameterKind::PseudoId => Self::PseudoId(raw_value.to_string()),
            ParameterKind::PseudoName => Self::PseudoName(raw_value.to_string()),
            ParameterKind::Description => Self::Description(raw_value.to_string()),
            ParameterKind::PimsKey => Self::PimsKey(raw_value.to_string()),
            ParameterKind::DestinationPath => Self::DestinationPath(WinPath::new(raw_value)),
            ParameterKind::RootSourcePath => Self::RootSourcePath(WinPath::new(raw_value)),
            ParameterKind::Project => Self::Project(raw_value.to_string()),
        };
        Ok(param)
    }

    /// Parse `field,value`. Falls back to `;` when there is no comma.
    pub fn parse_line(line: &str) -> Result<Self> {
        let (key, value) = line
            .split_once(',')
            .or_else(|| line.split_once(';'))
            .ok_or_else(|| {
                ParameterError::parsing(
                    line,
                    format!(
                        "expected 'field,value', known parameters: {}",
                        ParameterKind::known_field_names()
                    ),
                )
            })?;
        Self::from_key_value(key, value)
    }

    /// Random pseudonym of 8 uppercase letters and digits, like `8GW7FEDQ`.
    pub fn generate_pseudo_name() -> Self {
        const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let mut rng = rand::rng();
        let name = (0..8)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect();
        Self::PseudoName(name)
    }

    /// Description with the current date, like `generated_February_23_2020`.
    pub fn generate_description() -> Self {
        let today = chrono::Local::now().format("%B_%d_%Y");
        Self::Description(format!("generated_{today}"))
    }

    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Source(_) => ParameterKind::Source,
            Self::PseudoId(_) => ParameterKind::PseudoId,
            Self::PseudoName(_) => ParameterKind::PseudoName,
            Self::Description(_) => ParameterKind::Description,
            Self::PimsKey(_) => ParameterKind::PimsKey,
            Self::DestinationPath(_) => ParameterKind::DestinationPath,
            Self::RootSourcePath(_) => ParameterKind::RootSourcePath,
            Self::Project(_) => ParameterKind::Project,
        }
    }

    pub fn field_name(&self) -> &'static str {
        self.kind().field_name()
    }

    /// The value as it is written to file.
    pub fn value(&self) -> String {
        match self {
            Self::Source(identifier) => identifier.to_string(),
            Self::DestinationPath(path) | Self::RootSourcePath(path) => path.to_string(),
            Self::PseudoId(value)
            | Self::PseudoName(value)
            | Self::Description(value)
            | Self::PimsKey(value)
            | Self::Project(value) => value.clone(),
        }
    }

    /// True when the value is empty, like an empty cell in a grid.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Source(_) => false,
            Self::DestinationPath(path) | Self::RootSourcePath(path) => path.is_empty(),
            Self::PseudoId(value)
            | Self::PseudoName(value)
            | Self::Description(value)
            | Self::PimsKey(value)
            | Self::Project(value) => value.is_empty(),
        }
    }

    pub fn to_string_with(&self, delimiter: char) -> String {
        format!("{}{delimiter}{}", self.field_name(), self.value())
    }

    /// Human readable form, like `project:Wetenschap (Anonymize according to
    /// this project)`.
    pub fn describe(&self) -> String {
        format!(
            "{}:{} ({})",
            self.field_name(),
            self.value(),
            self.kind().description()
        )
    }

    pub fn source(&self) -> Option<&SourceIdentifier> {
        match self {
            Self::Source(identifier) => Some(identifier),
            _ => None,
        }
    }

    /// Path carried by this parameter, if any. Empty paths and non-path
    /// sources have none.
    pub fn path(&self) -> Option<WinPath> {
        match self {
            Self::Source(identifier) => identifier.path(),
            Self::DestinationPath(path) | Self::RootSourcePath(path) if !path.is_empty() => {
                Some(path.clone())
            }
            _ => None,
        }
    }

    /// Copy of this parameter pointing at `path`. Parameters without a path
    /// are returned unchanged.
    pub fn with_path(&self, path: WinPath) -> Self {
        match self {
            Self::Source(identifier) => Self::Source(identifier.with_path(&path)),
            Self::DestinationPath(_) => Self::DestinationPath(path),
            Self::RootSourcePath(_) => Self::RootSourcePath(path),
            other => other.clone(),
        }
    }

    /// Copy of this parameter with its path resolved against `root`.
    pub fn as_absolute(&self, root: &WinPath) -> Result<Self> {
        let Some(path) = self.path() else {
            return Ok(self.clone());
        };
        let absolute = path
            .resolve_against(root)
            .map_err(|reason| ParameterError::CannotMakeAbsolute {
                path: path.to_string(),
                root: root.to_string(),
                reason,
            })?;
        Ok(self.with_path(absolute))
    }

    /// A source that refers to data on a share or disk.
    pub fn is_path_type(&self) -> bool {
        self.source().is_some_and(SourceIdentifier::is_path)
    }

    /// A source that refers to data in the PACS.
    pub fn is_pacs_type(&self) -> bool {
        self.source().is_some_and(SourceIdentifier::is_pacs)
    }
}

impl From<SourceIdentifier> for Parameter {
    fn from(identifier: SourceIdentifier) -> Self {
        Self::Source(identifier)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field_name(), self.value())
    }
}

impl FromStr for Parameter {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_line(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_lines_with_comma_or_semicolon() {
        let param = Parameter::parse_line("project,Wetenschap-Algemeen").unwrap();
        assert_eq!(param, Parameter::Project("Wetenschap-Algemeen".to_string()));

        let param = Parameter::parse_line("pims_key;5566").unwrap();
        assert_eq!(param, Parameter::PimsKey("5566".to_string()));
    }

    #[test]
    fn test_legacy_field_names_parse_to_current_kinds() {
        let param = Parameter::from_key_value("patient_id", "001").unwrap();
        assert_eq!(param.kind(), ParameterKind::PseudoId);
        assert_eq!(param.to_string(), "pseudo_id,001");
    }

    #[test]
    fn test_empty_value_is_present_but_empty() {
        let param = Parameter::parse_line("description,").unwrap();
        assert_eq!(param, Parameter::Description(String::new()));
        assert!(param.is_empty());
    }

    #[test]
    fn test_faulty_lines_fail() {
        for faulty in ["nocomma", "unknown_field,1", "source,unknown:123"] {
            assert!(matches!(
                Parameter::parse_line(faulty),
                Err(ParameterError::ParameterParsing { .. })
            ));
        }
    }

    #[test]
    fn test_source_value_keeps_commas() {
        let param = Parameter::parse_line("source,folder:a,b").unwrap();
        assert_eq!(
            param,
            Parameter::Source(SourceIdentifier::Folder("a,b".to_string()))
        );
    }

    #[test]
    fn test_describe_names_field_and_purpose() {
        let param = Parameter::Project("P".to_string());
        assert_eq!(
            param.describe(),
            "project:P (Anonymize according to this project)"
        );
    }

    #[test]
    fn test_as_absolute_resolves_relative_source() {
        let root = WinPath::new(r"\\server\share\root");
        let param = Parameter::parse_line("source,folder:sub/a").unwrap();
        let absolute = param.as_absolute(&root).unwrap();
        assert_eq!(absolute.value(), r"folder:\\server\share\root\sub\a");

        let pacs = Parameter::parse_line("source,accession_number:123").unwrap();
        assert_eq!(pacs.as_absolute(&root).unwrap(), pacs);
    }

    #[test]
    fn test_generated_defaults() {
        let Parameter::PseudoName(name) = Parameter::generate_pseudo_name() else {
            panic!("expected a pseudo name");
        };
        assert_eq!(name.len(), 8);
        assert_ne!(Parameter::PseudoName(name.clone()), Parameter::generate_pseudo_name());
        assert!(
            name.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );

        let Parameter::Description(description) = Parameter::generate_description() else {
            panic!("expected a description");
        };
        assert!(description.starts_with("generated_"));
    }

    #[test]
    fn test_path_and_pacs_classification() {
        let folder = Parameter::parse_line("source,folder:a").unwrap();
        let selection = Parameter::parse_line("source,fileselection:a/fileselection.txt").unwrap();
        let uid = Parameter::parse_line("source,study_instance_uid:1.2.3").unwrap();
        let base = Parameter::parse_line("source,base:x").unwrap();
        assert!(folder.is_path_type() && selection.is_path_type());
        assert!(uid.is_pacs_type() && !uid.is_path_type());
        assert!(!base.is_path_type() && !base.is_pacs_type());
    }
}
