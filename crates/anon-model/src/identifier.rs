//! Source identifiers: typed references to where the data for a job comes
//! from.
//!
//! Every identifier serializes as `key:value`, for example
//! `folder:\\server\share\data` or `accession_number:1234567.12345678`.
//! Parsing splits on the first colon only, so the value itself may contain
//! colons.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ParameterError, Result};
use crate::path::WinPath;

/// Type tag of a source identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKey {
    Base,
    Folder,
    PacsResource,
    StudyInstanceUid,
    AccessionNumber,
    FileSelection,
}

impl SourceKey {
    /// All keys, in the order they are tried when parsing.
    pub const ALL: [SourceKey; 6] = [
        SourceKey::Base,
        SourceKey::Folder,
        SourceKey::PacsResource,
        SourceKey::StudyInstanceUid,
        SourceKey::AccessionNumber,
        SourceKey::FileSelection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Folder => "folder",
            Self::PacsResource => "pacs_resource",
            Self::StudyInstanceUid => "study_instance_uid",
            Self::AccessionNumber => "accession_number",
            Self::FileSelection => "fileselection",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == tag)
    }

    fn known_tags() -> String {
        Self::ALL
            .iter()
            .map(|key| key.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A place where data to anonymize is coming from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceIdentifier {
    /// Opaque fallback.
    Base(String),
    /// A complete folder on a share.
    Folder(String),
    /// A file selection manifest listing the files to use.
    FileSelection(String),
    /// Some object in the PACS, not further specified.
    PacsResource(String),
    /// A DICOM StudyInstanceUID, retrieved from PACS.
    StudyInstanceUid(String),
    /// A DICOM AccessionNumber, retrieved from PACS.
    AccessionNumber(String),
}

impl SourceIdentifier {
    /// Build an identifier of the given kind. Trailing whitespace is removed.
    pub fn new(key: SourceKey, identifier: &str) -> Self {
        let identifier = identifier.trim_end().to_string();
        match key {
            SourceKey::Base => Self::Base(identifier),
            SourceKey::Folder => Self::Folder(identifier),
            SourceKey::FileSelection => Self::FileSelection(identifier),
            SourceKey::PacsResource => Self::PacsResource(identifier),
            SourceKey::StudyInstanceUid => Self::StudyInstanceUid(identifier),
            SourceKey::AccessionNumber => Self::AccessionNumber(identifier),
        }
    }

    /// Parse `key:identifier`. Only the first colon separates.
    pub fn parse(input: &str) -> Result<Self> {
        let Some((tag, identifier)) = input.split_once(':') else {
            return Err(ParameterError::UnknownSourceIdentifier {
                input: input.to_string(),
                reason: "a source needs a colon ':' between its type and its value".to_string(),
            });
        };
        let key = SourceKey::from_tag(tag).ok_or_else(|| {
            ParameterError::UnknownSourceIdentifier {
                input: input.to_string(),
                reason: format!("known identifiers: {}", SourceKey::known_tags()),
            }
        })?;
        Ok(Self::new(key, identifier))
    }

    /// Identifier for an object that one of the variants knows about.
    pub fn from_object(object: &SourceObject) -> Result<Self> {
        match object {
            SourceObject::FileSelection(selection) => Ok(Self::FileSelection(
                selection.data_file_path.display().to_string(),
            )),
            SourceObject::DicomFile(path) => Err(ParameterError::UnknownObject {
                object: format!("DICOM file {}", path.display()),
            }),
        }
    }

    pub fn key(&self) -> SourceKey {
        match self {
            Self::Base(_) => SourceKey::Base,
            Self::Folder(_) => SourceKey::Folder,
            Self::FileSelection(_) => SourceKey::FileSelection,
            Self::PacsResource(_) => SourceKey::PacsResource,
            Self::StudyInstanceUid(_) => SourceKey::StudyInstanceUid,
            Self::AccessionNumber(_) => SourceKey::AccessionNumber,
        }
    }

    /// The value part, without key.
    pub fn identifier(&self) -> &str {
        match self {
            Self::Base(value)
            | Self::Folder(value)
            | Self::FileSelection(value)
            | Self::PacsResource(value)
            | Self::StudyInstanceUid(value)
            | Self::AccessionNumber(value) => value,
        }
    }

    /// Data comes from a share or disk.
    pub fn is_path(&self) -> bool {
        matches!(self, Self::Folder(_) | Self::FileSelection(_))
    }

    /// Data comes from the PACS.
    pub fn is_pacs(&self) -> bool {
        matches!(
            self,
            Self::PacsResource(_) | Self::StudyInstanceUid(_) | Self::AccessionNumber(_)
        )
    }

    /// Path part for path-based identifiers.
    pub fn path(&self) -> Option<WinPath> {
        self.is_path().then(|| WinPath::new(self.identifier()))
    }

    /// Copy of this identifier pointing at `path`. Non-path identifiers are
    /// returned unchanged.
    pub fn with_path(&self, path: &WinPath) -> Self {
        match self {
            Self::Folder(_) => Self::Folder(path.to_string()),
            Self::FileSelection(_) => Self::FileSelection(path.to_string()),
            other => other.clone(),
        }
    }

    /// Value for `source_instance_id` that the server understands.
    ///
    /// StudyInstanceUIDs are sent without key, everything else keeps its
    /// `key:` prefix.
    pub fn legacy_idis_value(&self) -> String {
        match self {
            Self::StudyInstanceUid(uid) => uid.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key(), self.identifier())
    }
}

impl FromStr for SourceIdentifier {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl serde::Serialize for SourceIdentifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for SourceIdentifier {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Reference to a file selection manifest on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelectionFile {
    /// Where the manifest itself is stored.
    pub data_file_path: PathBuf,
    pub description: String,
    pub selected_paths: Vec<PathBuf>,
}

impl FileSelectionFile {
    pub fn new(data_file_path: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self {
            data_file_path: data_file_path.into(),
            description: description.into(),
            selected_paths: Vec::new(),
        }
    }
}

/// Objects that might be turned into a source identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceObject {
    FileSelection(FileSelectionFile),
    DicomFile(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_known_keys() {
        assert_eq!(
            SourceIdentifier::parse("folder:/something/folder")
                .unwrap()
                .key(),
            SourceKey::Folder
        );
        assert_eq!(
            SourceIdentifier::parse("base:123234").unwrap().key(),
            SourceKey::Base
        );
    }

    #[test]
    fn test_pacs_resource_is_pacs() {
        let id = SourceIdentifier::parse("pacs_resource:1.2.840.1").unwrap();
        assert_eq!(id, SourceIdentifier::PacsResource("1.2.840.1".to_string()));
        assert!(id.is_pacs());
        assert!(!id.is_path());
        assert_eq!(id.to_string(), "pacs_resource:1.2.840.1");
        assert_eq!(id.legacy_idis_value(), "pacs_resource:1.2.840.1");
    }

    #[test]
    fn test_rejects_faulty_keys() {
        for faulty in ["somethingelse:123234", "folder,123234", "folder123234"] {
            let err = SourceIdentifier::parse(faulty).unwrap_err();
            assert!(matches!(
                err,
                ParameterError::UnknownSourceIdentifier { .. }
            ));
        }
    }

    #[test]
    fn test_strips_trailing_whitespace() {
        let id = SourceIdentifier::parse("accession_number:123 \r").unwrap();
        assert_eq!(id.identifier(), "123");
    }

    #[test]
    fn test_legacy_value_strips_key_for_study_uid_only() {
        let uid = SourceIdentifier::StudyInstanceUid("1.2.3".to_string());
        assert_eq!(uid.legacy_idis_value(), "1.2.3");
        let acc = SourceIdentifier::AccessionNumber("1234.5".to_string());
        assert_eq!(acc.legacy_idis_value(), "accession_number:1234.5");
    }

    #[test]
    fn test_path_only_for_path_types() {
        assert!(SourceIdentifier::Folder("a".to_string()).path().is_some());
        assert!(
            SourceIdentifier::AccessionNumber("a".to_string())
                .path()
                .is_none()
        );
        assert!(SourceIdentifier::Base("a".to_string()).path().is_none());
    }
}
