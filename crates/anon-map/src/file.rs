//! Mappings on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{MapperError, Result};
use crate::mapping::{Mapping, decode_text};

/// File name used when no other name is given.
pub const DEFAULT_MAPPING_NAME: &str = "anon_mapping.csv";

/// A file that contains a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingFile {
    path: PathBuf,
}

impl MappingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the mapping in this file.
    pub fn get_mapping(&self) -> Result<Mapping> {
        let bytes = fs::read(&self.path).map_err(|source| {
            MapperError::from_read(self.path.display().to_string(), Some(self.path.clone()), source)
        })?;
        Mapping::parse(&decode_text(&bytes))
    }

    /// Write `mapping` to this file, replacing what is there.
    pub fn save_mapping(&self, mapping: &Mapping) -> Result<()> {
        let mut bytes = Vec::new();
        mapping.save_to(&mut bytes)?;
        fs::write(&self.path, bytes).map_err(|source| self.write_error(source))?;
        info!(path = %self.path.display(), rows = mapping.len(), "saved mapping");
        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => MapperError::NotFound {
                path: self.path.clone(),
            },
            _ => self.write_error(source),
        })?;
        info!(path = %self.path.display(), "deleted mapping");
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> MapperError {
        match MapperError::from_read(self.path.display().to_string(), Some(self.path.clone()), source) {
            MapperError::Read { location, source } => MapperError::Write { location, source },
            other => other,
        }
    }
}

/// A folder that might contain a mapping under the default name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingFolder {
    path: PathBuf,
}

impl MappingFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self) -> MappingFile {
        MappingFile::new(self.full_path())
    }

    /// Path of the mapping file in this folder.
    pub fn full_path(&self) -> PathBuf {
        self.path.join(DEFAULT_MAPPING_NAME)
    }

    pub fn has_mapping(&self) -> bool {
        self.file().exists()
    }

    pub fn get_mapping(&self) -> Result<Mapping> {
        self.file().get_mapping()
    }

    pub fn save_mapping(&self, mapping: &Mapping) -> Result<()> {
        self.file().save_mapping(mapping)
    }

    pub fn delete_mapping(&self) -> Result<()> {
        self.file().delete()
    }

    /// `path` relative to this folder. Relative paths are returned as is.
    pub fn make_relative(&self, path: &Path) -> Result<PathBuf> {
        if path.is_relative() {
            return Ok(path.to_path_buf());
        }
        path.strip_prefix(&self.path)
            .map(Path::to_path_buf)
            .map_err(|_| MapperError::OutsideFolder {
                path: path.to_path_buf(),
                folder: self.path.clone(),
            })
    }

    /// A path relative to this folder made absolute.
    pub fn make_absolute(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Err(MapperError::AlreadyAbsolute {
                path: path.to_path_buf(),
            });
        }
        Ok(self.path.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_relative() {
        let dir = tempfile::tempdir().unwrap();
        let folder = MappingFolder::new(dir.path());

        assert_eq!(
            folder.make_relative(&dir.path().join("foo/bar")).unwrap(),
            PathBuf::from("foo/bar")
        );
        assert_eq!(
            folder.make_relative(Path::new("already/relative")).unwrap(),
            PathBuf::from("already/relative")
        );
        let outside = std::env::temp_dir().join("definitely-not-inside");
        assert!(matches!(
            folder.make_relative(&outside),
            Err(MapperError::OutsideFolder { .. })
        ));
    }

    #[test]
    fn test_make_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let folder = MappingFolder::new(dir.path());
        assert_eq!(
            folder.make_absolute(Path::new("foo/bar")).unwrap(),
            dir.path().join("foo/bar")
        );
        assert!(matches!(
            folder.make_absolute(dir.path()),
            Err(MapperError::AlreadyAbsolute { .. })
        ));
    }

    #[test]
    fn test_missing_mapping_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let folder = MappingFolder::new(dir.path());
        assert!(!folder.has_mapping());
        assert!(matches!(
            folder.get_mapping(),
            Err(MapperError::NotFound { .. })
        ));
        assert!(matches!(
            folder.delete_mapping(),
            Err(MapperError::NotFound { .. })
        ));
    }
}
