//! Batches: the ids of jobs created from one folder, kept in that folder.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anon_client::RemoteServer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Hidden folder holding the batch file.
pub const BATCH_DIR_NAME: &str = ".anonapi";
pub const BATCH_FILE_NAME: &str = "batch.yml";

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no batch defined in {path}")]
    NoBatch { path: PathBuf },

    #[error("failed to read batch {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write batch {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse batch {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize batch: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, BatchError>;

/// Jobs on one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBatch {
    pub job_ids: Vec<u64>,
    pub server: RemoteServer,
}

impl JobBatch {
    pub fn new(server: RemoteServer) -> Self {
        Self {
            job_ids: Vec::new(),
            server,
        }
    }

    /// Add ids. Ids stay sorted and unique.
    pub fn add(&mut self, job_ids: impl IntoIterator<Item = u64>) {
        self.job_ids.extend(job_ids);
        self.job_ids.sort_unstable();
        self.job_ids.dedup();
    }

    pub fn remove(&mut self, job_ids: &[u64]) {
        self.job_ids.retain(|id| !job_ids.contains(id));
    }
}

impl fmt::Display for JobBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "server: {}", self.server)?;
        write!(f, "job_ids: {:?}", self.job_ids)
    }
}

/// A folder that can hold a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFolder {
    path: PathBuf,
}

impl BatchFolder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn batch_file(&self) -> PathBuf {
        self.path.join(BATCH_DIR_NAME).join(BATCH_FILE_NAME)
    }

    pub fn has_batch(&self) -> bool {
        self.batch_file().exists()
    }

    pub fn load(&self) -> Result<JobBatch> {
        let path = self.batch_file();
        if !path.exists() {
            return Err(BatchError::NoBatch {
                path: self.path.clone(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|source| BatchError::Read {
            path: path.clone(),
            source,
        })?;
        let batch: JobBatch = serde_yaml::from_str(&content)
            .map_err(|source| BatchError::Parse { path, source })?;
        debug!(jobs = batch.job_ids.len(), server = %batch.server.name, "loaded batch");
        Ok(batch)
    }

    pub fn save(&self, batch: &JobBatch) -> Result<()> {
        let path = self.batch_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| BatchError::Write {
                path: path.clone(),
                source,
            })?;
        }
        let content = serde_yaml::to_string(batch)?;
        fs::write(&path, content).map_err(|source| BatchError::Write { path, source })
    }

    /// Remove the batch file. No batch is fine.
    pub fn delete_batch(&self) -> Result<()> {
        let path = self.batch_file();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BatchError::Write { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> RemoteServer {
        RemoteServer::new("p01", "https://p01/api")
    }

    #[test]
    fn test_add_keeps_ids_sorted_and_unique() {
        let mut batch = JobBatch::new(server());
        batch.add([5, 3, 4]);
        batch.add([4, 1]);
        assert_eq!(batch.job_ids, vec![1, 3, 4, 5]);

        batch.remove(&[3, 10]);
        assert_eq!(batch.job_ids, vec![1, 4, 5]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let folder = BatchFolder::new(dir.path());
        assert!(!folder.has_batch());
        assert!(matches!(folder.load(), Err(BatchError::NoBatch { .. })));

        let mut batch = JobBatch::new(server());
        batch.add([12, 11]);
        folder.save(&batch).unwrap();

        assert!(dir.path().join(".anonapi").join("batch.yml").exists());
        assert_eq!(folder.load().unwrap(), batch);

        folder.delete_batch().unwrap();
        assert!(!folder.has_batch());
        folder.delete_batch().unwrap();
    }
}
