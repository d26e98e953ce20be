//! Typed versions of what the web API sends back.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};

/// Status string the server uses for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Active,
    Inactive,
    Uploaded,
    Done,
    Error,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Uploaded => "UPLOADED",
            Self::Done => "DONE",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Info on a single job. The core fields are always sent, the extended
/// ones only by `get_jobs_list_extended` and `get_job`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    pub job_id: u64,
    pub date: String,
    pub user_name: String,
    pub status: JobStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub files_downloaded: Option<u64>,
    #[serde(default)]
    pub files_processed: Option<u64>,

    // extended
    #[serde(default)]
    pub destination_path: Option<String>,
    #[serde(default)]
    pub source_anonymizedpatientid: Option<String>,
    #[serde(default)]
    pub source_anonymizedpatientname: Option<String>,
    #[serde(default)]
    pub source_path: Option<String>,
    #[serde(default)]
    pub source_pims_keyfile_id: Option<String>,
    #[serde(default)]
    pub source_instance_id: Option<String>,

    /// Anything else the server sent.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl JobInfo {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| ClientError::Parse {
            context: "job info".to_string(),
            message: err.to_string(),
        })
    }

    /// Whether the job stopped with an error.
    pub fn has_error(&self) -> bool {
        self.status == JobStatus::Error
    }
}

/// Parse a response keyed by job id, such as from `get_jobs`. Jobs come out
/// ordered by id.
pub fn parse_job_infos(response: Value) -> Result<Vec<JobInfo>> {
    let map = match response {
        Value::Object(map) => map,
        other => {
            return Err(ClientError::Parse {
                context: "job list".to_string(),
                message: format!("expected an object keyed by job id, got {other}"),
            });
        }
    };
    let mut infos = map
        .into_iter()
        .map(|(_, value)| JobInfo::from_value(value))
        .collect::<Result<Vec<_>>>()?;
    infos.sort_by_key(|info| info.job_id);
    Ok(infos)
}

/// Response to `create_job`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedJob {
    pub job_id: u64,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl CreatedJob {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|err| ClientError::Parse {
            context: "create_job response".to_string(),
            message: err.to_string(),
        })
    }
}
