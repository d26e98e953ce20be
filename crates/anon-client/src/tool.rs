//! Server and job operations on top of an [`ApiCall`].

use std::collections::BTreeMap;

use anon_model::{JobKind, JobParameterSet};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ApiArgs, ApiCall, args};
use crate::error::{ClientError, Result};
use crate::responses::{CreatedJob, JobInfo, parse_job_infos};
use crate::server::RemoteServer;

/// Job creation keywords passed through to the API under another name.
const OPTIONAL_JOB_ARGS: [(&str, &str); 4] = [
    ("anon_name", "anonymizedpatientname"),
    ("anon_id", "anonymizedpatientid"),
    ("description", "description"),
    ("pims_keyfile_id", "pims_keyfile_id"),
];

/// Talks to one server about its jobs. Does no HTTP itself, that is up to
/// the client it is given.
pub struct AnonClientTool {
    client: Box<dyn ApiCall>,
    server: RemoteServer,
}

impl AnonClientTool {
    pub fn new(client: Box<dyn ApiCall>, server: RemoteServer) -> Self {
        Self { client, server }
    }

    pub fn server(&self) -> &RemoteServer {
        &self.server
    }

    /// API documentation. Calling without a function name returns it.
    pub fn get_documentation(&self) -> Result<Value> {
        let mut response = self.client.get("", Vec::new())?;
        response
            .get_mut("documentation")
            .map(Value::take)
            .ok_or_else(|| ClientError::NotAnApi {
                client: self.client.describe(),
                reason: "no documentation found".to_string(),
            })
    }

    /// Ok when the server answers like the web API.
    pub fn server_status(&self) -> Result<()> {
        self.get_documentation().map(|_| ())
    }

    /// Full description of a single job.
    pub fn get_job_info(&self, job_id: u64) -> Result<JobInfo> {
        let response = self.client.get("get_job", args([("job_id", job_id)]))?;
        JobInfo::from_value(response)
    }

    /// Info on the given jobs. Ids the server does not know are left out.
    /// Extended info includes source and destination, at the cost of a
    /// heavier query on the server.
    pub fn get_job_info_list(&self, job_ids: &[u64], extended: bool) -> Result<Vec<JobInfo>> {
        if job_ids.is_empty() {
            return Ok(Vec::new());
        }
        let function_name = if extended {
            "get_jobs_list_extended"
        } else {
            "get_jobs_list"
        };
        let response = self
            .client
            .get(function_name, args(job_ids.iter().map(|id| ("job_ids", id))))?;
        parse_job_infos(response)
    }

    /// Most recent jobs on the server.
    pub fn get_jobs(&self) -> Result<Vec<JobInfo>> {
        parse_job_infos(self.client.get("get_jobs", Vec::new())?)
    }

    pub fn cancel_job(&self, job_id: u64) -> Result<()> {
        self.client.post("cancel_job", args([("job_id", job_id)]))?;
        info!(job_id, server = %self.server.name, "cancelled job");
        Ok(())
    }

    /// Reset status, error and the downloaded/processed counters so the
    /// server picks the job up again.
    pub fn reset_job(&self, job_id: u64) -> Result<()> {
        let reset = args([
            ("job_id", job_id.to_string()),
            ("status", "ACTIVE".to_string()),
            ("files_downloaded", "0".to_string()),
            ("files_processed", "0".to_string()),
            ("error", " ".to_string()),
        ]);
        self.client.post("modify_job", reset)?;
        info!(job_id, server = %self.server.name, "reset job");
        Ok(())
    }

    /// Create a job that reads data from a network share.
    pub fn create_path_job(&self, kwargs: &BTreeMap<String, String>) -> Result<CreatedJob> {
        let mut call_args = args([
            ("source_type", "PATH".to_string()),
            ("source_path", required(kwargs, "source_path")?),
        ]);
        call_args.extend(destination_args(kwargs)?);
        self.create(call_args)
    }

    /// Create a job that retrieves data from the PACS.
    pub fn create_pacs_job(&self, kwargs: &BTreeMap<String, String>) -> Result<CreatedJob> {
        let mut call_args = args([
            ("source_type", "WADO".to_string()),
            ("source_name", "IDC_WADO".to_string()),
            ("source_instance_id", required(kwargs, "source_instance_id")?),
        ]);
        call_args.extend(destination_args(kwargs)?);
        self.create(call_args)
    }

    /// Validate `parameters` and create the job with the call that fits its
    /// source.
    pub fn create_job(&self, parameters: &JobParameterSet) -> Result<CreatedJob> {
        parameters.validate()?;
        let kwargs = parameters.as_job_kwargs()?;
        match parameters.job_kind()? {
            JobKind::Path => self.create_path_job(&kwargs),
            JobKind::Pacs => self.create_pacs_job(&kwargs),
        }
    }

    fn create(&self, call_args: ApiArgs) -> Result<CreatedJob> {
        debug!(server = %self.server.name, arguments = call_args.len(), "creating job");
        let created = CreatedJob::from_value(self.client.post("create_job", call_args)?)?;
        info!(job_id = created.job_id, server = %self.server.name, "created job");
        Ok(created)
    }
}

fn required(kwargs: &BTreeMap<String, String>, name: &'static str) -> Result<String> {
    kwargs
        .get(name)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or(ClientError::MissingArgument { name })
}

/// Arguments shared by every kind of job: where the data goes, which
/// project, and the optional anonymization values.
fn destination_args(kwargs: &BTreeMap<String, String>) -> Result<ApiArgs> {
    let mut call_args = args([
        ("destination_type", "PATH".to_string()),
        ("project_name", required(kwargs, "project_name")?),
        ("destination_path", required(kwargs, "destination_path")?),
    ]);
    for (keyword, api_name) in OPTIONAL_JOB_ARGS {
        if let Some(value) = kwargs.get(keyword) {
            call_args.push((api_name.to_string(), value.clone()));
        }
    }
    Ok(call_args)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::{Method, RecordingClient};

    fn tool(client: &RecordingClient) -> AnonClientTool {
        AnonClientTool::new(
            Box::new(client.clone()),
            RemoteServer::new("test", "https://test/api"),
        )
    }

    #[test]
    fn test_reset_job_arguments() {
        let client = RecordingClient::new(json!({}));
        tool(&client).reset_job(42).unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.function_name, "modify_job");
        assert_eq!(request.arg("status"), Some("ACTIVE"));
        assert_eq!(request.arg("error"), Some(" "));
    }

    #[test]
    fn test_job_info_list_sends_every_id() {
        let client = RecordingClient::new(json!({}));
        let infos = tool(&client).get_job_info_list(&[1, 2, 3], true).unwrap();
        assert!(infos.is_empty());

        let request = &client.requests()[0];
        assert_eq!(request.function_name, "get_jobs_list_extended");
        assert_eq!(
            request.args.iter().filter(|(key, _)| key == "job_ids").count(),
            3
        );
    }

    #[test]
    fn test_no_documentation_is_server_problem() {
        let client = RecordingClient::new(json!({"something": "else"}));
        let err = tool(&client).server_status().unwrap_err();
        assert!(err.is_server_problem());
    }

    #[test]
    fn test_create_path_job_requires_project() {
        let client = RecordingClient::new(json!({"job_id": 1}));
        let kwargs = BTreeMap::from([
            ("source_path".to_string(), r"\\srv\share\data".to_string()),
            ("destination_path".to_string(), r"\\srv\share\out".to_string()),
        ]);
        let err = tool(&client).create_path_job(&kwargs).unwrap_err();
        assert!(matches!(err, ClientError::MissingArgument { name: "project_name" }));
        assert!(client.requests().is_empty());
    }
}
