//! Client for the anonymization server web API.
//!
//! [`WebApiClient`] does the HTTP, [`AnonClientTool`] knows about servers and
//! jobs. Anything implementing [`ApiCall`] can stand in for the HTTP client,
//! like [`RecordingClient`] for dry runs.

pub mod api;
pub mod error;
pub mod responses;
pub mod server;
pub mod tool;
pub mod web;

pub use api::{ApiArgs, ApiCall, ApiRequest, Method, RecordingClient, args};
pub use error::{ClientError, Result};
pub use responses::{CreatedJob, JobInfo, JobStatus, parse_job_infos};
pub use server::RemoteServer;
pub use tool::AnonClientTool;
pub use web::WebApiClient;
