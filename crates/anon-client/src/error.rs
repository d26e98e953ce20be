//! Error types for talking to an anonymization server.

use anon_model::JobSetError;
use thiserror::Error;

/// Errors that can occur when calling the web API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or no response came back.
    #[error("could not reach {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Credentials were not accepted.
    #[error("Server '{server}' returned 401 - Unauthorized, your credentials do not seem to work")]
    Unauthorized { server: String },

    /// The call reached the API but the API reports errors, such as a
    /// missing parameter or an unknown job.
    #[error("API returns errors: {errors}")]
    Api { errors: serde_json::Value },

    /// GET used where POST is needed or the other way around.
    #[error("'{client}' returned 405 - Method not allowed. Probably you are using GET where POST is needed, or vice versa")]
    MethodNotAllowed { client: String },

    /// A 404 that does not come from the web API.
    #[error("{client} is not responding like a web API: {reason}")]
    NotAnApi { client: String, reason: String },

    /// Any other status code.
    #[error("Unexpected response from {client}: code '{status}', reason '{reason}'")]
    UnexpectedResponse {
        client: String,
        status: u16,
        reason: String,
    },

    /// The response body is not what was expected.
    #[error("Error parsing server response from {context}: {message}")]
    Parse { context: String, message: String },

    /// A job creation call is missing a required argument.
    #[error("cannot create job: missing '{name}'")]
    MissingArgument { name: &'static str },

    /// The parameters for a job are not valid.
    #[error(transparent)]
    InvalidJob(#[from] JobSetError),
}

impl ClientError {
    /// Whether the server could not be reached or did not answer like the
    /// web API, as opposed to the API refusing a specific call.
    pub fn is_server_problem(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::NotAnApi { .. }
                | Self::UnexpectedResponse { .. }
                | Self::MethodNotAllowed { .. }
        )
    }
}

/// Result type for web API calls.
pub type Result<T> = std::result::Result<T, ClientError>;
