//! Blocking HTTP client for the web API.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiArgs, ApiCall, Method};
use crate::error::{ClientError, Result};

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Calls web API functions at `<hostname>/<function_name>` as a user.
#[derive(Debug, Clone)]
pub struct WebApiClient {
    hostname: String,
    username: String,
    token: String,
    client: Client,
}

impl WebApiClient {
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let hostname = hostname.into();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ClientError::Connection {
                url: hostname.clone(),
                source,
            })?;
        Ok(Self {
            hostname,
            username: username.into(),
            token: token.into(),
            client,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    fn function_url(&self, function_name: &str) -> String {
        format!("{}/{}", self.hostname.trim_end_matches('/'), function_name)
    }

    /// `args` with the user name added, unless already given.
    fn with_user_name(&self, mut args: ApiArgs) -> ApiArgs {
        if !args.iter().any(|(key, _)| key == "user_name") {
            args.push(("user_name".to_string(), self.username.clone()));
        }
        args
    }

    /// Turn the HTTP response into JSON or an error. 200 is fine, and so is a
    /// 404 from the API itself, which comes with documentation.
    fn interpret_response(&self, response: Response) -> Result<Value> {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("unknown").to_string();
        let text = response.text().map_err(|source| ClientError::Connection {
            url: self.hostname.clone(),
            source,
        })?;
        let parse = |text: &str| -> Result<Value> {
            serde_json::from_str(text).map_err(|err| ClientError::Parse {
                context: self.describe(),
                message: err.to_string(),
            })
        };

        match status {
            StatusCode::OK => parse(&text),
            StatusCode::NOT_FOUND => {
                let parsed: Value = serde_json::from_str(&text).map_err(|_| ClientError::NotAnApi {
                    client: self.describe(),
                    reason: "response was not JSON. Is this a web API url?".to_string(),
                })?;
                if parsed.get("documentation").is_none() {
                    return Err(ClientError::NotAnApi {
                        client: self.describe(),
                        reason: "no documentation found in 404 response".to_string(),
                    });
                }
                Ok(parsed)
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized {
                server: self.hostname.clone(),
            }),
            StatusCode::BAD_REQUEST => {
                let mut parsed = parse(&text)?;
                let errors = match parsed.get_mut("errors") {
                    Some(errors) => errors.take(),
                    None => parsed,
                };
                Err(ClientError::Api { errors })
            }
            StatusCode::METHOD_NOT_ALLOWED => Err(ClientError::MethodNotAllowed {
                client: self.describe(),
            }),
            other => Err(ClientError::UnexpectedResponse {
                client: self.describe(),
                status: other.as_u16(),
                reason,
            }),
        }
    }
}

impl ApiCall for WebApiClient {
    fn call(&self, method: Method, function_name: &str, args: ApiArgs) -> Result<Value> {
        let url = self.function_url(function_name);
        let args = self.with_user_name(args);
        debug!(%method, %url, "calling web API");

        let request = match method {
            Method::Get => self.client.get(&url).query(&args),
            Method::Post => self.client.post(&url).form(&args),
        };
        let response = request
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(USER_AGENT, concat!("anon/", env!("CARGO_PKG_VERSION")))
            .send()
            .map_err(|source| ClientError::Connection { url, source })?;
        self.interpret_response(response)
    }

    fn describe(&self) -> String {
        format!("WebApiClient for {}@{}", self.username, self.hostname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> WebApiClient {
        WebApiClient::new("https://anon.example.org/api/", "tester", "secret").unwrap()
    }

    #[test]
    fn test_function_url() {
        assert_eq!(
            client().function_url("get_jobs"),
            "https://anon.example.org/api/get_jobs"
        );
    }

    #[test]
    fn test_user_name_added_once() {
        let client = client();
        let args = client.with_user_name(vec![("job_id".to_string(), "1".to_string())]);
        assert!(args.contains(&("user_name".to_string(), "tester".to_string())));

        let args = client.with_user_name(vec![("user_name".to_string(), "other".to_string())]);
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].1, "other");
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            client().describe(),
            "WebApiClient for tester@https://anon.example.org/api/"
        );
    }
}
