//! The capability of calling a web API function.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::info;

use crate::error::{ClientError, Result};

/// Arguments of an API call. Keys may repeat for list values.
pub type ApiArgs = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Something that can call functions of the anonymization web API.
pub trait ApiCall {
    /// Call `function_name` and return the parsed JSON response.
    fn call(&self, method: Method, function_name: &str, args: ApiArgs) -> Result<Value>;

    /// Name used in messages, like `user@https://server/api`.
    fn describe(&self) -> String;

    fn get(&self, function_name: &str, args: ApiArgs) -> Result<Value> {
        self.call(Method::Get, function_name, args)
    }

    fn post(&self, function_name: &str, args: ApiArgs) -> Result<Value> {
        self.call(Method::Post, function_name, args)
    }
}

/// Build [`ApiArgs`] from key value pairs.
pub fn args<K: Into<String>, V: ToString>(pairs: impl IntoIterator<Item = (K, V)>) -> ApiArgs {
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.to_string()))
        .collect()
}

/// One call made through a [`RecordingClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub function_name: String,
    pub args: ApiArgs,
}

impl ApiRequest {
    /// First value given for `key`.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.function_name)?;
        for (key, value) in &self.args {
            write!(f, " {key}={value:?}")?;
        }
        Ok(())
    }
}

/// Client that sends nothing. Every call is recorded and answered from a
/// queue of prepared responses, or with the default response once the
/// queue is empty. Clones share the same record.
///
/// Used for dry runs and in tests.
#[derive(Debug, Clone)]
pub struct RecordingClient {
    requests: Rc<RefCell<Vec<ApiRequest>>>,
    responses: Rc<RefCell<VecDeque<std::result::Result<Value, Value>>>>,
    default_response: Value,
}

impl RecordingClient {
    pub fn new(default_response: Value) -> Self {
        Self {
            requests: Rc::default(),
            responses: Rc::default(),
            default_response,
        }
    }

    /// Answer the next unanswered call with `value`.
    pub fn respond_with(&self, value: Value) {
        self.responses.borrow_mut().push_back(Ok(value));
    }

    /// Answer the next unanswered call with an API error.
    pub fn fail_with(&self, errors: Value) {
        self.responses.borrow_mut().push_back(Err(errors));
    }

    /// Calls made so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }
}

impl ApiCall for RecordingClient {
    fn call(&self, method: Method, function_name: &str, args: ApiArgs) -> Result<Value> {
        let request = ApiRequest {
            method,
            function_name: function_name.to_string(),
            args,
        };
        info!(%request, "recorded API call");
        self.requests.borrow_mut().push(request);
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(errors)) => Err(ClientError::Api { errors }),
            None => Ok(self.default_response.clone()),
        }
    }

    fn describe(&self) -> String {
        "recording client".to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_recording_client_answers_in_order() {
        let client = RecordingClient::new(json!({}));
        client.respond_with(json!({"job_id": 1}));
        client.fail_with(json!({"job_id": "not found"}));

        assert_eq!(client.get("get_job", args([("job_id", 1)])).unwrap(), json!({"job_id": 1}));
        assert!(matches!(
            client.post("cancel_job", Vec::new()),
            Err(ClientError::Api { .. })
        ));
        assert_eq!(client.get("get_jobs", Vec::new()).unwrap(), json!({}));

        let shared = client.clone();
        let requests = shared.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].arg("job_id"), Some("1"));
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[0].to_string(), "GET get_job job_id=\"1\"");
    }
}
