use std::fmt;

use serde::{Deserialize, Serialize};

/// An anonymization server that can be talked to through the web API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteServer {
    /// Short keyword to identify this server.
    pub name: String,
    /// Full url of the web API.
    pub url: String,
}

impl RemoteServer {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for RemoteServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.url)
    }
}
