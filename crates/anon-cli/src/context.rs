//! What every command needs: settings, the folder it runs in and a way to
//! reach a server.

use std::path::{Path, PathBuf};

use anon_client::{AnonClientTool, ApiCall, RemoteServer, WebApiClient};
use anon_map::MappingFolder;

use crate::batch::BatchFolder;
use crate::settings::{Settings, SettingsFile};

/// Makes the client used to talk to a server.
pub type Connector =
    Box<dyn Fn(&RemoteServer, &Settings) -> anon_client::Result<Box<dyn ApiCall>>>;

/// HTTP client with the user's credentials.
pub fn web_connector() -> Connector {
    Box::new(|server: &RemoteServer, settings: &Settings| {
        let client = WebApiClient::new(&server.url, &settings.user_name, &settings.user_token)?;
        Ok(Box::new(client) as Box<dyn ApiCall>)
    })
}

pub struct AnonContext {
    pub settings: SettingsFile,
    current_dir: PathBuf,
    connector: Connector,
}

impl AnonContext {
    pub fn new(settings: SettingsFile, current_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            current_dir: current_dir.into(),
            connector: web_connector(),
        }
    }

    /// Reach servers through `connector` instead of HTTP.
    #[must_use]
    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connector = connector;
        self
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn active_server(&self) -> anyhow::Result<RemoteServer> {
        Ok(self.settings.settings.active_server()?)
    }

    pub fn client_tool(&self, server: &RemoteServer) -> anyhow::Result<AnonClientTool> {
        let client = (self.connector)(server, &self.settings.settings)?;
        Ok(AnonClientTool::new(client, server.clone()))
    }

    pub fn batch_folder(&self) -> BatchFolder {
        BatchFolder::new(&self.current_dir)
    }

    pub fn mapping_folder(&self) -> MappingFolder {
        MappingFolder::new(&self.current_dir)
    }
}
