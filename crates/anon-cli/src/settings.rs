//! User settings, kept as YAML in the home directory.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anon_client::RemoteServer;
use anon_map::Dialect;
use anon_model::{Parameter, WinPath};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Settings file name in the home directory.
pub const SETTINGS_FILE_NAME: &str = "AnonWebAPIClientSettings.yml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine home directory to look for {SETTINGS_FILE_NAME}")]
    NoHomeDirectory,

    #[error("failed to read settings at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read all settings from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("no active server. Set one with 'anon server activate'")]
    NoActiveServer,

    #[error("unknown server '{name}', known servers: {known:?}")]
    UnknownServer { name: String, known: Vec<String> },

    #[error("a server named '{name}' already exists")]
    DuplicateServer { name: String },

    #[error(
        "active server name '{name}' was not found in list of servers {known:?}. \
         I don't know what the active server is supposed to be"
    )]
    InvalidActiveServer { name: String, known: Vec<String> },

    #[error("list separator should be ',' or ';', found '{value}'")]
    InvalidListSeparator { value: char },
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Values used for a job when the mapping does not give them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefaultParameters {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub destination_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Server name to url.
    pub servers: BTreeMap<String, String>,
    pub active_server_name: Option<String>,
    pub user_name: String,
    pub user_token: String,
    #[serde(default)]
    pub job_default_parameters: JobDefaultParameters,
    /// Delimiter for new mappings. Taken from the locale when not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_separator: Option<char>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            servers: BTreeMap::from([("test".to_string(), "https://hostname_of_api".to_string())]),
            active_server_name: Some("test".to_string()),
            user_name: "username".to_string(),
            user_token: "token".to_string(),
            job_default_parameters: JobDefaultParameters::default(),
            list_separator: None,
        }
    }
}

impl Settings {
    fn server_names(&self) -> Vec<String> {
        self.servers.keys().cloned().collect()
    }

    /// Every server, ordered by name.
    pub fn servers(&self) -> Vec<RemoteServer> {
        self.servers
            .iter()
            .map(|(name, url)| RemoteServer::new(name, url))
            .collect()
    }

    pub fn server(&self, name: &str) -> Result<RemoteServer> {
        self.servers
            .get(name)
            .map(|url| RemoteServer::new(name, url))
            .ok_or_else(|| SettingsError::UnknownServer {
                name: name.to_string(),
                known: self.server_names(),
            })
    }

    pub fn active_server(&self) -> Result<RemoteServer> {
        let name = self
            .active_server_name
            .as_deref()
            .ok_or(SettingsError::NoActiveServer)?;
        self.server(name)
    }

    pub fn add_server(&mut self, server: &RemoteServer) -> Result<()> {
        if self.servers.contains_key(&server.name) {
            return Err(SettingsError::DuplicateServer {
                name: server.name.clone(),
            });
        }
        self.servers.insert(server.name.clone(), server.url.clone());
        Ok(())
    }

    /// Remove a server. Removing the active server leaves no server active.
    pub fn remove_server(&mut self, name: &str) -> Result<RemoteServer> {
        let server = self.server(name)?;
        self.servers.remove(name);
        if self.active_server_name.as_deref() == Some(name) {
            self.active_server_name = None;
        }
        Ok(server)
    }

    pub fn activate(&mut self, name: &str) -> Result<RemoteServer> {
        let server = self.server(name)?;
        self.active_server_name = Some(server.name.clone());
        Ok(server)
    }

    /// Delimiter for new mappings.
    pub fn dialect(&self) -> Result<Dialect> {
        match self.list_separator {
            Some(value) => {
                Dialect::from_char(value).ok_or(SettingsError::InvalidListSeparator { value })
            }
            None => Ok(Dialect::local()),
        }
    }

    /// Default destination and project as parameters. Unset values give
    /// empty parameters, which do not pass job validation.
    pub fn default_parameters(&self) -> Vec<Parameter> {
        let defaults = &self.job_default_parameters;
        vec![
            Parameter::DestinationPath(WinPath::new(&defaults.destination_path)),
            Parameter::Project(defaults.project_name.clone()),
        ]
    }

    fn check(&self) -> Result<()> {
        if let Some(name) = &self.active_server_name
            && !self.servers.contains_key(name)
        {
            return Err(SettingsError::InvalidActiveServer {
                name: name.clone(),
                known: self.server_names(),
            });
        }
        if let Some(value) = self.list_separator {
            Dialect::from_char(value).ok_or(SettingsError::InvalidListSeparator { value })?;
        }
        Ok(())
    }
}

/// Settings bound to the file they were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsFile {
    path: PathBuf,
    pub settings: Settings,
}

impl SettingsFile {
    /// Default location, `<home>/AnonWebAPIClientSettings.yml`.
    pub fn default_path() -> Result<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(SETTINGS_FILE_NAME))
            .ok_or(SettingsError::NoHomeDirectory)
    }

    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        let settings: Settings =
            serde_yaml::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?;
        settings.check()?;
        debug!(path = %path.display(), servers = settings.servers.len(), "loaded settings");
        Ok(Self { path, settings })
    }

    /// Load settings, writing default settings first when there are none.
    pub fn load_or_create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            return Self::load(path);
        }
        let file = Self::new(path, Settings::default());
        file.save()?;
        info!(path = %file.path.display(), "no settings found, created default settings");
        Ok(file)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let content = serde_yaml::to_string(&self.settings)?;
        fs::write(&self.path, content).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
