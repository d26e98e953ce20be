//! Parameters for a single job, with validation and the mapping to job
//! creation keywords.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::JobSetError;
use crate::identifier::SourceIdentifier;
use crate::parameter::{Parameter, ParameterKind};
use crate::path::WinPath;
use crate::set::ParameterSet;

/// The two shapes of job the server can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Data is read from a UNC share.
    Path,
    /// Data is retrieved from the PACS.
    Pacs,
}

/// A parameter set that should create exactly one job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobParameterSet {
    parameters: ParameterSet,
}

impl JobParameterSet {
    pub fn new(
        parameters: impl IntoIterator<Item = Parameter>,
        defaults: impl IntoIterator<Item = Parameter>,
    ) -> Self {
        Self {
            parameters: ParameterSet::merge(parameters, defaults),
        }
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn get(&self, kind: ParameterKind) -> Option<&Parameter> {
        self.parameters.get(kind)
    }

    pub fn source(&self) -> Option<&SourceIdentifier> {
        self.parameters.source()
    }

    /// Keyword used for this kind in job creation calls. Sources are
    /// handled separately, the root source path is never sent.
    pub fn keyword(kind: ParameterKind) -> Option<&'static str> {
        match kind {
            ParameterKind::DestinationPath => Some("destination_path"),
            ParameterKind::PseudoId => Some("anon_id"),
            ParameterKind::PseudoName => Some("anon_name"),
            ParameterKind::Project => Some("project_name"),
            ParameterKind::Description => Some("description"),
            ParameterKind::PimsKey => Some("pims_keyfile_id"),
            ParameterKind::Source | ParameterKind::RootSourcePath => None,
        }
    }

    /// Which creation call this set needs.
    pub fn job_kind(&self) -> Result<JobKind, JobSetError> {
        let source = self.source().ok_or_else(|| {
            JobSetError::mapping(
                "No source identifier found. A job cannot be created without \
                 knowing where to get the data",
            )
        })?;
        if source.is_pacs() {
            Ok(JobKind::Pacs)
        } else if source.is_path() {
            Ok(JobKind::Path)
        } else {
            Err(JobSetError::mapping(format!("Unknown source '{source}'")))
        }
    }

    /// The root source path, which must be absolute.
    pub fn absolute_root_path(&self) -> Result<WinPath, JobSetError> {
        let Some(root) = self.get(ParameterKind::RootSourcePath) else {
            return Err(JobSetError::NoAbsoluteRootPath {
                message: "No absolute root path defined".to_string(),
            });
        };
        match root.path() {
            Some(path) if path.is_absolute() => Ok(path),
            _ => Err(JobSetError::NoAbsoluteRootPath {
                message: format!("Root path '{}' is not absolute", root.value()),
            }),
        }
    }

    /// All parameters with every path made absolute and checked to be UNC.
    ///
    /// A root source path is dropped when the source does not read from a
    /// path, it has nothing to resolve.
    pub fn resolve_absolute_paths(&self) -> Result<Vec<Parameter>, JobSetError> {
        let path_source = self.source().is_some_and(SourceIdentifier::is_path);
        let mut resolved = Vec::with_capacity(self.parameters.len());
        for param in &self.parameters {
            if !path_source && param.kind() == ParameterKind::RootSourcePath {
                continue;
            }
            let Some(path) = param.path() else {
                resolved.push(param.clone());
                continue;
            };
            let param = if path.is_absolute() {
                param.clone()
            } else {
                let root = self.absolute_root_path()?;
                param
                    .as_absolute(&root)
                    .map_err(|err| JobSetError::mapping(err.to_string()))?
            };
            if !param.path().is_some_and(|path| path.is_unc()) {
                return Err(JobSetError::mapping(format!(
                    "'{}' is not a UNC path. It will not be clear where this path \
                     is outside the current computer",
                    param.value()
                )));
            }
            resolved.push(param);
        }
        Ok(resolved)
    }

    /// Check that this set can be used to create a job.
    pub fn validate(&self) -> Result<(), JobSetError> {
        for required in [
            ParameterKind::Source,
            ParameterKind::DestinationPath,
            ParameterKind::Project,
        ] {
            if self.get(required).is_none_or(Parameter::is_empty) {
                return Err(JobSetError::Validation {
                    message: format!("Missing required parameter '{required}'"),
                });
            }
        }
        self.job_kind()
            .and_then(|_| self.resolve_absolute_paths())
            .map_err(|err| JobSetError::Validation {
                message: format!(
                    "Error: {err}. Source and destination need to be absolute \
                     windows paths."
                ),
            })?;
        Ok(())
    }

    /// Keyword arguments for the job creation call.
    pub fn as_job_kwargs(&self) -> Result<BTreeMap<String, String>, JobSetError> {
        self.job_kind()?;
        let mut kwargs = BTreeMap::new();
        for param in self.resolve_absolute_paths()? {
            match &param {
                Parameter::Source(source) if source.is_pacs() => {
                    kwargs.insert("source_instance_id".to_string(), source.legacy_idis_value());
                }
                Parameter::Source(source) => match source.path() {
                    Some(path) => {
                        kwargs.insert("source_path".to_string(), path.to_string());
                    }
                    None => {
                        return Err(JobSetError::mapping(format!(
                            "Unknown source parameter '{param}'"
                        )));
                    }
                },
                other => {
                    if let Some(keyword) = Self::keyword(other.kind()) {
                        kwargs.insert(keyword.to_string(), other.value());
                    }
                }
            }
        }
        debug!(keywords = kwargs.len(), "mapped job parameters");
        Ok(kwargs)
    }
}

impl From<ParameterSet> for JobParameterSet {
    fn from(parameters: ParameterSet) -> Self {
        Self { parameters }
    }
}
