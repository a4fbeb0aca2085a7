//! Project configuration.
//!
//! A project may carry a `scriptpack.toml` next to its sources. Settings from
//! the file are combined with the command line: switches are enabled if either
//! side enables them, exclusion lists are concatenated, and an entry point given
//! on the command line replaces the one in the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::entry::EntryPoint;
use crate::rewrite::PipelineConfig;

/// Name of the per-project configuration file.
pub const CONFIG_FILE: &str = "scriptpack.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `scriptpack.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub entry_name: Option<String>,
    pub entry_base: Option<String>,
    /// Directory names skipped during discovery.
    pub exclude_directories: Vec<String>,
    /// Glob patterns of files skipped during discovery.
    pub exclude_files: Vec<String>,
    pub remove_comments: bool,
    pub remove_documentation: bool,
    pub minify: bool,
}

impl Config {
    /// Load the configuration file of a project, or the defaults when it has
    /// none.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_toml(&text, &path)?;
        debug!(path = %path.display(), "loaded project configuration");
        Ok(config)
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The entry point named in the file, falling back to the defaults per
    /// field.
    pub fn entry_point(&self) -> EntryPoint {
        let default = EntryPoint::default();
        EntryPoint::new(
            self.entry_name.clone().unwrap_or(default.name),
            self.entry_base.clone().unwrap_or(default.base),
        )
    }

    /// Fold the file settings into `options`.
    pub fn apply(&self, options: &mut GenerateOptions) {
        options.pipeline.remove_comments |= self.remove_comments;
        options.pipeline.remove_documentation |= self.remove_documentation;
        options.pipeline.minify |= self.minify;

        let mut dirs = self.exclude_directories.clone();
        dirs.append(&mut options.exclude_directories);
        options.exclude_directories = dirs;

        let mut files = self.exclude_files.clone();
        files.append(&mut options.exclude_files);
        options.exclude_files = files;
    }
}

/// Everything one generation run needs besides its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub pipeline: PipelineConfig,
    pub entry: EntryPoint,
    /// Check the tree after every pass and re-parse the result.
    pub verify: bool,
    pub exclude_directories: Vec<String>,
    pub exclude_files: Vec<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            entry: EntryPoint::default(),
            verify: true,
            exclude_directories: Vec::new(),
            exclude_files: Vec::new(),
        }
    }
}
