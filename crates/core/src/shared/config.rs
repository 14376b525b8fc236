use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_MODEL_PATH, DEFAULT_TOLERANCE,
    DEFAULT_TRAINING_DIR, EXTRACTOR_INTERPRETER, EXTRACTOR_SCRIPT, WRITER_PROGRAM,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Tool locations and defaults, built once at startup and handed to the
/// use cases by reference.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Interpreter used to run the recognition script.
    pub extractor_interpreter: String,
    /// Recognition script path.
    pub extractor_script: PathBuf,
    /// Metadata writer executable.
    pub writer_program: String,
    pub training_dir: PathBuf,
    pub model_path: PathBuf,
    pub tolerance: f64,
    /// Per-subprocess timeout. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extractor_interpreter: EXTRACTOR_INTERPRETER.to_string(),
            extractor_script: PathBuf::from(EXTRACTOR_SCRIPT),
            writer_program: WRITER_PROGRAM.to_string(),
            training_dir: PathBuf::from(DEFAULT_TRAINING_DIR),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            tolerance: DEFAULT_TOLERANCE,
            timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Platform config location, e.g. `~/.config/FaceTagger/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| config_file_in(&d))
    }

    /// Reads a JSON config file. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given, else the platform config file if one
    /// exists, else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("Loading config from {}", path.display());
                Self::load_from(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn config_file_in(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}
