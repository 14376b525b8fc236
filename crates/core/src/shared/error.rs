use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds of the training / processing / tagging pipeline.
///
/// Kinds for which [`PipelineError::is_fatal`] returns `false` are reported
/// and skipped; every other kind ends the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{what} is not available: {hint}")]
    EnvironmentMissing { what: String, hint: String },

    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("model not found at {0}; run with --train first")]
    ModelNotFound(PathBuf),

    #[error("could not parse recognition output: {0}")]
    MalformedOutput(#[source] serde_json::Error),

    #[error("recognition output names {identifier}, which does not resolve to a file under {dir}")]
    UnresolvedImage { identifier: String, dir: PathBuf },

    #[error("{tool} failed (exit {code}): {stderr}")]
    ExternalTool {
        tool: String,
        code: String,
        stderr: String,
    },

    #[error("training finished but no model was written to {0}")]
    ModelNotWritten(PathBuf),

    #[error("{0} not found, skipping metadata tagging")]
    ToolUnavailable(String),

    #[error("failed to tag {path}: {reason}")]
    TaggingFailure { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PipelineError::ToolUnavailable(_) | PipelineError::TaggingFailure { .. }
        )
    }
}
