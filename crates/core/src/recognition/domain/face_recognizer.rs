use std::path::Path;

use crate::shared::error::PipelineError;

/// Domain interface for the external face recognition engine.
///
/// The engine owns the model format; callers only pass its path through.
pub trait FaceRecognizer: Send {
    /// Fails with `EnvironmentMissing` when the engine cannot be run.
    fn ensure_available(&self) -> Result<(), PipelineError>;

    /// Trains a model from `training_dir/<person>/<image>` and writes it to
    /// `model_path`. Returns the engine's human-readable report.
    fn train(&self, training_dir: &Path, model_path: &Path) -> Result<String, PipelineError>;

    /// Runs recognition over every image in `process_dir` and returns the
    /// engine's raw JSON document.
    fn recognize_directory(
        &self,
        process_dir: &Path,
        model_path: &Path,
        tolerance: f64,
    ) -> Result<String, PipelineError>;
}
