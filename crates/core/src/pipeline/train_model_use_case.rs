use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::shared::error::PipelineError;

/// Outcome of a successful training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingReport {
    pub model_path: PathBuf,
    /// Face encodings the engine reported, when it said.
    pub faces: Option<usize>,
}

/// Training pipeline: check inputs → train → verify the model was written.
pub struct TrainModelUseCase {
    recognizer: Box<dyn FaceRecognizer>,
    logger: Box<dyn PipelineLogger>,
}

impl TrainModelUseCase {
    pub fn new(recognizer: Box<dyn FaceRecognizer>, logger: Box<dyn PipelineLogger>) -> Self {
        Self { recognizer, logger }
    }

    /// Trains from `training_dir/<person>/<image>`, replacing any model
    /// already at `model_path`.
    pub fn execute(
        &mut self,
        training_dir: &Path,
        model_path: &Path,
    ) -> Result<TrainingReport, PipelineError> {
        if !training_dir.is_dir() {
            return Err(PipelineError::DirectoryNotFound(training_dir.to_path_buf()));
        }
        if count_person_dirs(training_dir) == 0 {
            self.logger.warn(&format!(
                "{} has no per-person sub-directories; nothing to learn from",
                training_dir.display()
            ));
        }
        self.recognizer.ensure_available()?;

        self.logger.info(&format!(
            "Training model from {} into {}",
            training_dir.display(),
            model_path.display()
        ));
        let start = Instant::now();
        let output = self.recognizer.train(training_dir, model_path)?;
        self.logger
            .timing("train", start.elapsed().as_secs_f64() * 1000.0);

        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            log::debug!("{line}");
        }

        let faces = parse_face_count(&output);
        if faces == Some(0) || !model_path.is_file() {
            return Err(PipelineError::ModelNotWritten(model_path.to_path_buf()));
        }

        match faces {
            Some(n) => self.logger.info(&format!("Training complete: {n} face(s) learned")),
            None => self.logger.info("Training complete"),
        }
        self.logger.summary();

        Ok(TrainingReport {
            model_path: model_path.to_path_buf(),
            faces,
        })
    }
}

fn count_person_dirs(training_dir: &Path) -> usize {
    fs::read_dir(training_dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_dir())
                .count()
        })
        .unwrap_or(0)
}

/// Reads N from the engine's `Training complete! Processed N face(s)` line.
fn parse_face_count(output: &str) -> Option<usize> {
    output.lines().rev().find_map(|line| {
        let (_, rest) = line.split_once("Processed ")?;
        let end = rest.find(|c: char| !c.is_ascii_digit())?;
        if !rest[end..].starts_with(" face") {
            return None;
        }
        rest[..end].parse().ok()
    })
}
