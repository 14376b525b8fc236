use std::path::Path;
use std::time::Instant;

use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::processing_summary::ProcessingSummary;
use crate::pipeline::tag_image_use_case::{TagImageUseCase, TagOutcome};
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::recognition::domain::inference_result::{InferenceResult, RecognitionEntry};
use crate::shared::error::PipelineError;

/// Directory pipeline: check inputs → recognize → parse → resolve → tag.
///
/// Everything up to and including resolution is all-or-nothing; once
/// tagging starts, a failure on one image is logged and the next image
/// is attempted.
pub struct ProcessDirectoryUseCase {
    recognizer: Box<dyn FaceRecognizer>,
    tagger: TagImageUseCase,
    logger: Box<dyn PipelineLogger>,
}

impl ProcessDirectoryUseCase {
    pub fn new(
        recognizer: Box<dyn FaceRecognizer>,
        tagger: TagImageUseCase,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            recognizer,
            tagger,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        process_dir: &Path,
        model_path: &Path,
        tolerance: f64,
    ) -> Result<ProcessingSummary, PipelineError> {
        if !process_dir.is_dir() {
            return Err(PipelineError::DirectoryNotFound(process_dir.to_path_buf()));
        }
        if !model_path.exists() {
            return Err(PipelineError::ModelNotFound(model_path.to_path_buf()));
        }
        self.recognizer.ensure_available()?;

        self.logger.info(&format!(
            "Recognizing faces in {} (tolerance {tolerance})",
            process_dir.display()
        ));
        let start = Instant::now();
        let raw = self
            .recognizer
            .recognize_directory(process_dir, model_path, tolerance)?;
        self.logger
            .timing("recognize", start.elapsed().as_secs_f64() * 1000.0);

        let result = InferenceResult::parse(&raw)?;
        let images = result.resolve(process_dir)?;

        let mut summary = ProcessingSummary {
            images_seen: images.len(),
            ..Default::default()
        };
        let total = images.len();

        for (index, image) in images.iter().enumerate() {
            match image.entry {
                RecognitionEntry::Failed(failure) => {
                    summary.recognition_failures += 1;
                    self.logger.warn(&format!(
                        "Recognition failed for {}: {}",
                        image.identifier, failure.error
                    ));
                }
                RecognitionEntry::People(people) if people.is_empty() => {
                    log::debug!("No known faces in {}", image.identifier);
                }
                RecognitionEntry::People(people) => {
                    summary.images_with_people += 1;
                    let start = Instant::now();
                    match self.tagger.execute(&image.path, people) {
                        Ok(TagOutcome::Tagged(names)) => {
                            summary.images_tagged += 1;
                            self.logger.info(&format!(
                                "Tagged {} with: {}",
                                image.identifier,
                                names.join(", ")
                            ));
                        }
                        Ok(TagOutcome::NoPeople) => {
                            log::debug!("No names to write for {}", image.identifier);
                        }
                        Ok(TagOutcome::WriterUnavailable) => {
                            summary.skipped_writer_unavailable += 1;
                        }
                        Err(e) if !e.is_fatal() => {
                            self.logger.warn(&e.to_string());
                            summary
                                .tagging_failures
                                .push((image.path.clone(), e.to_string()));
                        }
                        Err(e) => return Err(e),
                    }
                    self.logger
                        .timing("tag", start.elapsed().as_secs_f64() * 1000.0);
                }
            }
            self.logger.progress(index + 1, total);
        }

        self.logger.info(&summary.to_string());
        self.logger.summary();
        Ok(summary)
    }
}
