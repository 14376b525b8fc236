use std::cell::OnceCell;
use std::path::Path;

use crate::shared::error::PipelineError;
use crate::tagging::domain::metadata_writer::MetadataWriter;

#[derive(Clone, Debug, PartialEq)]
pub enum TagOutcome {
    /// Names written as given, exact duplicates once, in first-seen order.
    Tagged(Vec<String>),
    /// Nothing to write.
    NoPeople,
    WriterUnavailable,
}

/// Writes recognized names into one image's metadata.
///
/// Writer availability is checked on first use and remembered for the
/// lifetime of the use case, so a missing writer is reported once.
pub struct TagImageUseCase {
    writer: Box<dyn MetadataWriter>,
    available: OnceCell<bool>,
}

impl TagImageUseCase {
    pub fn new(writer: Box<dyn MetadataWriter>) -> Self {
        Self {
            writer,
            available: OnceCell::new(),
        }
    }

    pub fn writer_available(&self) -> bool {
        *self.available.get_or_init(|| {
            let available = self.writer.is_available();
            if !available {
                log::warn!("{}", PipelineError::ToolUnavailable(self.writer.name().to_string()));
            }
            available
        })
    }

    /// Appends `people` to the image's metadata in a single write.
    ///
    /// A missing writer is not an error; a failed write is a
    /// `TaggingFailure` for this image only.
    pub fn execute(&self, image: &Path, people: &[String]) -> Result<TagOutcome, PipelineError> {
        let names = distinct_names(people);
        if names.is_empty() {
            return Ok(TagOutcome::NoPeople);
        }
        if !self.writer_available() {
            log::debug!("Not tagging {}", image.display());
            return Ok(TagOutcome::WriterUnavailable);
        }

        self.writer.write_people(image, &names)?;
        Ok(TagOutcome::Tagged(names))
    }
}

fn distinct_names(people: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(people.len());
    for name in people {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}
