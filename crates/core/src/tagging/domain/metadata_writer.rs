use std::path::Path;

use crate::shared::error::PipelineError;

/// Domain interface for writing recognized names into image metadata.
pub trait MetadataWriter: Send {
    /// Name shown in warnings when the writer is missing.
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Appends every name in `people` to the image's keyword, subject and
    /// person fields in a single write. The file is overwritten in place.
    fn write_people(&self, image: &Path, people: &[String]) -> Result<(), PipelineError>;
}
