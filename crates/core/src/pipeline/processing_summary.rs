use std::fmt;
use std::path::PathBuf;

/// Counters for one processing run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessingSummary {
    /// Entries in the recognition output.
    pub images_seen: usize,
    /// Entries with at least one recognized name.
    pub images_with_people: usize,
    pub images_tagged: usize,
    /// Entries the engine itself reported as failed.
    pub recognition_failures: usize,
    /// Images with people that were not tagged because the writer is missing.
    pub skipped_writer_unavailable: usize,
    /// Images whose write failed, with the reason.
    pub tagging_failures: Vec<(PathBuf, String)>,
}

impl ProcessingSummary {
    pub fn has_failures(&self) -> bool {
        !self.tagging_failures.is_empty() || self.recognition_failures > 0
    }
}

impl fmt::Display for ProcessingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} image(s) processed, {} with recognized people, {} tagged",
            self.images_seen, self.images_with_people, self.images_tagged
        )?;
        if !self.tagging_failures.is_empty() {
            write!(f, ", {} tagging failure(s)", self.tagging_failures.len())?;
        }
        if self.recognition_failures > 0 {
            write!(f, ", {} recognition failure(s)", self.recognition_failures)?;
        }
        if self.skipped_writer_unavailable > 0 {
            write!(
                f,
                ", {} skipped (metadata writer unavailable)",
                self.skipped_writer_unavailable
            )?;
        }
        Ok(())
    }
}
