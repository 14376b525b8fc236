use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use crate::process::domain::command_runner::{CommandRunner, CommandSpec};
use crate::shared::config::PipelineConfig;
use crate::shared::constants::TAG_FIELDS;
use crate::shared::error::PipelineError;
use crate::tagging::domain::metadata_writer::MetadataWriter;

/// Writes names with `exiftool` using additive (`+=`) updates.
///
/// `-overwrite_original` means no `_original` backup is kept; the write
/// cannot be undone.
pub struct ExiftoolWriter {
    runner: Box<dyn CommandRunner>,
    program: String,
    timeout: Option<Duration>,
}

impl ExiftoolWriter {
    pub fn new(runner: Box<dyn CommandRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout: None,
        }
    }

    pub fn from_config(runner: Box<dyn CommandRunner>, config: &PipelineConfig) -> Self {
        Self::new(runner, config.writer_program.clone()).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One `-<field>+=<name>` directive per field per name, fields outermost.
pub fn tag_arguments(image: &Path, people: &[String]) -> Vec<OsString> {
    let mut args: Vec<OsString> = TAG_FIELDS
        .iter()
        .flat_map(|field| {
            people
                .iter()
                .map(move |name| OsString::from(format!("-{field}+={name}")))
        })
        .collect();
    args.push("-overwrite_original".into());
    args.push(image.as_os_str().to_owned());
    args
}

impl MetadataWriter for ExiftoolWriter {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        self.runner.is_available(&self.program, "-ver")
    }

    fn write_people(&self, image: &Path, people: &[String]) -> Result<(), PipelineError> {
        let spec = CommandSpec::new(&self.program)
            .args(tag_arguments(image, people))
            .with_timeout(self.timeout);

        let output = self
            .runner
            .run(&spec)
            .map_err(|e| PipelineError::TaggingFailure {
                path: image.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !output.success() {
            let detail = output.stderr.trim();
            return Err(PipelineError::TaggingFailure {
                path: image.to_path_buf(),
                reason: if detail.is_empty() {
                    format!("{} exited with {}", self.program, output.code_label())
                } else {
                    detail.to_string()
                },
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::domain::command_runner::{CommandError, CommandOutput};
    use std::sync::{Arc, Mutex};

    struct StubRunner {
        code: Option<i32>,
        stderr: String,
        calls: Arc<Mutex<Vec<CommandSpec>>>,
    }

    impl StubRunner {
        fn exiting(code: Option<i32>) -> Self {
            Self {
                code,
                stderr: String::new(),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl CommandRunner for StubRunner {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
            self.calls.lock().unwrap().push(spec.clone());
            match self.code {
                Some(code) => Ok(CommandOutput {
                    code: Some(code),
                    stdout: String::new(),
                    stderr: self.stderr.clone(),
                }),
                None => Err(CommandError::NotFound(spec.program_name())),
            }
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_arguments_single_name() {
        let args = tag_arguments(Path::new("photos/a.jpg"), &names(&["Alice"]));
        assert_eq!(
            strings(&args),
            vec![
                "-Keywords+=Alice",
                "-Subject+=Alice",
                "-XMP-iptcExt:PersonInImage+=Alice",
                "-overwrite_original",
                "photos/a.jpg",
            ]
        );
    }

    #[test]
    fn test_arguments_keep_name_order_per_field() {
        let args = strings(&tag_arguments(Path::new("a.jpg"), &names(&["Bob", "Alice"])));
        assert_eq!(args[0], "-Keywords+=Bob");
        assert_eq!(args[1], "-Keywords+=Alice");
        assert_eq!(args[2], "-Subject+=Bob");
        assert_eq!(args[5], "-XMP-iptcExt:PersonInImage+=Alice");
        assert_eq!(args.len(), 8);
    }

    #[test]
    fn test_arguments_keep_spaces_in_names() {
        let args = strings(&tag_arguments(Path::new("a.jpg"), &names(&["Mary Ann"])));
        assert_eq!(args[0], "-Keywords+=Mary Ann");
    }

    #[test]
    fn test_write_invokes_program_once() {
        let runner = StubRunner::exiting(Some(0));
        let calls = runner.calls.clone();
        let writer = ExiftoolWriter::new(Box::new(runner), "exiftool");

        writer
            .write_people(Path::new("a.jpg"), &names(&["Alice", "Bob"]))
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, OsString::from("exiftool"));
        assert_eq!(calls[0].args.len(), 8);
    }

    #[test]
    fn test_nonzero_exit_is_tagging_failure() {
        let mut runner = StubRunner::exiting(Some(1));
        runner.stderr = "Error: File not found - a.jpg\n".to_string();
        let writer = ExiftoolWriter::new(Box::new(runner), "exiftool");

        match writer.write_people(Path::new("a.jpg"), &names(&["Alice"])) {
            Err(PipelineError::TaggingFailure { path, reason }) => {
                assert_eq!(path, Path::new("a.jpg"));
                assert_eq!(reason, "Error: File not found - a.jpg");
            }
            other => panic!("expected TaggingFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_spawn_failure_is_tagging_failure() {
        let writer = ExiftoolWriter::new(Box::new(StubRunner::exiting(None)), "exiftool");
        let result = writer.write_people(Path::new("a.jpg"), &names(&["Alice"]));
        assert!(matches!(result, Err(PipelineError::TaggingFailure { .. })));
    }

    #[test]
    fn test_availability_uses_version_flag() {
        let runner = StubRunner::exiting(Some(0));
        let calls = runner.calls.clone();
        let writer = ExiftoolWriter::new(Box::new(runner), "exiftool");

        assert!(writer.is_available());
        assert_eq!(strings(&calls.lock().unwrap()[0].args), vec!["-ver"]);
        assert!(!ExiftoolWriter::new(Box::new(StubRunner::exiting(None)), "exiftool").is_available());
    }
}
