use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::process::domain::command_runner::{CommandError, CommandRunner, CommandSpec};
use crate::recognition::domain::face_recognizer::FaceRecognizer;
use crate::shared::config::PipelineConfig;
use crate::shared::error::PipelineError;

/// Drives the recognition script (`<interpreter> <script> ...`) as a
/// child process.
pub struct ScriptFaceRecognizer {
    runner: Box<dyn CommandRunner>,
    interpreter: String,
    script: PathBuf,
    timeout: Option<Duration>,
}

impl ScriptFaceRecognizer {
    pub fn new(
        runner: Box<dyn CommandRunner>,
        interpreter: impl Into<String>,
        script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            interpreter: interpreter.into(),
            script: script.into(),
            timeout: None,
        }
    }

    pub fn from_config(runner: Box<dyn CommandRunner>, config: &PipelineConfig) -> Self {
        Self::new(
            runner,
            config.extractor_interpreter.clone(),
            config.extractor_script.clone(),
        )
        .with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.interpreter)
            .arg(&self.script)
            .with_timeout(self.timeout)
    }

    fn run_checked(&self, spec: CommandSpec) -> Result<String, PipelineError> {
        let tool = self.script.display().to_string();
        let output = self.runner.run(&spec).map_err(|e| match e {
            CommandError::NotFound(program) => PipelineError::EnvironmentMissing {
                what: program,
                hint: setup_hint(),
            },
            other => PipelineError::ExternalTool {
                tool: tool.clone(),
                code: "none".to_string(),
                stderr: other.to_string(),
            },
        })?;

        if !output.success() {
            return Err(PipelineError::ExternalTool {
                tool,
                code: output.code_label(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        if !output.stderr.trim().is_empty() {
            for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
                log::warn!("{line}");
            }
        }
        Ok(output.stdout)
    }
}

impl FaceRecognizer for ScriptFaceRecognizer {
    fn ensure_available(&self) -> Result<(), PipelineError> {
        if !self.runner.is_available(&self.interpreter, "--version") {
            return Err(PipelineError::EnvironmentMissing {
                what: self.interpreter.clone(),
                hint: setup_hint(),
            });
        }
        if !self.script.is_file() {
            return Err(PipelineError::EnvironmentMissing {
                what: self.script.display().to_string(),
                hint: setup_hint(),
            });
        }
        Ok(())
    }

    fn train(&self, training_dir: &Path, model_path: &Path) -> Result<String, PipelineError> {
        let spec = self
            .command()
            .arg("--train")
            .arg(training_dir)
            .arg("--model")
            .arg(model_path);
        self.run_checked(spec)
    }

    fn recognize_directory(
        &self,
        process_dir: &Path,
        model_path: &Path,
        tolerance: f64,
    ) -> Result<String, PipelineError> {
        let spec = self
            .command()
            .arg("--process-dir")
            .arg(process_dir)
            .arg("--model")
            .arg(model_path)
            .arg("--tolerance")
            .arg(tolerance.to_string());
        self.run_checked(spec)
    }
}

fn setup_hint() -> String {
    "install Python 3 with the face_recognition and scikit-learn packages, \
     then point extractor_script at facial_recognition.py"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::domain::command_runner::CommandOutput;
    use rstest::rstest;
    use std::ffi::OsString;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    // --- Stubs ---

    struct StubRunner {
        output: Option<CommandOutput>,
        calls: Arc<Mutex<Vec<CommandSpec>>>,
    }

    impl StubRunner {
        fn new(output: Option<CommandOutput>) -> Self {
            Self {
                output,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl CommandRunner for StubRunner {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
            self.calls.lock().unwrap().push(spec.clone());
            self.output
                .clone()
                .ok_or_else(|| CommandError::NotFound(spec.program_name()))
        }
    }

    fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn args_of(spec: &CommandSpec) -> Vec<String> {
        spec.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    // --- Tests ---

    #[test]
    fn test_train_arguments() {
        let runner = StubRunner::new(Some(ok("Training complete! Processed 2 face(s)\n")));
        let calls = runner.calls.clone();
        let recognizer = ScriptFaceRecognizer::new(Box::new(runner), "python3", "fr.py");

        let report = recognizer
            .train(Path::new("training"), Path::new("model.pkl"))
            .unwrap();

        assert!(report.contains("Processed 2"));
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].program, OsString::from("python3"));
        assert_eq!(
            args_of(&calls[0]),
            vec!["fr.py", "--train", "training", "--model", "model.pkl"]
        );
    }

    #[rstest]
    #[case(0.0, "0")]
    #[case(0.6, "0.6")]
    #[case(0.45, "0.45")]
    #[case(1.0, "1")]
    fn test_tolerance_passed_through(#[case] tolerance: f64, #[case] expected: &str) {
        let runner = StubRunner::new(Some(ok("{}")));
        let calls = runner.calls.clone();
        let recognizer = ScriptFaceRecognizer::new(Box::new(runner), "python3", "fr.py");

        recognizer
            .recognize_directory(Path::new("photos"), Path::new("model.pkl"), tolerance)
            .unwrap();

        let args = args_of(&calls.lock().unwrap()[0]);
        assert_eq!(
            args,
            vec![
                "fr.py",
                "--process-dir",
                "photos",
                "--model",
                "model.pkl",
                "--tolerance",
                expected
            ]
        );
        assert_eq!(expected.parse::<f64>().unwrap(), tolerance);
    }

    #[test]
    fn test_nonzero_exit_is_external_tool_error() {
        let runner = StubRunner::new(Some(CommandOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "Traceback: boom\n".to_string(),
        }));
        let recognizer = ScriptFaceRecognizer::new(Box::new(runner), "python3", "fr.py");

        match recognizer.train(Path::new("t"), Path::new("m.pkl")) {
            Err(PipelineError::ExternalTool { code, stderr, .. }) => {
                assert_eq!(code, "1");
                assert_eq!(stderr, "Traceback: boom");
            }
            other => panic!("expected ExternalTool, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_interpreter_is_environment_missing() {
        let recognizer = ScriptFaceRecognizer::new(Box::new(StubRunner::new(None)), "python3", "fr.py");
        let result = recognizer.recognize_directory(Path::new("p"), Path::new("m"), 0.6);
        assert!(matches!(result, Err(PipelineError::EnvironmentMissing { .. })));
    }

    #[test]
    fn test_ensure_available_requires_script_file() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("fr.py");
        let recognizer =
            ScriptFaceRecognizer::new(Box::new(StubRunner::new(Some(ok("Python 3.12")))), "python3", &script);

        assert!(matches!(
            recognizer.ensure_available(),
            Err(PipelineError::EnvironmentMissing { .. })
        ));

        fs::write(&script, "print('hi')").unwrap();
        assert!(recognizer.ensure_available().is_ok());
    }

    #[test]
    fn test_ensure_available_requires_interpreter() {
        let recognizer = ScriptFaceRecognizer::new(Box::new(StubRunner::new(None)), "python3", "fr.py");
        match recognizer.ensure_available() {
            Err(PipelineError::EnvironmentMissing { what, .. }) => assert_eq!(what, "python3"),
            other => panic!("expected EnvironmentMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_timeout_forwarded_to_command() {
        let runner = StubRunner::new(Some(ok("{}")));
        let calls = runner.calls.clone();
        let config = PipelineConfig {
            timeout_secs: Some(90),
            ..PipelineConfig::default()
        };
        let recognizer = ScriptFaceRecognizer::from_config(Box::new(runner), &config);

        recognizer
            .recognize_directory(Path::new("p"), Path::new("m"), 0.6)
            .unwrap();

        assert_eq!(calls.lock().unwrap()[0].timeout, Some(Duration::from_secs(90)));
    }
}
