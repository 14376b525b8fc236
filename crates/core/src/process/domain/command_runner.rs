use std::ffi::OsString;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// A fully described external program invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program name as UTF-8 (lossy), for messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a process that ran to completion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandOutput {
    /// `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code for messages, `"signal"` when there is none.
    pub fn code_label(&self) -> String {
        self.code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string())
    }
}

/// The process could not be run to completion. A non-zero exit is not
/// an error at this level; see [`CommandOutput::success`].
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("program not found: {0}")]
    NotFound(String),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} timed out after {}s", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Domain interface for running external programs.
pub trait CommandRunner: Send {
    /// Runs the command to completion, capturing stdout and stderr.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;

    /// Whether `program` can be started, checked by running it with
    /// `version_arg`.
    fn is_available(&self, program: &str, version_arg: &str) -> bool {
        self.run(&CommandSpec::new(program).arg(version_arg)).is_ok()
    }
}
