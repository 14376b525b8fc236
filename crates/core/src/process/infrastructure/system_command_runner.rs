use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::process::domain::command_runner::{
    CommandError, CommandOutput, CommandRunner, CommandSpec,
};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Runs commands as real child processes.
///
/// Both output pipes are drained on helper threads so a child that fills
/// one pipe cannot block while the caller waits on the other. When the
/// command carries a timeout, the child is polled and killed at the deadline,
/// and the same deadline bounds the wait for the pipes to close.
pub struct SystemCommandRunner {
    poll_interval: Duration,
}

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let program = spec.program_name();
        log::debug!("Running: {spec}");

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => CommandError::NotFound(program.clone()),
                _ => CommandError::Spawn {
                    program: program.clone(),
                    source: e,
                },
            })?;

        let (tx, rx) = crossbeam_channel::bounded(2);
        if let Some(out) = child.stdout.take() {
            spawn_reader(Stream::Stdout, out, tx.clone());
        }
        if let Some(err) = child.stderr.take() {
            spawn_reader(Stream::Stderr, err, tx.clone());
        }
        drop(tx);

        let deadline = spec.timeout.map(|timeout| (Instant::now() + timeout, timeout));
        let status = match deadline {
            Some((at, timeout)) => self.wait_with_deadline(&mut child, &program, at, timeout)?,
            None => child.wait().map_err(|source| CommandError::Io {
                program: program.clone(),
                source,
            })?,
        };

        let mut output = CommandOutput {
            code: status.code(),
            ..Default::default()
        };
        collect_output(&rx, &program, deadline, &mut output)?;

        log::debug!("{program} exited with {}", output.code_label());
        Ok(output)
    }
}

impl SystemCommandRunner {
    fn wait_with_deadline(
        &self,
        child: &mut Child,
        program: &str,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<ExitStatus, CommandError> {
        loop {
            let polled = child.try_wait().map_err(|source| CommandError::Io {
                program: program.to_string(),
                source,
            })?;
            if let Some(status) = polled {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
            thread::sleep(self.poll_interval);
        }
    }
}

type Chunk = (Stream, io::Result<Vec<u8>>);

/// Waits for both readers. A process the child left running can keep a pipe
/// open after the child exits, so the deadline applies here too.
fn collect_output(
    rx: &Receiver<Chunk>,
    program: &str,
    deadline: Option<(Instant, Duration)>,
    output: &mut CommandOutput,
) -> Result<(), CommandError> {
    loop {
        let received = match deadline {
            Some((at, timeout)) => match rx.recv_deadline(at) {
                Ok(chunk) => chunk,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(CommandError::TimedOut {
                        program: program.to_string(),
                        timeout,
                    })
                }
            },
            None => match rx.recv() {
                Ok(chunk) => chunk,
                Err(_) => return Ok(()),
            },
        };

        let (stream, bytes) = received;
        let bytes = bytes.map_err(|source| CommandError::Io {
            program: program.to_string(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        match stream {
            Stream::Stdout => output.stdout = text,
            Stream::Stderr => output.stderr = text,
        }
    }
}

fn spawn_reader<R>(stream: Stream, mut pipe: R, tx: Sender<Chunk>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        let result = pipe.read_to_end(&mut buf).map(|_| buf);
        // Receiver is gone only if the caller already gave up on the child.
        let _ = tx.send((stream, result));
    });
}
