//! Subprocess execution utilities.
//!
//! [`ProcessBuilder::exec_streaming`] runs a program to completion while two
//! named reader threads forward its stdout and stderr, line by line, to a
//! [`LogSink`]. The caller blocks until the child exits; the readers then get
//! a bounded grace period to finish.

use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::util::args;
use crate::util::sink::{LogLevel, LogSink, TracingSink};

/// How long each stream reader may keep running after the child exits.
pub const DEFAULT_STREAM_GRACE: Duration = Duration::from_secs(3);

/// Failure to run a process to a successful exit.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no program to run")]
    EmptyCommand,

    #[error("failed to create working folder `{}`", .path.display())]
    WorkingFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {stream} of `{program}`")]
    Stream {
        program: String,
        stream: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` {}", describe_exit(.code))]
    NonZeroExit { program: String, code: Option<i32> },
}

impl ProcessError {
    /// Exit code of a process that ran and failed.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }

    /// Whether the process ran and reported failure, as opposed to never
    /// running or losing its output.
    pub fn is_non_zero_exit(&self) -> bool {
        matches!(self, ProcessError::NonZeroExit { .. })
    }

    /// Whether the program could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProcessError::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Where output goes and how long to wait for it.
#[derive(Clone)]
pub struct ExecOptions {
    pub sink: Arc<dyn LogSink>,
    pub stream_grace: Duration,
}

impl ExecOptions {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        ExecOptions {
            sink,
            stream_grace: DEFAULT_STREAM_GRACE,
        }
    }

    pub fn with_stream_grace(mut self, grace: Duration) -> Self {
        self.stream_grace = grace;
        self
    }
}

impl Default for ExecOptions {
    fn default() -> Self {
        ExecOptions::new(Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for ExecOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecOptions")
            .field("stream_grace", &self.stream_grace)
            .finish_non_exhaustive()
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Program and arguments from one vector. The vector must not be empty.
    pub fn from_command_line(command_line: &[String]) -> Result<Self, ProcessError> {
        match command_line.split_first() {
            Some((program, rest)) if !program.is_empty() => {
                Ok(ProcessBuilder::new(program).args(rest))
            }
            _ => Err(ProcessError::EmptyCommand),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory. It is created on execution.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Run to completion, forwarding output to `options.sink`.
    ///
    /// Only a zero exit status is `Ok`.
    pub fn exec_streaming(&self, options: &ExecOptions) -> Result<ExitStatus, ProcessError> {
        let program = self.program.display().to_string();
        if program.is_empty() {
            return Err(ProcessError::EmptyCommand);
        }

        if let Some(ref cwd) = self.cwd {
            std::fs::create_dir_all(cwd).map_err(|source| ProcessError::WorkingFolder {
                path: cwd.clone(),
                source,
            })?;
        }

        tracing::debug!("running `{}`", self.display_command());

        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;

        let mut readers = Vec::with_capacity(2);
        let streams = [
            (
                "stdout",
                LogLevel::Info,
                child.stdout.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
            ),
            (
                "stderr",
                LogLevel::Error,
                child.stderr.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
            ),
        ];
        for (stream, level, pipe) in streams {
            let Some(pipe) = pipe else { continue };
            match spawn_reader(stream, pipe, level, Arc::clone(&options.sink)) {
                Ok(rx) => readers.push((stream, rx)),
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ProcessError::Stream {
                        program,
                        stream,
                        source,
                    });
                }
            }
        }

        let status = child.wait().map_err(|source| ProcessError::Wait {
            program: program.clone(),
            source,
        })?;

        let mut stream_error = None;
        for (stream, rx) in readers {
            match rx.recv_timeout(options.stream_grace) {
                Ok(Ok(())) => {}
                Ok(Err(source)) => {
                    stream_error.get_or_insert(ProcessError::Stream {
                        program: program.clone(),
                        stream,
                        source,
                    });
                }
                Err(RecvTimeoutError::Timeout) => {
                    options
                        .sink
                        .warn(&format!("timed out waiting for {} to be closed", stream));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    stream_error.get_or_insert(ProcessError::Stream {
                        program: program.clone(),
                        stream,
                        source: io::Error::other("reader thread exited without a result"),
                    });
                }
            }
        }
        if let Some(err) = stream_error {
            return Err(err);
        }

        if !status.success() {
            return Err(ProcessError::NonZeroExit {
                program,
                code: status.code(),
            });
        }
        Ok(status)
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        args::display_command(&parts)
    }
}

fn spawn_reader(
    stream: &'static str,
    pipe: Box<dyn Read + Send>,
    level: LogLevel,
    sink: Arc<dyn LogSink>,
) -> io::Result<Receiver<io::Result<()>>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name(format!("keel-{}", stream))
        .spawn(move || {
            let result = forward_lines(pipe, level, sink.as_ref());
            let _ = tx.send(result);
        })?;
    Ok(rx)
}

/// Forward every line of `reader` to `sink`. Invalid UTF-8 is replaced.
fn forward_lines(reader: impl Read, level: LogLevel, sink: &dyn LogSink) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        sink.log(level, line.trim_end_matches(['\n', '\r']));
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
