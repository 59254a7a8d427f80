//! Command runner for external process execution.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a running child is polled while a timeout is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors from running an external command.
#[derive(Error, Debug)]
pub enum RunError {
    /// The program could not be started (not installed, not executable).
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The program ran past its deadline and was killed.
    #[error("{tool} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { tool: String, timeout: Duration },

    /// Waiting on or talking to the child failed.
    #[error("I/O error while running {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: io::Error,
    },
}

impl RunError {
    fn spawn(tool: &str, source: io::Error) -> Self {
        Self::Spawn {
            tool: tool.to_string(),
            source,
        }
    }

    fn io(tool: &str, source: io::Error) -> Self {
        Self::Io {
            tool: tool.to_string(),
            source,
        }
    }
}

/// Result type for command execution.
pub type RunResult<T> = Result<T, RunError>;

/// Captured output of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the child was ended by a signal.
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Runs commands to completion, optionally bounded by a timeout.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Kill the child and fail with [`RunError::Timeout`] after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run `cmd`, feeding `stdin_data` if given, and capture its output.
    ///
    /// A non-zero exit is not an error here; callers inspect
    /// [`CommandOutput::success`] and decide.
    pub fn run(
        &self,
        tool: &str,
        mut cmd: Command,
        stdin_data: Option<&str>,
    ) -> RunResult<CommandOutput> {
        cmd.stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        tracing::debug!("Running {}: {:?}", tool, cmd);

        let mut child = cmd.spawn().map_err(|e| RunError::spawn(tool, e))?;

        // Feed stdin from a helper thread so a child that writes before it
        // finishes reading cannot deadlock against us.
        if let Some(data) = stdin_data {
            if let Some(mut stdin) = child.stdin.take() {
                let data = data.to_owned();
                thread::spawn(move || {
                    let _ = stdin.write_all(data.as_bytes());
                });
            }
        }

        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        let status = self.wait(&mut child, tool)?;

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code: status.code(),
            success: status.success(),
        })
    }

    fn wait(&self, child: &mut Child, tool: &str) -> RunResult<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|e| RunError::io(tool, e));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(|e| RunError::io(tool, e))? {
                return Ok(status);
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::warn!("{} exceeded {:.1}s, killing it", tool, timeout.as_secs_f64());
                let _ = child.kill();
                let _ = child.wait();
                return Err(RunError::Timeout {
                    tool: tool.to_string(),
                    timeout,
                });
            }

            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        buffer
    })
}

fn join_reader(handle: JoinHandle<Vec<u8>>) -> Vec<u8> {
    handle.join().unwrap_or_default()
}
