//! Blocking subprocess execution with a timeout.
//!
//! Build tools are run to completion or killed when the timeout elapses.
//! Output pipes are drained on helper threads so a chatty tool cannot fill
//! its pipe buffer and stall.

use crate::error::{DepBomError, ToolErrorKind};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to wait for output threads after the child is gone
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a subprocess run
#[derive(Debug, Default)]
pub struct ExecResult {
    /// Exit code, absent when the process could not be started, timed out or
    /// was killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Why the run did not succeed, if it did not
    pub error: Option<ToolErrorKind>,
}

impl ExecResult {
    /// True for a zero exit status
    #[must_use]
    pub fn success(&self) -> bool {
        self.error.is_none() && self.status == Some(0)
    }

    /// Convert into stdout on success or a tool error otherwise.
    pub fn into_stdout(self, context: &str) -> crate::error::Result<String> {
        match self.error {
            None if self.status == Some(0) => Ok(self.stdout),
            Some(kind) => Err(DepBomError::tool(context, kind)),
            None => Err(DepBomError::tool(
                context,
                ToolErrorKind::NonZeroExit {
                    program: context.to_string(),
                    status: self.status.unwrap_or(-1),
                },
            )),
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    let deadline = Instant::now() + DRAIN_TIMEOUT;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            // A descendant still holds the pipe open; abandon the reader
            return String::new();
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    handle.join().unwrap_or_default()
}

/// Run `program` with `args` in `cwd`, killing it after `timeout`.
///
/// Never fails: spawn errors, timeouts and non-zero exits are reported in
/// [`ExecResult::error`].
#[must_use]
pub fn run_command(
    program: &str,
    args: &[String],
    cwd: &Path,
    envs: &[(String, String)],
    timeout: Duration,
) -> ExecResult {
    debug!("Running {program} {} in {}", args.join(" "), cwd.display());

    let mut child = match Command::new(program)
        .args(args)
        .current_dir(cwd)
        .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return ExecResult {
                error: Some(ToolErrorKind::Spawn {
                    program: program.to_string(),
                    message: e.to_string(),
                }),
                ..ExecResult::default()
            };
        }
    };

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                break Err(ToolErrorKind::Timeout {
                    program: program.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                break Err(ToolErrorKind::Spawn {
                    program: program.to_string(),
                    message: e.to_string(),
                });
            }
        }
    };
    drop(child);

    let mut result = ExecResult {
        stdout: collect(stdout),
        stderr: collect(stderr),
        ..ExecResult::default()
    };
    match status {
        Ok(status) => {
            result.status = status.code();
            if !status.success() {
                result.error = Some(ToolErrorKind::NonZeroExit {
                    program: program.to_string(),
                    status: status.code().unwrap_or(-1),
                });
            }
        }
        Err(kind) => result.error = Some(kind),
    }
    result
}
