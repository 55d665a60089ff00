// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External process execution with timeouts.
//
// Children are spawned with `kill_on_drop`, so a timeout or a cancelled
// caller future terminates the process instead of leaving it running.

use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use emarge_core::error::{EmargeError, Result};
use emarge_core::types::ToolId;
use tokio::process::Command;
use tracing::{debug, trace};

/// Maximum number of stderr bytes kept for error reports.
const STDERR_LIMIT: usize = 4096;

/// Captured result of a finished tool invocation.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Turn a non-zero exit into `ProcessFailure`.
    pub fn check(self, tool: ToolId) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(EmargeError::ProcessFailure {
                tool,
                status: self.status.code(),
                stderr: self.stderr,
            })
        }
    }
}

/// Build a command for `program` with piped output and no stdin.
pub fn command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// Run a prepared command to completion, bounded by `timeout`.
///
/// A program that cannot be spawned because it does not exist is reported as
/// `ToolUnavailable`; exceeding the timeout kills the child and reports
/// `Timeout`. A non-zero exit is *not* an error here; see [`ToolOutput::check`].
pub async fn run(tool: ToolId, mut cmd: Command, timeout: Duration) -> Result<ToolOutput> {
    trace!(%tool, command = ?cmd.as_std(), "Spawning tool");

    let child = cmd.spawn().map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            EmargeError::ToolUnavailable(tool)
        }
        _ => EmargeError::Io(err),
    })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            truncate_utf8(&mut stderr, STDERR_LIMIT);
            debug!(%tool, exit_code = ?output.status.code(), "Tool finished");
            Ok(ToolOutput {
                status: output.status,
                stdout: output.stdout,
                stderr,
            })
        }
        Ok(Err(err)) => Err(EmargeError::Io(err)),
        Err(_) => Err(EmargeError::Timeout {
            tool,
            seconds: timeout.as_secs(),
        }),
    }
}

/// Whether `program` starts and exits with status zero when given `args`
/// within `timeout`.
pub async fn responds(tool: ToolId, program: &OsStr, args: &[&str], timeout: Duration) -> bool {
    let mut cmd = command(program);
    cmd.args(args);
    match run(tool, cmd, timeout).await {
        Ok(output) => output.success(),
        Err(err) => {
            trace!(%tool, program = ?program, %err, "Version check failed");
            false
        }
    }
}

fn truncate_utf8(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}
