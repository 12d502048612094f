//! Helpers for running child processes with timeouts and bounded output.
//!
//! Shared by the execution capability, the command-backed web provider and
//! the command-backed oracles.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn stdout_truncated_notice(&self, label: &str) -> String {
        if self.stdout_truncated > 0 {
            format!(
                "\n[{label} stdout truncated {} bytes]\n",
                self.stdout_truncated
            )
        } else {
            String::new()
        }
    }

    /// Fail unless the command finished in time with a zero exit status.
    pub fn ensure_success(&self, label: &str, timeout: Duration) -> Result<()> {
        if self.timed_out {
            return Err(anyhow!("{label} timed out after {}s", timeout.as_secs()));
        }
        if !self.status.success() {
            let stderr = self.stderr_lossy();
            return Err(anyhow!(
                "{label} failed with status {:?}: {}",
                self.status.code(),
                stderr.trim()
            ));
        }
        Ok(())
    }
}

/// Build a [`Command`] from an argv prefix plus trailing arguments.
pub fn command_from_argv(argv: &[String], trailing: &[&str]) -> Result<Command> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("command must be a non-empty array"))?;
    let mut cmd = Command::new(program);
    cmd.args(args).args(trailing);
    Ok(cmd)
}

/// Run a command with a timeout and capture stdout/stderr without risking pipe deadlocks.
///
/// Output is read concurrently while the child runs. `output_limit_bytes` bounds the amount of
/// stdout/stderr stored in memory (bytes beyond this are discarded while still draining the pipe).
#[instrument(skip_all, fields(timeout_secs = timeout.as_secs(), output_limit_bytes))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    if stdin.is_some() {
        cmd.stdin(Stdio::piped());
    } else {
        cmd.stdin(Stdio::null());
    }
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    // Fed on its own thread: a child that never reads stdin must still hit
    // the timeout.
    let stdin_handle = match stdin {
        Some(input) => {
            let mut child_stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("stdin was not piped"))?;
            let input = input.to_vec();
            Some(thread::spawn(move || {
                // A child that exits without reading stdin closes the pipe;
                // its exit status tells the story.
                if let Err(e) = child_stdin.write_all(&input) {
                    warn!(err = %e, "child closed stdin early");
                }
            }))
        }
        None => None,
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    if let Some(handle) = stdin_handle {
        handle
            .join()
            .map_err(|_| anyhow!("stdin writer thread panicked"))?;
    }
    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        command_from_argv(&["sh".to_string(), "-c".to_string()], &[script]).expect("command")
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let output = run_command_with_timeout(
            sh("echo out; echo err >&2"),
            None,
            Duration::from_secs(5),
            1000,
        )
        .expect("run");
        assert!(output.status.success());
        assert_eq!(output.stdout_lossy(), "out\n");
        assert_eq!(output.stderr_lossy(), "err\n");
        assert!(!output.timed_out);
    }

    #[test]
    fn feeds_stdin_to_child() {
        let output = run_command_with_timeout(
            sh("cat"),
            Some(b"payload"),
            Duration::from_secs(5),
            1000,
        )
        .expect("run");
        assert_eq!(output.stdout_lossy(), "payload");
    }

    #[test]
    fn kills_child_after_timeout() {
        let output = run_command_with_timeout(sh("sleep 5"), None, Duration::from_millis(200), 1000)
            .expect("run");
        assert!(output.timed_out);
        let err = output
            .ensure_success("sleeper", Duration::from_millis(200))
            .expect_err("timed out");
        assert!(err.to_string().contains("timed out"));
    }

    /// Verifies the timeout still applies when the child never drains a stdin
    /// payload larger than the pipe buffer.
    #[test]
    fn timeout_applies_while_stdin_is_unread() {
        let payload = vec![b'x'; 1 << 20];
        let started = Instant::now();
        let output = run_command_with_timeout(
            sh("exec sleep 5"),
            Some(&payload),
            Duration::from_millis(300),
            1000,
        )
        .expect("run");
        assert!(output.timed_out);
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn truncates_output_beyond_limit() {
        let output = run_command_with_timeout(
            sh("printf 'abcdefghij'"),
            None,
            Duration::from_secs(5),
            4,
        )
        .expect("run");
        assert_eq!(output.stdout, b"abcd");
        assert_eq!(output.stdout_truncated, 6);
        assert!(output.stdout_truncated_notice("exec").contains("6 bytes"));
    }

    #[test]
    fn empty_argv_is_rejected() {
        assert!(command_from_argv(&[], &[]).is_err());
    }
}
