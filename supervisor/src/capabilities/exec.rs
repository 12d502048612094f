//! Code execution through a configured interpreter.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{Capability, CapabilityHandle, parse_args};
use crate::io::config::ExecConfig;
use crate::io::process::{command_from_argv, run_command_with_timeout};

pub fn exec_capabilities(config: &ExecConfig) -> Vec<CapabilityHandle> {
    vec![Arc::new(ExecuteCode::new(config.clone()))]
}

#[derive(Debug, Deserialize)]
struct CodeArgs {
    code: String,
}

/// Runs source text as the last argv of `exec.command`, returning stdout
/// with any stderr appended.
#[derive(Debug, Clone)]
pub struct ExecuteCode {
    config: ExecConfig,
}

impl ExecuteCode {
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    #[instrument(skip_all, fields(bytes = code.len()))]
    fn run(&self, code: &str) -> String {
        let source = dedent(code);
        let timeout = self.config.timeout();
        let cmd = match command_from_argv(&self.config.command, &[source.as_str()]) {
            Ok(cmd) => cmd,
            Err(err) => return format!("Error: {err}"),
        };
        let output =
            match run_command_with_timeout(cmd, None, timeout, self.config.output_limit_bytes) {
                Ok(output) => output,
                Err(err) => return format!("Error: {err:#}"),
            };
        if output.timed_out {
            return timeout_message(timeout);
        }
        debug!(exit_code = ?output.status.code(), "code executed");

        let mut text = output.stdout_lossy();
        text.push_str(&output.stdout_truncated_notice("execute_code"));
        let stderr = output.stderr_lossy();
        if !stderr.is_empty() {
            text.push_str("\nSTDERR:\n");
            text.push_str(&stderr);
        }
        if text.is_empty() {
            "(no output)".to_string()
        } else {
            text
        }
    }
}

fn timeout_message(timeout: Duration) -> String {
    format!(
        "Error: code execution timed out ({}s limit)",
        timeout.as_secs()
    )
}

impl Capability for ExecuteCode {
    fn name(&self) -> &str {
        "execute_code"
    }

    fn description(&self) -> &str {
        "Execute source code and return stdout plus stderr. Args: {\"code\": string}."
    }

    fn invoke(&self, args: &Value) -> String {
        match parse_args::<CodeArgs>(self.name(), args) {
            Ok(args) => self.run(&args.code),
            Err(message) => message,
        }
    }
}

/// Strip the longest whitespace prefix shared by every non-blank line.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(|common, prefix| {
            let shared = common
                .char_indices()
                .zip(prefix.chars())
                .take_while(|((_, a), b)| a == b)
                .last()
                .map_or(0, |((idx, ch), _)| idx + ch.len_utf8());
            &common[..shared]
        })
        .unwrap_or("");
    if indent.is_empty() {
        return text.to_string();
    }

    let mut out = text
        .lines()
        .map(|line| line.strip_prefix(indent).unwrap_or(line.trim_start()))
        .collect::<Vec<_>>()
        .join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sh_exec(timeout_secs: u64) -> ExecuteCode {
        ExecuteCode::new(ExecConfig {
            command: vec!["sh".to_string(), "-c".to_string()],
            timeout_secs,
            output_limit_bytes: 10_000,
        })
    }

    #[test]
    fn dedent_removes_common_indent() {
        let source = "    if x:\n        y()\n\n    z()\n";
        assert_eq!(dedent(source), "if x:\n    y()\n\nz()\n");
    }

    #[test]
    fn dedent_leaves_flush_text_alone() {
        assert_eq!(dedent("a\n  b"), "a\n  b");
    }

    #[test]
    fn returns_stdout() {
        let out = sh_exec(5).invoke(&json!({ "code": "echo hello" }));
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn appends_stderr_section() {
        let out = sh_exec(5).invoke(&json!({ "code": "echo out; echo oops >&2" }));
        assert_eq!(out, "out\n\nSTDERR:\noops\n");
    }

    #[test]
    fn silent_program_reports_no_output() {
        assert_eq!(sh_exec(5).invoke(&json!({ "code": "true" })), "(no output)");
    }

    #[test]
    fn indented_source_still_runs() {
        let out = sh_exec(5).invoke(&json!({ "code": "\n    echo one\n    echo two\n" }));
        assert_eq!(out, "one\ntwo\n");
    }

    #[test]
    fn long_running_code_times_out() {
        let out = sh_exec(1).invoke(&json!({ "code": "sleep 5" }));
        assert_eq!(out, "Error: code execution timed out (1s limit)");
    }

    #[test]
    fn missing_interpreter_is_reported_as_text() {
        let exec = ExecuteCode::new(ExecConfig {
            command: vec!["definitely-not-an-interpreter-xyz".to_string()],
            ..ExecConfig::default()
        });
        let out = exec.invoke(&json!({ "code": "1" }));
        assert!(out.starts_with("Error: "), "{out}");
    }

    #[test]
    fn missing_code_argument_is_described() {
        let out = sh_exec(5).invoke(&json!({}));
        assert!(out.starts_with("Error: invalid arguments for 'execute_code':"));
    }
}
