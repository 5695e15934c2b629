//! External process invocation.
//!
//! Every toolchain is driven through [`ProcessRunner`]: a command,
//! argument list, working directory and an explicit environment overlay.
//! Output is streamed line-by-line to an optional sink as it arrives, and
//! a [`CancelToken`] can abort a running child. Toolchain locations
//! travel only through the per-command overlay; nothing here mutates the
//! process-global environment.

use crate::error::BuildError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::debug;

/// Callback receiving one line of child output at a time.
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Cooperative cancellation for process invocations. Cloning shares the
/// same cancellation state.
#[derive(Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        // send_replace updates the value even with no live receivers.
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// One external command: program, arguments, working directory and
/// environment overlay.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Set one environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Rendered command line for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured result of a completed invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout and stderr joined, for error reporting.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

/// Runs external commands with streaming output and cancellation.
#[derive(Clone, Default)]
pub struct ProcessRunner {
    cancel: Option<CancelToken>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self { cancel: None }
    }

    pub fn with_cancel_token(token: CancelToken) -> Self {
        Self {
            cancel: Some(token),
        }
    }

    /// Spawn the command and wait for it, forwarding output lines to
    /// `sink` as they arrive. Returns the captured output whatever the
    /// exit code; callers decide what non-zero means.
    pub async fn run(
        &self,
        spec: &CommandSpec,
        sink: Option<LineSink>,
    ) -> Result<ProcessOutput, BuildError> {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return Err(BuildError::Cancelled);
            }
        }

        debug!(command = %spec.display_command(), "spawning process");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn()?;

        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");
        let stdout_task = tokio::spawn(drain_lines(stdout, sink.clone()));
        let stderr_task = tokio::spawn(drain_lines(stderr, sink));

        let status = match &self.cancel {
            Some(token) => {
                let mut rx = token.subscribe();
                tokio::select! {
                    status = child.wait() => status?,
                    _ = async { let _ = rx.wait_for(|cancelled| *cancelled).await; } => {
                        let _ = child.start_kill();
                        let _ = child.wait().await;
                        return Err(BuildError::Cancelled);
                    }
                }
            }
            None => child.wait().await?,
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();
        let exit_code = status.code().unwrap_or(-1);

        debug!(exit_code, "process finished");

        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code,
        })
    }

    /// Like [`ProcessRunner::run`] but a non-zero exit becomes a
    /// [`BuildError::Toolchain`] carrying the captured output.
    pub async fn run_checked(
        &self,
        spec: &CommandSpec,
        sink: Option<LineSink>,
    ) -> Result<ProcessOutput, BuildError> {
        let output = self.run(spec, sink).await?;
        if !output.success() {
            return Err(BuildError::Toolchain {
                command: spec.display_command(),
                exit_code: output.exit_code,
                output: output.combined(),
            });
        }
        Ok(output)
    }
}

async fn drain_lines<R: AsyncRead + Unpin>(reader: R, sink: Option<LineSink>) -> String {
    let mut lines = BufReader::new(reader).lines();
    let mut captured = String::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(sink) = &sink {
            sink(&line);
        }
        captured.push_str(&line);
        captured.push('\n');
    }
    captured
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let spec = CommandSpec::new("echo").arg("hello");
        let output = ProcessRunner::new().run(&spec, None).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_env_overlay_is_applied() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "printf '%s' \"$APKFORGE_TEST_VAR\""])
            .env("APKFORGE_TEST_VAR", "overlay-value");
        let output = ProcessRunner::new().run(&spec, None).await.unwrap();
        assert_eq!(output.stdout, "overlay-value");
    }

    #[tokio::test]
    async fn test_lines_are_streamed() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: LineSink = Arc::new(move |line: &str| {
            sink_seen.lock().unwrap().push(line.to_string());
        });

        let spec = CommandSpec::new("sh").args(["-c", "echo one; echo two"]);
        ProcessRunner::new().run(&spec, Some(sink)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), ["one", "two"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_reported() {
        let spec = CommandSpec::new("sh").args(["-c", "echo oops >&2; exit 3"]);
        let output = ProcessRunner::new().run(&spec, None).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_run_checked_maps_failure_to_toolchain_error() {
        let spec = CommandSpec::new("sh").args(["-c", "echo broken; exit 1"]);
        let err = ProcessRunner::new()
            .run_checked(&spec, None)
            .await
            .unwrap_err();
        match err {
            BuildError::Toolchain {
                exit_code, output, ..
            } => {
                assert_eq!(exit_code, 1);
                assert!(output.contains("broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_kills_child() {
        let token = CancelToken::new();
        let runner = ProcessRunner::with_cancel_token(token.clone());
        let spec = CommandSpec::new("sleep").arg("30");

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let start = std::time::Instant::now();
        let err = runner.run(&spec, None).await.unwrap_err();
        assert!(matches!(err, BuildError::Cancelled));
        assert!(start.elapsed() < std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_short_circuits() {
        let token = CancelToken::new();
        token.cancel();
        let runner = ProcessRunner::with_cancel_token(token);
        let spec = CommandSpec::new("echo").arg("never");
        let err = runner.run(&spec, None).await.unwrap_err();
        assert!(matches!(err, BuildError::Cancelled));
    }

    #[test]
    fn test_display_command() {
        let spec = CommandSpec::new("gradle").args(["assembleRelease", "--offline"]);
        assert_eq!(spec.display_command(), "gradle assembleRelease --offline");
    }
}
