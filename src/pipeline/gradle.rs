//! Gradle invocation with offline fallback.
//!
//! Builds attempt network-aware execution first. Connectivity is probed
//! with a lightweight DNS lookup; when absent, `--offline` is forced so
//! gradle resolves everything from the shared cache. When an online
//! attempt fails even though connectivity was present, one offline retry
//! runs before the failure is surfaced — transient registry outages
//! should not force users into full offline mode.

use super::BuildContext;
use crate::env::ToolchainRole;
use crate::error::BuildError;
use crate::process::{CommandSpec, ProcessOutput};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

const PROBE_HOST: &str = "dl.google.com:443";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Gradle argument list for one assemble invocation.
pub fn gradle_args(task: &str, offline: bool) -> Vec<String> {
    let mut args = vec![
        task.to_string(),
        "--no-daemon".to_string(),
        "--console=plain".to_string(),
    ];
    if offline {
        args.push("--offline".to_string());
    }
    args
}

/// DNS resolution probe. Resolving the distribution host is enough to
/// tell "no network at all" apart from "registry flaked".
pub async fn connectivity_present() -> bool {
    match tokio::time::timeout(PROBE_TIMEOUT, tokio::net::lookup_host(PROBE_HOST)).await {
        Ok(Ok(mut addrs)) => addrs.next().is_some(),
        _ => false,
    }
}

/// Command for one gradle invocation, with the toolchain locations
/// passed as an explicit env overlay.
pub fn gradle_command(
    ctx: &BuildContext,
    project_dir: &Path,
    task: &str,
    offline: bool,
) -> CommandSpec {
    let gradle_bin = ctx
        .env
        .root(ToolchainRole::GradleHome)
        .join("bin")
        .join("gradle");
    let sdk = ctx.env.root(ToolchainRole::AndroidSdk);

    CommandSpec::new(gradle_bin)
        .args(gradle_args(task, offline))
        .cwd(project_dir)
        .env("JAVA_HOME", ctx.env.root(ToolchainRole::JavaHome).display().to_string())
        .env("ANDROID_HOME", sdk.display().to_string())
        .env("ANDROID_SDK_ROOT", sdk.display().to_string())
        .env(
            "GRADLE_USER_HOME",
            ctx.env.root(ToolchainRole::GradleCache).display().to_string(),
        )
}

/// Run a gradle task with the offline-fallback policy described above.
pub async fn run_gradle(
    ctx: &BuildContext,
    project_dir: &Path,
    task: &str,
) -> Result<ProcessOutput, BuildError> {
    let online = connectivity_present().await;
    debug!(online, task, "starting gradle invocation");

    let first = gradle_command(ctx, project_dir, task, !online);
    let output = ctx.runner.run(&first, ctx.line_sink()).await?;
    if output.success() {
        return Ok(output);
    }

    if online {
        warn!(
            exit_code = output.exit_code,
            "gradle failed in network-aware mode, retrying offline"
        );
        let retry = gradle_command(ctx, project_dir, task, true);
        let retry_output = ctx.runner.run(&retry, ctx.line_sink()).await?;
        if retry_output.success() {
            return Ok(retry_output);
        }
        return Err(BuildError::Toolchain {
            command: retry.display_command(),
            exit_code: retry_output.exit_code,
            output: retry_output.combined(),
        });
    }

    Err(BuildError::Toolchain {
        command: first.display_command(),
        exit_code: output.exit_code,
        output: output.combined(),
    })
}
