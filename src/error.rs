//! Build error taxonomy.
//!
//! Errors split into the categories the orchestrator cares about:
//! environment problems are surfaced before any pipeline stage runs,
//! stage failures carry the captured toolchain output, and best-effort
//! operations never appear here at all (they degrade to warnings on the
//! [`crate::BuildResult`]).

use crate::env::ToolchainRole;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// One or more toolchain roots are missing from the offline environment.
    /// Recoverable by provisioning the named roles; no pipeline stage runs.
    #[error("missing toolchain(s): {}", format_roles(.roles))]
    EnvironmentMissing { roles: Vec<ToolchainRole> },

    /// No detector produced evidence for this path.
    #[error("could not determine project type for {}", .path.display())]
    UnknownProjectType { path: PathBuf },

    /// Invalid or incomplete build options.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A pipeline stage failed with a human-readable reason.
    #[error("{stage} failed: {message}")]
    Stage { stage: &'static str, message: String },

    /// An external toolchain exited non-zero. The captured output rides
    /// along so the caller sees what the toolchain printed.
    #[error("`{command}` exited with {exit_code}:\n{output}")]
    Toolchain {
        command: String,
        exit_code: i32,
        output: String,
    },

    /// The toolchain reported success but the expected artifact is absent.
    #[error("build reported success but no artifact was found at {}", .expected.display())]
    ArtifactMissing { expected: PathBuf },

    /// The build was cancelled through a [`crate::process::CancelToken`].
    #[error("build cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_roles(roles: &[ToolchainRole]) -> String {
    roles
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl BuildError {
    /// Stage name used for progress reporting and result classification.
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        BuildError::Stage {
            stage,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_missing_names_roles() {
        let err = BuildError::EnvironmentMissing {
            roles: vec![ToolchainRole::JavaHome, ToolchainRole::AndroidSdk],
        };
        let msg = err.to_string();
        assert!(msg.contains("java-home"));
        assert!(msg.contains("android-sdk"));
    }

    #[test]
    fn test_toolchain_error_carries_output() {
        let err = BuildError::Toolchain {
            command: "gradle assembleRelease".to_string(),
            exit_code: 1,
            output: "FAILURE: Build failed".to_string(),
        };
        assert!(err.to_string().contains("FAILURE: Build failed"));
        assert!(err.to_string().contains("exited with 1"));
    }

    #[test]
    fn test_stage_helper() {
        let err = BuildError::stage("configure", "bad manifest");
        assert_eq!(err.to_string(), "configure failed: bad manifest");
    }
}
