//! Offline toolchain environment resolution and verification.
//!
//! Every toolchain a pipeline may invoke lives under one base directory,
//! populated out-of-band (install scripts, manual provisioning). The
//! orchestrator resolves this layout once and re-verifies it before every
//! build so a missing toolchain surfaces as a clear, recoverable error
//! instead of a confusing failure deep inside an external process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Roles a toolchain directory can play. Each maps to a fixed
/// subdirectory of the environment base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolchainRole {
    /// JDK used by gradle, keytool and the managed toolchain.
    JavaHome,
    /// Android SDK root (platforms, build-tools, platform-tools).
    AndroidSdk,
    /// Android NDK root for native builds.
    AndroidNdk,
    /// Gradle distribution home.
    GradleHome,
    /// Gradle user home, shared dependency cache across builds.
    GradleCache,
    /// .NET SDK root for the managed (MAUI) pipeline.
    DotnetRoot,
    /// Node.js distribution for JS-based pipelines.
    NodeHome,
    /// npm cache directory, shared across builds.
    NodeCache,
    /// Unity-like engine editor installation.
    UnityEditor,
}

impl ToolchainRole {
    pub const ALL: [ToolchainRole; 9] = [
        ToolchainRole::JavaHome,
        ToolchainRole::AndroidSdk,
        ToolchainRole::AndroidNdk,
        ToolchainRole::GradleHome,
        ToolchainRole::GradleCache,
        ToolchainRole::DotnetRoot,
        ToolchainRole::NodeHome,
        ToolchainRole::NodeCache,
        ToolchainRole::UnityEditor,
    ];

    /// Subdirectory name under the environment base.
    pub fn subdir(&self) -> &'static str {
        match self {
            ToolchainRole::JavaHome => "jdk",
            ToolchainRole::AndroidSdk => "android-sdk",
            ToolchainRole::AndroidNdk => "android-ndk",
            ToolchainRole::GradleHome => "gradle",
            ToolchainRole::GradleCache => "gradle-cache",
            ToolchainRole::DotnetRoot => "dotnet",
            ToolchainRole::NodeHome => "node",
            ToolchainRole::NodeCache => "npm-cache",
            ToolchainRole::UnityEditor => "unity",
        }
    }
}

impl fmt::Display for ToolchainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolchainRole::JavaHome => "java-home",
            ToolchainRole::AndroidSdk => "android-sdk",
            ToolchainRole::AndroidNdk => "android-ndk",
            ToolchainRole::GradleHome => "gradle-home",
            ToolchainRole::GradleCache => "gradle-cache",
            ToolchainRole::DotnetRoot => "dotnet-root",
            ToolchainRole::NodeHome => "node-home",
            ToolchainRole::NodeCache => "node-cache",
            ToolchainRole::UnityEditor => "unity-editor",
        };
        write!(f, "{}", name)
    }
}

/// Resolved absolute paths for every toolchain role.
///
/// Resolved once per orchestrator instance; read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineEnvironment {
    base: PathBuf,
    roots: BTreeMap<ToolchainRole, PathBuf>,
}

/// Outcome of an environment verification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    pub valid: bool,
    pub missing: Vec<ToolchainRole>,
}

impl OfflineEnvironment {
    /// Map every role to its fixed subdirectory under `base`.
    ///
    /// Resolution is pure path arithmetic; existence is checked by
    /// [`OfflineEnvironment::verify`], not here.
    pub fn resolve(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref().to_path_buf();
        let roots = ToolchainRole::ALL
            .iter()
            .map(|role| (*role, base.join(role.subdir())))
            .collect();
        debug!(base = %base.display(), "resolved offline environment");
        Self { base, roots }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Absolute path for a role. Always present: every role is resolved.
    pub fn root(&self, role: ToolchainRole) -> &Path {
        &self.roots[&role]
    }

    /// Existence check for every configured root. Advisory only — no
    /// version probing, no executable lookup.
    pub fn verify(&self) -> VerifyReport {
        let missing: Vec<ToolchainRole> = self
            .roots
            .iter()
            .filter(|(_, path)| !path.is_dir())
            .map(|(role, _)| *role)
            .collect();

        VerifyReport {
            valid: missing.is_empty(),
            missing,
        }
    }

    /// Verify only the roles a specific pipeline actually needs.
    pub fn verify_roles(&self, roles: &[ToolchainRole]) -> VerifyReport {
        let missing: Vec<ToolchainRole> = roles
            .iter()
            .filter(|role| !self.root(**role).is_dir())
            .copied()
            .collect();

        VerifyReport {
            valid: missing.is_empty(),
            missing,
        }
    }
}
