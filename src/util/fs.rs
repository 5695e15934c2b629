//! Filesystem helpers shared by detectors and pipelines.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directories never copied into a scratch tree and never scanned for
/// evidence. Mirrors what the underlying toolchains regenerate anyway.
pub const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".idea",
    ".vscode",
    ".gradle",
    "node_modules",
    "build",
    "bin",
    "obj",
    "Library",
    "Temp",
];

/// Reduce a project directory name to an identifier-safe app name.
/// Keeps alphanumerics only; falls back to `"app"` when nothing survives.
pub fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if cleaned.is_empty() {
        "app".to_string()
    } else {
        cleaned
    }
}

/// Uniquely named scratch directory path for one build, qualified by
/// timestamp and instance id so concurrent builds cannot collide. The
/// directory is not created here; [`create_scratch_dir`] does that so
/// re-preparing a build can discard a previous tree first.
pub fn scratch_dir_path(app_name: &str) -> PathBuf {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let unique = uuid::Uuid::new_v4().simple().to_string();
    std::env::temp_dir().join(format!(
        "apkforge-{}-{}-{}",
        sanitize_name(app_name),
        stamp,
        unique
    ))
}

/// Create a scratch directory, discarding any previous tree at that path.
pub fn create_scratch_dir(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("failed to discard previous scratch dir {}", path.display()))?;
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create scratch dir {}", path.display()))?;
    Ok(())
}

/// Copy a project tree into `dest`, skipping VCS and build output
/// directories. Unreadable entries are logged and skipped rather than
/// failing the whole copy.
pub fn copy_project(source: &Path, dest: &Path) -> Result<u64> {
    let mut copied = 0u64;

    for result in WalkBuilder::new(source)
        .hidden(false)
        .git_ignore(false)
        .filter_entry(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| !EXCLUDED_DIRS.contains(&name))
                .unwrap_or(true)
        })
        .build()
    {
        let entry = match result {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry during project copy");
                continue;
            }
        };

        let path = entry.path();
        if path == source {
            continue;
        }

        let rel = path.strip_prefix(source).unwrap_or(path);
        let target = dest.join(rel);

        if path.is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("failed to create {}", target.display()))?;
        } else if path.is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(path, &target)
                .with_context(|| format!("failed to copy {}", path.display()))?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Package name as a nested source directory path, e.g.
/// `com.example.app` -> `com/example/app`.
pub fn package_to_path(package_name: &str) -> PathBuf {
    package_name.split('.').collect()
}
