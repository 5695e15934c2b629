//! Project type detection.
//!
//! One heuristic detector per supported technology inspects a directory
//! tree read-only and accumulates confidence from fixed-weight signals.
//! The [`DetectorRegistry`] runs them all and resolves the winner.

pub mod cross_js;
pub mod engine;
pub mod managed;
pub mod native;
mod registry;
pub mod web;

pub use cross_js::CrossJsDetector;
pub(crate) use cross_js::has_expo_dependency;
pub use engine::EngineDetector;
pub use managed::ManagedDetector;
pub use native::NativeDetector;
pub use registry::DetectorRegistry;
pub use web::WebDetector;

use crate::util::fs::{sanitize_name, EXCLUDED_DIRS};
use anyhow::Result;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Upper bound on recorded evidence paths per detection.
pub const EVIDENCE_CAP: usize = 5;

/// Directory depth detectors look into when enumerating source files.
const SCAN_DEPTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectType {
    /// Static or bundled web app packaged into a WebView shell.
    Web,
    /// C/C++ sources built through CMake and the NDK.
    Native,
    /// .NET MAUI project built with the dotnet toolchain.
    Managed,
    /// React Native / Expo project.
    CrossJs,
    /// Unity-like engine project driven through the editor in batch mode.
    Engine,
    Unknown,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Web => "web",
            ProjectType::Native => "native",
            ProjectType::Managed => "managed",
            ProjectType::CrossJs => "cross-js",
            ProjectType::Engine => "engine",
            ProjectType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-heuristic detection outcome. Confidence is an unbounded
/// accumulator here; the resolver clamps it to 100.
#[derive(Debug, Clone)]
pub struct Detection {
    pub project_type: ProjectType,
    pub confidence: u32,
    pub evidence: Vec<PathBuf>,
}

impl Detection {
    pub fn new(project_type: ProjectType) -> Self {
        Self {
            project_type,
            confidence: 0,
            evidence: Vec::new(),
        }
    }

    /// Record one weighted signal, capping stored evidence paths.
    pub fn add_signal(&mut self, weight: u32, evidence: Option<&Path>) {
        self.confidence += weight;
        if let Some(path) = evidence {
            if self.evidence.len() < EVIDENCE_CAP {
                self.evidence.push(path.to_path_buf());
            }
        }
    }

    pub fn has_evidence(&self) -> bool {
        self.confidence > 0
    }

    pub fn clamped_confidence(&self) -> u8 {
        self.confidence.min(100) as u8
    }
}

/// Canonical classification record, created once per detection call and
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub path: PathBuf,
    pub project_type: ProjectType,
    /// Clamped to [0, 100]; 0 only together with [`ProjectType::Unknown`].
    pub confidence: u8,
    pub evidence: Vec<PathBuf>,
    /// Final path segment sanitized to alphanumerics.
    pub suggested_name: String,
}

impl ProjectInfo {
    pub fn unknown(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            project_type: ProjectType::Unknown,
            confidence: 0,
            evidence: Vec::new(),
            suggested_name: suggested_name_for(path),
        }
    }
}

pub(crate) fn suggested_name_for(path: &Path) -> String {
    let segment = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("app");
    sanitize_name(segment)
}

/// A heuristic classifier for one project type.
///
/// Detectors are pure with respect to their inputs: read-only filesystem
/// inspection, no shared mutable state, safe to run concurrently.
/// Absence of evidence is `Ok(None)`, never an error; errors are reserved
/// for unexpected failures and are isolated by the registry.
pub trait ProjectDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn project_type(&self) -> ProjectType;

    /// Tie-break rank when two detectors reach equal confidence. Higher
    /// wins; ranks order detectors by marker specificity.
    fn priority(&self) -> u8;

    fn detect(&self, root: &Path) -> Result<Option<Detection>>;
}

/// Count files matching `extensions` under `root`, collecting up to
/// [`EVIDENCE_CAP`] matching paths. Unreadable subtrees are skipped and
/// contribute nothing.
pub(crate) fn count_files_with_extensions(
    root: &Path,
    extensions: &[&str],
) -> (usize, Vec<PathBuf>) {
    let mut count = 0;
    let mut samples = Vec::new();

    for result in WalkBuilder::new(root)
        .max_depth(Some(SCAN_DEPTH))
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
            Err(_) => continue,
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if matches {
            count += 1;
            if samples.len() < EVIDENCE_CAP {
                samples.push(path.to_path_buf());
            }
        }
    }

    (count, samples)
}
