//! .NET MAUI project detector.
//!
//! The strong signal is a `.csproj` declaring MAUI (`<UseMaui>true`) or
//! an Android target framework; bare `.csproj`/`.sln` files alone are a
//! weak hint only.

use super::{count_files_with_extensions, Detection, ProjectDetector, ProjectType, EVIDENCE_CAP};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const MAUI_PROJECT_WEIGHT: u32 = 60;
pub const PLAIN_PROJECT_WEIGHT: u32 = 15;
pub const PLATFORMS_DIR_WEIGHT: u32 = 20;
pub const SOURCE_FILE_WEIGHT: u32 = 2;
pub const SOURCE_FILE_CAP: u32 = 10;

pub struct ManagedDetector;

impl ProjectDetector for ManagedDetector {
    fn name(&self) -> &'static str {
        "managed"
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::Managed
    }

    fn priority(&self) -> u8 {
        30
    }

    fn detect(&self, root: &Path) -> Result<Option<Detection>> {
        let mut detection = Detection::new(ProjectType::Managed);

        let mut saw_maui = false;
        let mut saw_plain = false;
        for csproj in find_project_files(root) {
            if is_maui_project(&csproj) {
                if !saw_maui {
                    detection.add_signal(MAUI_PROJECT_WEIGHT, Some(&csproj));
                    saw_maui = true;
                }
            } else if !saw_plain {
                detection.add_signal(PLAIN_PROJECT_WEIGHT, Some(&csproj));
                saw_plain = true;
            }
        }

        let platforms_android = root.join("Platforms").join("Android");
        if platforms_android.is_dir() {
            detection.add_signal(PLATFORMS_DIR_WEIGHT, Some(&platforms_android));
        }

        let (count, samples) = count_files_with_extensions(root, &["cs"]);
        if count > 0 {
            let score = (count as u32 * SOURCE_FILE_WEIGHT).min(SOURCE_FILE_CAP);
            detection.confidence += score;
            for sample in samples {
                if detection.evidence.len() >= EVIDENCE_CAP {
                    break;
                }
                detection.evidence.push(sample);
            }
        }

        Ok(detection.has_evidence().then_some(detection))
    }
}

/// `.csproj` and `.sln` files at the root and one level below.
fn find_project_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect_project_files(root, &mut found);
    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_project_files(&path, &mut found);
            }
        }
    }
    found.sort();
    found
}

fn collect_project_files(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_project = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csproj") || ext.eq_ignore_ascii_case("sln"))
            .unwrap_or(false);
        if path.is_file() && is_project {
            found.push(path);
        }
    }
}

/// True when the project file declares MAUI or targets Android.
fn is_maui_project(csproj: &Path) -> bool {
    if csproj
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("sln"))
        .unwrap_or(false)
    {
        return false;
    }
    let Ok(content) = std::fs::read_to_string(csproj) else {
        return false;
    };
    let Ok(doc) = roxmltree::Document::parse(&content) else {
        return false;
    };

    for node in doc.descendants() {
        match node.tag_name().name() {
            "UseMaui" => {
                if node.text().map(str::trim) == Some("true") {
                    return true;
                }
            }
            "TargetFramework" | "TargetFrameworks" => {
                if node
                    .text()
                    .map(|t| t.contains("-android"))
                    .unwrap_or(false)
                {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}
