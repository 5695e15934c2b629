//! Unity-like engine project detector.
//!
//! The defining marker is the `Assets/` + `ProjectSettings/` directory
//! pair. Either directory alone is common in unrelated trees and scores
//! nothing.

use super::{count_files_with_extensions, Detection, ProjectDetector, ProjectType, EVIDENCE_CAP};
use anyhow::Result;
use std::path::Path;

pub const MARKER_DIRS_WEIGHT: u32 = 70;
pub const PROJECT_VERSION_WEIGHT: u32 = 15;
pub const SCENE_FILE_WEIGHT: u32 = 5;
pub const SCENE_FILE_CAP: u32 = 15;

pub struct EngineDetector;

impl ProjectDetector for EngineDetector {
    fn name(&self) -> &'static str {
        "engine"
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::Engine
    }

    fn priority(&self) -> u8 {
        50
    }

    fn detect(&self, root: &Path) -> Result<Option<Detection>> {
        let assets = root.join("Assets");
        let settings = root.join("ProjectSettings");
        if !assets.is_dir() || !settings.is_dir() {
            return Ok(None);
        }

        let mut detection = Detection::new(ProjectType::Engine);
        detection.add_signal(MARKER_DIRS_WEIGHT, Some(&assets));
        if detection.evidence.len() < EVIDENCE_CAP {
            detection.evidence.push(settings.clone());
        }

        let version_file = settings.join("ProjectVersion.txt");
        if version_file.is_file() {
            detection.add_signal(PROJECT_VERSION_WEIGHT, Some(&version_file));
        }

        let (count, _) = count_files_with_extensions(&assets, &["unity"]);
        if count > 0 {
            detection.confidence += (count as u32 * SCENE_FILE_WEIGHT).min(SCENE_FILE_CAP);
        }

        Ok(Some(detection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_marker_pair_required() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Assets")).unwrap();
        assert!(EngineDetector.detect(dir.path()).unwrap().is_none());

        fs::create_dir(dir.path().join("ProjectSettings")).unwrap();
        let detection = EngineDetector.detect(dir.path()).unwrap().unwrap();
        assert_eq!(detection.confidence, MARKER_DIRS_WEIGHT);
    }

    #[test]
    fn test_project_version_adds_weight() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Assets")).unwrap();
        fs::create_dir(dir.path().join("ProjectSettings")).unwrap();
        fs::write(
            dir.path().join("ProjectSettings/ProjectVersion.txt"),
            "m_EditorVersion: 2022.3.10f1",
        )
        .unwrap();

        let detection = EngineDetector.detect(dir.path()).unwrap().unwrap();
        assert_eq!(
            detection.confidence,
            MARKER_DIRS_WEIGHT + PROJECT_VERSION_WEIGHT
        );
    }

    #[test]
    fn test_scene_files_capped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Assets")).unwrap();
        fs::create_dir(dir.path().join("ProjectSettings")).unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("Assets/scene{}.unity", i)), "").unwrap();
        }

        let detection = EngineDetector.detect(dir.path()).unwrap().unwrap();
        assert_eq!(detection.confidence, MARKER_DIRS_WEIGHT + SCENE_FILE_CAP);
    }
}
