//! React Native / Expo project detector.

use super::{Detection, ProjectDetector, ProjectType};
use anyhow::Result;
use serde_json::Value;
use std::path::Path;

pub const REACT_NATIVE_DEP_WEIGHT: u32 = 50;
pub const EXPO_DEP_WEIGHT: u32 = 30;
pub const APP_CONFIG_WEIGHT: u32 = 10;
pub const ANDROID_DIR_WEIGHT: u32 = 10;
pub const ENTRYPOINT_WEIGHT: u32 = 5;

pub struct CrossJsDetector;

impl ProjectDetector for CrossJsDetector {
    fn name(&self) -> &'static str {
        "cross-js"
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::CrossJs
    }

    fn priority(&self) -> u8 {
        40
    }

    fn detect(&self, root: &Path) -> Result<Option<Detection>> {
        let package_json = root.join("package.json");
        let deps = dependency_names(&package_json);
        if deps.is_empty() {
            // Without a package.json there is no cross-platform JS project
            // to speak of; markers below are meaningless on their own.
            return Ok(None);
        }

        let mut detection = Detection::new(ProjectType::CrossJs);

        if deps.iter().any(|d| d == "react-native") {
            detection.add_signal(REACT_NATIVE_DEP_WEIGHT, Some(&package_json));
        }
        if deps.iter().any(|d| d == "expo") {
            detection.add_signal(EXPO_DEP_WEIGHT, Some(&package_json));
        }
        if detection.confidence == 0 {
            return Ok(None);
        }

        for config in ["app.json", "app.config.js", "app.config.ts"] {
            let path = root.join(config);
            if path.is_file() {
                detection.add_signal(APP_CONFIG_WEIGHT, Some(&path));
                break;
            }
        }

        let android_dir = root.join("android");
        if android_dir.is_dir() {
            detection.add_signal(ANDROID_DIR_WEIGHT, Some(&android_dir));
        }

        for entry in ["index.js", "App.js", "App.tsx"] {
            let path = root.join(entry);
            if path.is_file() {
                detection.add_signal(ENTRYPOINT_WEIGHT, Some(&path));
                break;
            }
        }

        Ok(Some(detection))
    }
}

/// True when `package.json` declares a `react-native` or `expo`
/// dependency. Used by the web detector to yield on JS ecosystems that
/// belong here.
pub(crate) fn has_cross_js_dependency(package_json: &Path) -> bool {
    dependency_names(package_json)
        .iter()
        .any(|d| d == "react-native" || d == "expo")
}

/// True when the project uses Expo's managed workflow, which needs a
/// prebuild step before a native build can run.
pub(crate) fn has_expo_dependency(package_json: &Path) -> bool {
    dependency_names(package_json).iter().any(|d| d == "expo")
}

fn dependency_names(package_json: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(package_json) else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_str::<Value>(&content) else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for section in ["dependencies", "devDependencies"] {
        if let Some(map) = value.get(section).and_then(Value::as_object) {
            names.extend(map.keys().cloned());
        }
    }
    names
}
