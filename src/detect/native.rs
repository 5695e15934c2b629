//! Native C/C++ project detector.

use super::{count_files_with_extensions, Detection, ProjectDetector, ProjectType};
use anyhow::Result;
use std::path::Path;

pub const CMAKE_LISTS_WEIGHT: u32 = 50;
pub const ANDROID_MK_WEIGHT: u32 = 30;
pub const SOURCE_FILE_WEIGHT: u32 = 5;
pub const SOURCE_FILE_CAP: u32 = 30;

const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "h", "hpp"];

pub struct NativeDetector;

impl ProjectDetector for NativeDetector {
    fn name(&self) -> &'static str {
        "native"
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::Native
    }

    fn priority(&self) -> u8 {
        20
    }

    fn detect(&self, root: &Path) -> Result<Option<Detection>> {
        let mut detection = Detection::new(ProjectType::Native);

        let cmake = root.join("CMakeLists.txt");
        if cmake.is_file() {
            detection.add_signal(CMAKE_LISTS_WEIGHT, Some(&cmake));
        }

        let android_mk = root.join("jni").join("Android.mk");
        if android_mk.is_file() {
            detection.add_signal(ANDROID_MK_WEIGHT, Some(&android_mk));
        } else {
            let flat = root.join("Android.mk");
            if flat.is_file() {
                detection.add_signal(ANDROID_MK_WEIGHT, Some(&flat));
            }
        }

        let (count, samples) = count_files_with_extensions(root, SOURCE_EXTENSIONS);
        if count > 0 {
            let score = (count as u32 * SOURCE_FILE_WEIGHT).min(SOURCE_FILE_CAP);
            detection.confidence += score;
            for sample in samples {
                if detection.evidence.len() >= super::EVIDENCE_CAP {
                    break;
                }
                detection.evidence.push(sample);
            }
        }

        Ok(detection.has_evidence().then_some(detection))
    }
}
