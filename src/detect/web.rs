//! Web project detector.
//!
//! Matches plain or bundled web apps meant to ship inside a WebView
//! shell. Yields to the cross-platform JS detector when `package.json`
//! carries a `react-native` or `expo` dependency, so JS ecosystems are
//! never classified twice.

use super::cross_js::has_cross_js_dependency;
use super::{count_files_with_extensions, Detection, ProjectDetector, ProjectType};
use anyhow::Result;
use std::path::Path;

pub const INDEX_HTML_WEIGHT: u32 = 40;
pub const PACKAGE_JSON_WEIGHT: u32 = 20;
pub const SOURCE_FILE_WEIGHT: u32 = 2;
pub const SOURCE_FILE_CAP: u32 = 20;

const SOURCE_EXTENSIONS: &[&str] = &["html", "js", "css"];

pub struct WebDetector;

impl ProjectDetector for WebDetector {
    fn name(&self) -> &'static str {
        "web"
    }

    fn project_type(&self) -> ProjectType {
        ProjectType::Web
    }

    fn priority(&self) -> u8 {
        10
    }

    fn detect(&self, root: &Path) -> Result<Option<Detection>> {
        let package_json = root.join("package.json");
        if package_json.is_file() && has_cross_js_dependency(&package_json) {
            // A react-native/expo project also carries web-looking files;
            // that classification belongs to the cross-js detector.
            return Ok(None);
        }

        let mut detection = Detection::new(ProjectType::Web);

        let index_html = root.join("index.html");
        if index_html.is_file() {
            detection.add_signal(INDEX_HTML_WEIGHT, Some(&index_html));
        }
        if package_json.is_file() {
            detection.add_signal(PACKAGE_JSON_WEIGHT, Some(&package_json));
        }

        let (count, samples) = count_files_with_extensions(root, SOURCE_EXTENSIONS);
        if count > 0 {
            let score = (count as u32 * SOURCE_FILE_WEIGHT).min(SOURCE_FILE_CAP);
            detection.confidence += score;
            for sample in samples {
                if detection.evidence.len() >= super::EVIDENCE_CAP {
                    break;
                }
                if !detection.evidence.contains(&sample) {
                    detection.evidence.push(sample);
                }
            }
        }

        Ok(detection.has_evidence().then_some(detection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detects_plain_web_project() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        fs::write(dir.path().join("style.css"), "body{}").unwrap();

        let detection = WebDetector.detect(dir.path()).unwrap().unwrap();
        assert_eq!(detection.project_type, ProjectType::Web);
        // index.html + 3 counted source files
        assert_eq!(detection.confidence, INDEX_HTML_WEIGHT + 3 * SOURCE_FILE_WEIGHT);
    }

    #[test]
    fn test_index_and_package_json_scores_at_least_forty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name":"site"}"#).unwrap();

        let detection = WebDetector.detect(dir.path()).unwrap().unwrap();
        assert!(detection.confidence >= 40);
    }

    #[test]
    fn test_source_file_score_is_capped() {
        let dir = TempDir::new().unwrap();
        for i in 0..50 {
            fs::write(dir.path().join(format!("page{}.html", i)), "<p>").unwrap();
        }

        let detection = WebDetector.detect(dir.path()).unwrap().unwrap();
        assert_eq!(detection.confidence, SOURCE_FILE_CAP);
    }

    #[test]
    fn test_yields_to_cross_js_projects() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"react-native": "0.73.0"}}"#,
        )
        .unwrap();

        assert!(WebDetector.detect(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_no_evidence_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "# hi").unwrap();
        assert!(WebDetector.detect(dir.path()).unwrap().is_none());
    }
}
