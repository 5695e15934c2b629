//! Detector registry and type resolution.

use super::{suggested_name_for, Detection, ProjectDetector, ProjectInfo, ProjectType};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn ProjectDetector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::EngineDetector));
        registry.register(Arc::new(super::CrossJsDetector));
        registry.register(Arc::new(super::ManagedDetector));
        registry.register(Arc::new(super::NativeDetector));
        registry.register(Arc::new(super::WebDetector));
        registry
    }

    pub fn register(&mut self, detector: Arc<dyn ProjectDetector>) {
        self.detectors.push(detector);
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run every detector against `root` and pick the winner.
    ///
    /// Resolution is order-independent: results are fully re-sorted by
    /// `(confidence, priority)` descending, so registration order never
    /// decides the outcome. Equal-confidence ties fall to the detector
    /// with the higher priority rank (most-specific marker wins). A
    /// detector error is logged and treated as no evidence for that
    /// detector only; this function never fails.
    pub fn resolve(&self, root: &Path) -> ProjectInfo {
        let mut results: Vec<(Detection, u8)> = Vec::new();

        for detector in &self.detectors {
            match detector.detect(root) {
                Ok(Some(detection)) => {
                    debug!(
                        detector = detector.name(),
                        confidence = detection.confidence,
                        "detector matched"
                    );
                    results.push((detection, detector.priority()));
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        detector = detector.name(),
                        error = %err,
                        "detector failed, treating as no evidence"
                    );
                }
            }
        }

        results.sort_by(|(a, ap), (b, bp)| {
            b.clamped_confidence()
                .cmp(&a.clamped_confidence())
                .then(bp.cmp(ap))
        });

        match results.into_iter().next() {
            Some((detection, _)) => ProjectInfo {
                path: root.to_path_buf(),
                project_type: detection.project_type,
                confidence: detection.clamped_confidence(),
                evidence: detection.evidence,
                suggested_name: suggested_name_for(root),
            },
            None => {
                debug!(root = %root.display(), "no detector matched");
                ProjectInfo::unknown(root)
            }
        }
    }

    /// All non-null detections, sorted like [`DetectorRegistry::resolve`].
    /// Useful for diagnostics output.
    pub fn resolve_all(&self, root: &Path) -> Vec<(ProjectType, u8)> {
        let mut results: Vec<(ProjectType, u8, u8)> = self
            .detectors
            .iter()
            .filter_map(|d| match d.detect(root) {
                Ok(Some(detection)) => Some((
                    detection.project_type,
                    detection.clamped_confidence(),
                    d.priority(),
                )),
                _ => None,
            })
            .collect();
        results.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)));
        results.into_iter().map(|(t, c, _)| (t, c)).collect()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::fs;
    use tempfile::TempDir;

    struct FailingDetector;

    impl ProjectDetector for FailingDetector {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn project_type(&self) -> ProjectType {
            ProjectType::Native
        }
        fn priority(&self) -> u8 {
            99
        }
        fn detect(&self, _root: &Path) -> anyhow::Result<Option<Detection>> {
            Err(anyhow!("simulated probe failure"))
        }
    }

    struct FixedDetector {
        project_type: ProjectType,
        confidence: u32,
        priority: u8,
    }

    impl ProjectDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn project_type(&self) -> ProjectType {
            self.project_type
        }
        fn priority(&self) -> u8 {
            self.priority
        }
        fn detect(&self, _root: &Path) -> anyhow::Result<Option<Detection>> {
            let mut d = Detection::new(self.project_type);
            d.add_signal(self.confidence, None);
            Ok(Some(d))
        }
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = DetectorRegistry::with_defaults();
        let names = registry.detector_names();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"web"));
        assert!(names.contains(&"engine"));
    }

    #[test]
    fn test_resolve_unknown_for_empty_dir() {
        let dir = TempDir::new().unwrap();
        let info = DetectorRegistry::with_defaults().resolve(dir.path());
        assert_eq!(info.project_type, ProjectType::Unknown);
        assert_eq!(info.confidence, 0);
        assert!(info.evidence.is_empty());
        assert!(!info.suggested_name.is_empty());
    }

    #[test]
    fn test_resolve_picks_highest_confidence() {
        let dir = TempDir::new().unwrap();
        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(FixedDetector {
            project_type: ProjectType::Web,
            confidence: 30,
            priority: 10,
        }));
        registry.register(Arc::new(FixedDetector {
            project_type: ProjectType::Native,
            confidence: 80,
            priority: 20,
        }));

        let info = registry.resolve(dir.path());
        assert_eq!(info.project_type, ProjectType::Native);
        assert_eq!(info.confidence, 80);
    }

    #[test]
    fn test_resolution_is_order_independent() {
        let dir = TempDir::new().unwrap();
        let make = |first_native: bool| {
            let mut registry = DetectorRegistry::new();
            let web = Arc::new(FixedDetector {
                project_type: ProjectType::Web,
                confidence: 30,
                priority: 10,
            });
            let native = Arc::new(FixedDetector {
                project_type: ProjectType::Native,
                confidence: 80,
                priority: 20,
            });
            if first_native {
                registry.register(native);
                registry.register(web);
            } else {
                registry.register(web);
                registry.register(native);
            }
            registry.resolve(dir.path()).project_type
        };
        assert_eq!(make(true), make(false));
    }

    #[test]
    fn test_tie_breaks_by_priority_not_registration() {
        let dir = TempDir::new().unwrap();
        let mut registry = DetectorRegistry::new();
        // Lower-priority detector registered first; same confidence.
        registry.register(Arc::new(FixedDetector {
            project_type: ProjectType::Web,
            confidence: 50,
            priority: 10,
        }));
        registry.register(Arc::new(FixedDetector {
            project_type: ProjectType::CrossJs,
            confidence: 50,
            priority: 40,
        }));

        let info = registry.resolve(dir.path());
        assert_eq!(info.project_type, ProjectType::CrossJs);
    }

    #[test]
    fn test_detector_failure_is_isolated() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(FailingDetector));
        registry.register(Arc::new(super::super::WebDetector));

        let info = registry.resolve(dir.path());
        assert_eq!(info.project_type, ProjectType::Web);
        assert!(info.confidence > 0);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let dir = TempDir::new().unwrap();
        let mut registry = DetectorRegistry::new();
        registry.register(Arc::new(FixedDetector {
            project_type: ProjectType::Engine,
            confidence: 100_000,
            priority: 50,
        }));

        let info = registry.resolve(dir.path());
        assert_eq!(info.confidence, 100);
    }

    #[test]
    fn test_exclusion_rule_end_to_end() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"react-native": "0.73.0", "expo": "50.0.0"}}"#,
        )
        .unwrap();

        let info = DetectorRegistry::with_defaults().resolve(dir.path());
        assert_eq!(info.project_type, ProjectType::CrossJs);
    }

    #[test]
    fn test_resolve_all_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("CMakeLists.txt"), "project(x)").unwrap();

        let all = DetectorRegistry::with_defaults().resolve_all(dir.path());
        assert!(all.len() >= 2);
        assert!(all.windows(2).all(|w| w[0].1 >= w[1].1));
    }
}
