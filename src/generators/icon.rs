//! Launcher icon asset emission.
//!
//! Image resizing is delegated to external tooling; this generator only
//! satisfies the emission contract — every required density gets an
//! `ic_launcher.png`, either copied from the caller's source image or a
//! generated placeholder.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Densities every launcher icon set must cover.
pub const ICON_DENSITIES: [&str; 5] = ["mdpi", "hdpi", "xhdpi", "xxhdpi", "xxxhdpi"];

/// Minimal valid 1x1 transparent PNG used when no source icon is given.
const PLACEHOLDER_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Emits launcher icons for a configured build.
pub trait IconGenerator: Send + Sync {
    /// Populate `res_dir` with a `mipmap-<density>/ic_launcher.png` for
    /// every required density, from `source` or a placeholder.
    fn generate(&self, source: Option<&Path>, res_dir: &Path) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultIconGenerator;

impl IconGenerator for DefaultIconGenerator {
    fn generate(&self, source: Option<&Path>, res_dir: &Path) -> Result<()> {
        let bytes = match source {
            Some(path) => std::fs::read(path)
                .with_context(|| format!("failed to read icon source {}", path.display()))?,
            None => {
                debug!("no icon source supplied, using placeholder");
                PLACEHOLDER_PNG.to_vec()
            }
        };

        for density in ICON_DENSITIES {
            let dir = res_dir.join(format!("mipmap-{}", density));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            std::fs::write(dir.join("ic_launcher.png"), &bytes)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_placeholder_covers_all_densities() {
        let dir = TempDir::new().unwrap();
        DefaultIconGenerator.generate(None, dir.path()).unwrap();

        for density in ICON_DENSITIES {
            let icon = dir.path().join(format!("mipmap-{}/ic_launcher.png", density));
            assert!(icon.is_file(), "missing {}", icon.display());
            let bytes = std::fs::read(&icon).unwrap();
            assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
        }
    }

    #[test]
    fn test_source_image_is_used() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("icon.png");
        std::fs::write(&source, b"fake-png-bytes").unwrap();
        let res = dir.path().join("res");

        DefaultIconGenerator
            .generate(Some(&source), &res)
            .unwrap();

        let emitted = std::fs::read(res.join("mipmap-mdpi/ic_launcher.png")).unwrap();
        assert_eq!(emitted, b"fake-png-bytes");
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = DefaultIconGenerator
            .generate(Some(Path::new("/nope/icon.png")), dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("icon source"));
    }
}
