//! AndroidManifest.xml emission.

use crate::options::BuildOptions;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Emits the platform manifest for a configured build.
pub trait ManifestGenerator: Send + Sync {
    /// Write a manifest embedding the package identifier, display name,
    /// permission declarations and launcher entry point to `out_path`.
    fn generate(&self, options: &BuildOptions, out_path: &Path) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultManifestGenerator;

impl ManifestGenerator for DefaultManifestGenerator {
    fn generate(&self, options: &BuildOptions, out_path: &Path) -> Result<()> {
        let mut xml = String::new();
        writeln!(xml, r#"<?xml version="1.0" encoding="utf-8"?>"#).unwrap();
        writeln!(
            xml,
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android""#
        )
        .unwrap();
        writeln!(xml, r#"    package="{}">"#, options.package_name).unwrap();
        writeln!(xml).unwrap();

        // BTreeSet iteration keeps permission order stable across runs.
        for permission in options.effective_permissions() {
            writeln!(xml, r#"    <uses-permission android:name="{}" />"#, permission).unwrap();
        }

        writeln!(xml).unwrap();
        writeln!(xml, r#"    <application"#).unwrap();
        writeln!(xml, r#"        android:label="{}""#, options.app_name).unwrap();
        writeln!(xml, r#"        android:icon="@mipmap/ic_launcher""#).unwrap();
        writeln!(xml, r#"        android:allowBackup="true">"#).unwrap();
        writeln!(xml, r#"        <activity"#).unwrap();
        writeln!(xml, r#"            android:name=".MainActivity""#).unwrap();
        writeln!(xml, r#"            android:exported="true">"#).unwrap();
        writeln!(xml, r#"            <intent-filter>"#).unwrap();
        writeln!(
            xml,
            r#"                <action android:name="android.intent.action.MAIN" />"#
        )
        .unwrap();
        writeln!(
            xml,
            r#"                <category android:name="android.intent.category.LAUNCHER" />"#
        )
        .unwrap();
        writeln!(xml, r#"            </intent-filter>"#).unwrap();
        writeln!(xml, r#"        </activity>"#).unwrap();
        writeln!(xml, r#"    </application>"#).unwrap();
        writeln!(xml, r#"</manifest>"#).unwrap();

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out_path, xml)
            .with_context(|| format!("failed to write manifest to {}", out_path.display()))?;
        Ok(())
    }
}
