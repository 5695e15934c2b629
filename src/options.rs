//! Build request configuration.
//!
//! [`BuildOptions`] is constructed once per build request and read-only
//! through the pipeline. Defaults are supplied centrally: min SDK 21,
//! target/compile SDK 34, two arm ABIs, debug signing, INTERNET
//! permission only, shrinking off.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// SDK level defaults.
pub const DEFAULT_MIN_SDK: u32 = 21;
pub const DEFAULT_TARGET_SDK: u32 = 34;
pub const DEFAULT_COMPILE_SDK: u32 = 34;

/// Permission every generated manifest declares regardless of input.
pub const INTERNET_PERMISSION: &str = "android.permission.INTERNET";

const DEFAULT_ABIS: [&str; 2] = ["arm64-v8a", "armeabi-v7a"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMode {
    Debug,
    Release,
}

/// Keystore credentials for release signing. All four fields are
/// required; completeness is checked at the sign stage, not defaulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseCredentials {
    pub keystore: PathBuf,
    pub store_pass: String,
    pub key_pass: String,
    pub key_alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Display name of the application.
    pub app_name: String,
    /// Reverse-domain package identifier, e.g. `com.example.notes`.
    pub package_name: String,
    /// Semantic version string shown to users.
    pub version_name: String,
    /// Monotonically increasing version code.
    pub version_code: u32,
    pub min_sdk: u32,
    pub target_sdk: u32,
    pub compile_sdk: u32,
    /// Target instruction-set architectures.
    pub abis: BTreeSet<String>,
    pub sign_mode: SignMode,
    pub release_credentials: Option<ReleaseCredentials>,
    /// Source image for launcher icons; a placeholder is generated when
    /// absent.
    pub icon_source: Option<PathBuf>,
    /// Requested permission identifiers. INTERNET is always added back
    /// during manifest emission.
    pub permissions: BTreeSet<String>,
    /// Code-shrinking toggle (R8/minify for gradle-based variants).
    pub shrink: bool,
    /// Where the signed artifact is placed; defaults to `<source>/dist`.
    pub output_dir: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            app_name: "app".to_string(),
            package_name: "com.example.app".to_string(),
            version_name: "1.0.0".to_string(),
            version_code: 1,
            min_sdk: DEFAULT_MIN_SDK,
            target_sdk: DEFAULT_TARGET_SDK,
            compile_sdk: DEFAULT_COMPILE_SDK,
            abis: DEFAULT_ABIS.iter().map(|s| s.to_string()).collect(),
            sign_mode: SignMode::Debug,
            release_credentials: None,
            icon_source: None,
            permissions: [INTERNET_PERMISSION.to_string()].into_iter().collect(),
            shrink: false,
            output_dir: None,
        }
    }
}

impl BuildOptions {
    /// Options for an app with the given display and package names.
    pub fn named(app_name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            package_name: package_name.into(),
            ..Default::default()
        }
    }

    /// Shape checks that do not depend on the filesystem. Release
    /// credential completeness is deliberately left to the sign stage.
    pub fn validate(&self) -> Result<(), String> {
        if self.app_name.trim().is_empty() {
            return Err("app name must not be empty".to_string());
        }
        if !valid_package_name(&self.package_name) {
            return Err(format!(
                "invalid package name '{}': expected reverse-domain form like com.example.app",
                self.package_name
            ));
        }
        if self.version_code == 0 {
            return Err("version code must be greater than zero".to_string());
        }
        if self.min_sdk > self.target_sdk {
            return Err(format!(
                "min SDK {} exceeds target SDK {}",
                self.min_sdk, self.target_sdk
            ));
        }
        if self.abis.is_empty() {
            return Err("at least one target ABI is required".to_string());
        }
        Ok(())
    }

    /// Permission set as emitted into the manifest: the caller's set with
    /// INTERNET always present.
    pub fn effective_permissions(&self) -> BTreeSet<String> {
        let mut set = self.permissions.clone();
        set.insert(INTERNET_PERMISSION.to_string());
        set
    }
}

fn valid_package_name(name: &str) -> bool {
    let segments: Vec<&str> = name.split('.').collect();
    if segments.len() < 2 {
        return false;
    }
    segments.iter().all(|seg| {
        !seg.is_empty()
            && seg.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
            && seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}
