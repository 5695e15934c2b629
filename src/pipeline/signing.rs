//! APK signing.
//!
//! Debug builds use an auto-generated keystore with fixed well-known
//! credentials, created lazily in a user-level directory and reused
//! across builds. Release builds require the caller to supply all four
//! credential fields; nothing is defaulted. Alignment before signing is
//! best-effort: a missing or failing zipalign degrades to a warning.

use super::BuildContext;
use crate::env::ToolchainRole;
use crate::error::BuildError;
use crate::options::SignMode;
use crate::process::CommandSpec;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEBUG_STORE_PASS: &str = "android";
pub const DEBUG_KEY_ALIAS: &str = "androiddebugkey";
pub const DEBUG_DNAME: &str = "CN=Android Debug,O=Android,C=US";
const DEBUG_VALIDITY_DAYS: &str = "10950";

/// Well-known user-level location of the cached debug keystore.
pub fn debug_keystore_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".apkforge")
        .join("debug.keystore")
}

#[derive(Debug)]
struct SigningKey {
    keystore: PathBuf,
    store_pass: String,
    key_pass: String,
    key_alias: String,
}

/// Sign `artifact`, producing a sibling with a `-signed.apk` suffix.
pub async fn sign_apk(ctx: &mut BuildContext, artifact: &Path) -> Result<PathBuf, BuildError> {
    let key = resolve_key(ctx).await?;

    let aligned = align_best_effort(ctx, artifact).await;
    let input = aligned.as_deref().unwrap_or(artifact);
    let signed = signed_path(artifact);

    let apksigner = build_tool(ctx, "apksigner").ok_or_else(|| {
        BuildError::stage(
            "sign",
            format!(
                "apksigner not found under {}",
                ctx.env.root(ToolchainRole::AndroidSdk).display()
            ),
        )
    })?;

    let spec = CommandSpec::new(apksigner)
        .arg("sign")
        .args(["--ks", &key.keystore.display().to_string()])
        .args(["--ks-pass", &format!("pass:{}", key.store_pass)])
        .args(["--key-pass", &format!("pass:{}", key.key_pass)])
        .args(["--ks-key-alias", &key.key_alias])
        .args(["--out", &signed.display().to_string()])
        .arg(input.display().to_string())
        .env(
            "JAVA_HOME",
            ctx.env.root(ToolchainRole::JavaHome).display().to_string(),
        );

    ctx.runner.run_checked(&spec, ctx.line_sink()).await?;

    if !signed.is_file() {
        return Err(BuildError::ArtifactMissing { expected: signed });
    }
    info!(apk = %signed.display(), "artifact signed");
    Ok(signed)
}

/// `foo.apk` -> `foo-signed.apk`; unsigned-suffixed names collapse to
/// the same convention.
pub fn signed_path(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("app");
    let stem = stem.strip_suffix("-unsigned").unwrap_or(stem);
    artifact.with_file_name(format!("{}-signed.apk", stem))
}

async fn resolve_key(ctx: &mut BuildContext) -> Result<SigningKey, BuildError> {
    match ctx.options.sign_mode {
        SignMode::Debug => {
            let keystore = debug_keystore_path();
            ensure_debug_keystore(ctx, &keystore).await?;
            Ok(SigningKey {
                keystore,
                store_pass: DEBUG_STORE_PASS.to_string(),
                key_pass: DEBUG_STORE_PASS.to_string(),
                key_alias: DEBUG_KEY_ALIAS.to_string(),
            })
        }
        SignMode::Release => {
            let creds = ctx.options.release_credentials.clone().ok_or_else(|| {
                BuildError::Configuration(
                    "release signing requested but no credentials were supplied".to_string(),
                )
            })?;
            let mut missing = Vec::new();
            if creds.keystore.as_os_str().is_empty() {
                missing.push("keystore");
            }
            if creds.store_pass.is_empty() {
                missing.push("store password");
            }
            if creds.key_pass.is_empty() {
                missing.push("key password");
            }
            if creds.key_alias.is_empty() {
                missing.push("key alias");
            }
            if !missing.is_empty() {
                return Err(BuildError::Configuration(format!(
                    "release signing credentials incomplete: missing {}",
                    missing.join(", ")
                )));
            }
            Ok(SigningKey {
                keystore: creds.keystore,
                store_pass: creds.store_pass,
                key_pass: creds.key_pass,
                key_alias: creds.key_alias,
            })
        }
    }
}

/// Generate the debug keystore once; later builds reuse it. Creation
/// goes through a unique temp name and a rename, which keeps the
/// first-use race between concurrent builds harmless.
async fn ensure_debug_keystore(
    ctx: &BuildContext,
    keystore: &Path,
) -> Result<(), BuildError> {
    if keystore.is_file() {
        debug!(keystore = %keystore.display(), "reusing cached debug keystore");
        return Ok(());
    }

    if let Some(parent) = keystore.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let staging = keystore.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));

    let keytool = ctx
        .env
        .root(ToolchainRole::JavaHome)
        .join("bin")
        .join("keytool");
    let spec = CommandSpec::new(keytool)
        .args(["-genkeypair", "-v"])
        .args(["-keystore", &staging.display().to_string()])
        .args(["-storepass", DEBUG_STORE_PASS])
        .args(["-keypass", DEBUG_STORE_PASS])
        .args(["-alias", DEBUG_KEY_ALIAS])
        .args(["-dname", DEBUG_DNAME])
        .args(["-keyalg", "RSA"])
        .args(["-keysize", "2048"])
        .args(["-validity", DEBUG_VALIDITY_DAYS]);

    ctx.runner.run_checked(&spec, ctx.line_sink()).await?;
    std::fs::rename(&staging, keystore)?;
    info!(keystore = %keystore.display(), "generated debug keystore");
    Ok(())
}

/// zipalign the artifact if the tool is available; any failure skips
/// the optimization with a warning instead of failing the build.
async fn align_best_effort(ctx: &mut BuildContext, artifact: &Path) -> Option<PathBuf> {
    let Some(zipalign) = build_tool(ctx, "zipalign") else {
        ctx.warn("zipalign not found in SDK build-tools, skipping alignment");
        return None;
    };

    let aligned = artifact.with_file_name(format!(
        "{}-aligned.apk",
        artifact
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("app")
    ));
    let spec = CommandSpec::new(zipalign)
        .args(["-f", "4"])
        .arg(artifact.display().to_string())
        .arg(aligned.display().to_string());

    match ctx.runner.run(&spec, ctx.line_sink()).await {
        Ok(output) if output.success() && aligned.is_file() => Some(aligned),
        Ok(output) => {
            ctx.warn(format!(
                "zipalign exited with {}, continuing with unaligned artifact",
                output.exit_code
            ));
            None
        }
        Err(err) => {
            ctx.warn(format!("zipalign failed ({}), continuing unaligned", err));
            None
        }
    }
}

/// Newest build-tools installation containing `tool`, if any.
fn build_tool(ctx: &BuildContext, tool: &str) -> Option<PathBuf> {
    let build_tools = ctx.env.root(ToolchainRole::AndroidSdk).join("build-tools");
    let mut versions: Vec<PathBuf> = std::fs::read_dir(&build_tools)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    versions.sort();

    versions
        .into_iter()
        .rev()
        .map(|dir| dir.join(tool))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::OfflineEnvironment;
    use crate::options::{BuildOptions, ReleaseCredentials};

    fn context(options: BuildOptions) -> BuildContext {
        BuildContext::new("/src", options, OfflineEnvironment::resolve("/opt/toolchains"))
    }

    #[test]
    fn test_signed_path_suffix() {
        assert_eq!(
            signed_path(Path::new("/out/app-release-unsigned.apk")),
            Path::new("/out/app-release-signed.apk")
        );
        assert_eq!(
            signed_path(Path::new("/out/app-debug.apk")),
            Path::new("/out/app-debug-signed.apk")
        );
    }

    #[tokio::test]
    async fn test_release_without_credentials_is_a_configuration_error() {
        let mut options = BuildOptions::default();
        options.sign_mode = SignMode::Release;
        let mut ctx = context(options);

        let err = resolve_key(&mut ctx).await.unwrap_err();
        assert!(matches!(err, BuildError::Configuration(_)));
        assert!(err.to_string().contains("no credentials"));
    }

    #[tokio::test]
    async fn test_release_with_partial_credentials_names_missing_fields() {
        let mut options = BuildOptions::default();
        options.sign_mode = SignMode::Release;
        options.release_credentials = Some(ReleaseCredentials {
            keystore: PathBuf::from("/keys/release.jks"),
            store_pass: "secret".to_string(),
            key_pass: String::new(),
            key_alias: String::new(),
        });
        let mut ctx = context(options);

        let err = resolve_key(&mut ctx).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("key password"));
        assert!(msg.contains("key alias"));
        assert!(!msg.contains("store password"));
    }

    #[tokio::test]
    async fn test_release_with_full_credentials_resolves() {
        let mut options = BuildOptions::default();
        options.sign_mode = SignMode::Release;
        options.release_credentials = Some(ReleaseCredentials {
            keystore: PathBuf::from("/keys/release.jks"),
            store_pass: "a".to_string(),
            key_pass: "b".to_string(),
            key_alias: "upload".to_string(),
        });
        let mut ctx = context(options);

        let key = resolve_key(&mut ctx).await.unwrap();
        assert_eq!(key.key_alias, "upload");
        assert_eq!(key.keystore, PathBuf::from("/keys/release.jks"));
    }

    #[test]
    fn test_debug_keystore_path_is_user_level() {
        let path = debug_keystore_path();
        assert!(path.ends_with(".apkforge/debug.keystore"));
    }
}
