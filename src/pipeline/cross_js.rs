//! Cross-platform JS pipeline: React Native and Expo projects.
//!
//! Expo managed projects carry no `android/` subproject; for those the
//! build first runs a prebuild scaffold step inside the scratch copy,
//! converting it into a project with a native subproject, then proceeds
//! down the same gradle path as bare React Native.

use super::{gradle, gradle_task, BuildContext, BuildPipeline};
use crate::detect::{has_expo_dependency, ProjectType};
use crate::env::ToolchainRole;
use crate::error::BuildError;
use crate::options::SignMode;
use crate::process::CommandSpec;
use crate::util::fs as futil;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct CrossJsPipeline;

const REQUIRED_ROLES: [ToolchainRole; 6] = [
    ToolchainRole::JavaHome,
    ToolchainRole::AndroidSdk,
    ToolchainRole::GradleHome,
    ToolchainRole::GradleCache,
    ToolchainRole::NodeHome,
    ToolchainRole::NodeCache,
];

#[async_trait]
impl BuildPipeline for CrossJsPipeline {
    fn project_type(&self) -> ProjectType {
        ProjectType::CrossJs
    }

    fn required_roles(&self) -> &'static [ToolchainRole] {
        &REQUIRED_ROLES
    }

    async fn prepare(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.init_scratch_dir()?;
        let source = ctx.source_path.clone();
        let copied = futil::copy_project(&source, &scratch)
            .map_err(|e| BuildError::stage("prepare", e.to_string()))?;
        info!(files = copied, "project staged");

        if !scratch.join("package.json").is_file() {
            return Err(BuildError::stage(
                "prepare",
                "project has no package.json",
            ));
        }
        Ok(())
    }

    async fn configure(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();

        if has_expo_dependency(&scratch.join("package.json")) {
            apply_expo_config(&scratch, ctx)?;
        }
        if scratch.join("android/app/build.gradle").is_file() {
            patch_android_module(&scratch, ctx)?;
        }
        Ok(())
    }

    async fn build(&self, ctx: &mut BuildContext) -> Result<PathBuf, BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();

        run_npm_install(ctx, &scratch).await?;

        let android_dir = scratch.join("android");
        if !android_dir.is_dir() {
            if has_expo_dependency(&scratch.join("package.json")) {
                run_expo_prebuild(ctx, &scratch).await?;
            } else {
                return Err(BuildError::stage(
                    "build",
                    "project has no android subproject and no expo dependency to scaffold one",
                ));
            }
        }

        let release = ctx.options.sign_mode == SignMode::Release;
        gradle::run_gradle(ctx, &android_dir, gradle_task(release)).await?;

        let apk = super::gradle_apk_path(&android_dir, release);
        if !apk.is_file() {
            return Err(BuildError::ArtifactMissing { expected: apk });
        }
        Ok(apk)
    }
}

/// Merge the build identity into `app.json`'s expo section. Existing
/// unrelated keys are preserved; re-running with the same options is a
/// no-op.
fn apply_expo_config(scratch: &Path, ctx: &BuildContext) -> Result<(), BuildError> {
    let app_json = scratch.join("app.json");
    let mut root: Value = if app_json.is_file() {
        let content = std::fs::read_to_string(&app_json)?;
        serde_json::from_str(&content)
            .map_err(|e| BuildError::Configuration(format!("invalid app.json: {}", e)))?
    } else {
        json!({})
    };

    let expo = root
        .as_object_mut()
        .ok_or_else(|| BuildError::Configuration("app.json root is not an object".into()))?
        .entry("expo")
        .or_insert_with(|| json!({}));
    let expo = expo
        .as_object_mut()
        .ok_or_else(|| BuildError::Configuration("app.json expo section is not an object".into()))?;

    expo.insert("name".into(), json!(ctx.options.app_name));
    expo.insert("slug".into(), json!(ctx.options.app_name.to_lowercase()));
    expo.insert("version".into(), json!(ctx.options.version_name));
    let android = expo.entry("android").or_insert_with(|| json!({}));
    if let Some(android) = android.as_object_mut() {
        android.insert("package".into(), json!(ctx.options.package_name));
        android.insert("versionCode".into(), json!(ctx.options.version_code));
    }

    let mut rendered = serde_json::to_string_pretty(&root)
        .map_err(|e| BuildError::Configuration(e.to_string()))?;
    rendered.push('\n');
    std::fs::write(&app_json, rendered)?;
    Ok(())
}

/// Rewrite identity fields inside an existing React Native android
/// module script.
fn patch_android_module(scratch: &Path, ctx: &BuildContext) -> Result<(), BuildError> {
    let module = scratch.join("android/app/build.gradle");
    let content = std::fs::read_to_string(&module)?;

    let replacements = [
        (
            regex::Regex::new(r#"applicationId\s+["'][^"']*["']"#).unwrap(),
            format!("applicationId \"{}\"", ctx.options.package_name),
        ),
        (
            regex::Regex::new(r"versionCode\s+\d+").unwrap(),
            format!("versionCode {}", ctx.options.version_code),
        ),
        (
            regex::Regex::new(r#"versionName\s+["'][^"']*["']"#).unwrap(),
            format!("versionName \"{}\"", ctx.options.version_name),
        ),
    ];

    let mut patched = content;
    for (pattern, replacement) in replacements {
        patched = pattern
            .replace(&patched, replacement.as_str())
            .into_owned();
    }
    std::fs::write(&module, patched)?;
    Ok(())
}

async fn run_npm_install(ctx: &BuildContext, scratch: &Path) -> Result<(), BuildError> {
    let spec = node_command(ctx, "npm", scratch)
        .args(["install", "--prefer-offline", "--no-audit", "--no-fund"]);
    ctx.runner.run_checked(&spec, ctx.line_sink()).await?;
    Ok(())
}

async fn run_expo_prebuild(ctx: &BuildContext, scratch: &Path) -> Result<(), BuildError> {
    info!("no android subproject, running expo prebuild");
    let spec = node_command(ctx, "npx", scratch).args([
        "expo",
        "prebuild",
        "--platform",
        "android",
        "--no-install",
    ]);
    ctx.runner.run_checked(&spec, ctx.line_sink()).await?;

    if !scratch.join("android").is_dir() {
        return Err(BuildError::stage(
            "build",
            "expo prebuild completed but produced no android subproject",
        ));
    }
    Ok(())
}

/// Node toolchain command with the offline node distribution and npm
/// cache as an explicit overlay.
fn node_command(ctx: &BuildContext, tool: &str, cwd: &Path) -> CommandSpec {
    let node_home = ctx.env.root(ToolchainRole::NodeHome);
    let node_bin = node_home.join("bin");
    let inherited_path = std::env::var("PATH").unwrap_or_default();

    CommandSpec::new(node_bin.join(tool))
        .cwd(cwd)
        .env("PATH", format!("{}:{}", node_bin.display(), inherited_path))
        .env(
            "npm_config_cache",
            ctx.env.root(ToolchainRole::NodeCache).display().to_string(),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::OfflineEnvironment;
    use crate::options::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    fn context(source: &Path) -> BuildContext {
        BuildContext::new(
            source,
            BuildOptions::named("RnDemo", "com.example.rndemo"),
            OfflineEnvironment::resolve("/opt/toolchains"),
        )
    }

    fn expo_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name": "demo", "dependencies": {"expo": "50.0.0", "react-native": "0.73.0"}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("app.json"),
            r#"{"expo": {"name": "old", "extra": {"keep": true}}}"#,
        )
        .unwrap();
        dir
    }

    #[tokio::test]
    async fn test_prepare_requires_package_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.js"), "").unwrap();
        let mut ctx = context(dir.path());
        let err = CrossJsPipeline.prepare(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("package.json"));
        fs::remove_dir_all(ctx.scratch_dir().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_configure_merges_expo_identity() {
        let fixture = expo_fixture();
        let mut ctx = context(fixture.path());
        CrossJsPipeline.prepare(&mut ctx).await.unwrap();
        CrossJsPipeline.configure(&mut ctx).await.unwrap();

        let scratch = ctx.scratch_dir().unwrap();
        let app_json: Value =
            serde_json::from_str(&fs::read_to_string(scratch.join("app.json")).unwrap())
                .unwrap();
        assert_eq!(app_json["expo"]["name"], "RnDemo");
        assert_eq!(app_json["expo"]["android"]["package"], "com.example.rndemo");
        assert_eq!(app_json["expo"]["android"]["versionCode"], 1);
        // Unrelated keys survive the merge.
        assert_eq!(app_json["expo"]["extra"]["keep"], true);

        fs::remove_dir_all(scratch).unwrap();
    }

    #[tokio::test]
    async fn test_configure_is_idempotent() {
        let fixture = expo_fixture();
        let mut ctx = context(fixture.path());
        CrossJsPipeline.prepare(&mut ctx).await.unwrap();

        CrossJsPipeline.configure(&mut ctx).await.unwrap();
        let scratch = ctx.scratch_dir().unwrap().to_path_buf();
        let first = fs::read(scratch.join("app.json")).unwrap();
        CrossJsPipeline.configure(&mut ctx).await.unwrap();
        assert_eq!(fs::read(scratch.join("app.json")).unwrap(), first);

        fs::remove_dir_all(scratch).unwrap();
    }

    #[tokio::test]
    async fn test_configure_patches_bare_rn_module() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"react-native": "0.73.0"}}"#,
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("android/app")).unwrap();
        fs::write(
            dir.path().join("android/app/build.gradle"),
            "android {\n    defaultConfig {\n        applicationId \"com.old.name\"\n        versionCode 7\n        versionName \"0.9\"\n    }\n}\n",
        )
        .unwrap();

        let mut ctx = context(dir.path());
        CrossJsPipeline.prepare(&mut ctx).await.unwrap();
        CrossJsPipeline.configure(&mut ctx).await.unwrap();

        let scratch = ctx.scratch_dir().unwrap();
        let module =
            fs::read_to_string(scratch.join("android/app/build.gradle")).unwrap();
        assert!(module.contains("applicationId \"com.example.rndemo\""));
        assert!(module.contains("versionCode 1"));
        assert!(module.contains("versionName \"1.0.0\""));

        fs::remove_dir_all(scratch).unwrap();
    }

    #[test]
    fn test_node_command_overlay() {
        let ctx = context(Path::new("/src"));
        let spec = node_command(&ctx, "npm", Path::new("/scratch"));
        let env = spec.get_env();
        assert!(env.get("PATH").unwrap().starts_with("/opt/toolchains/node/bin:"));
        assert_eq!(env.get("npm_config_cache").unwrap(), "/opt/toolchains/npm-cache");
    }
}
