//! Engine pipeline: Unity-like projects driven through the editor in
//! batch mode.
//!
//! Detection has already passed by the time this pipeline runs, so a
//! missing `Assets/` or `ProjectSettings/` directory is a fatal
//! configuration error here, not a low-confidence outcome.

use super::{BuildContext, BuildPipeline};
use crate::detect::ProjectType;
use crate::env::ToolchainRole;
use crate::error::BuildError;
use crate::process::CommandSpec;
use crate::util::fs as futil;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct EnginePipeline;

const REQUIRED_ROLES: [ToolchainRole; 4] = [
    ToolchainRole::UnityEditor,
    ToolchainRole::JavaHome,
    ToolchainRole::AndroidSdk,
    ToolchainRole::AndroidNdk,
];

/// Output location the generated editor build method writes to,
/// relative to the scratch project root.
const OUTPUT_APK: &str = "Builds/app.apk";

const BUILD_METHOD: &str = "BatchBuild.BuildAndroid";

#[async_trait]
impl BuildPipeline for EnginePipeline {
    fn project_type(&self) -> ProjectType {
        ProjectType::Engine
    }

    fn required_roles(&self) -> &'static [ToolchainRole] {
        &REQUIRED_ROLES
    }

    async fn prepare(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        for marker in ["Assets", "ProjectSettings"] {
            if !ctx.source_path.join(marker).is_dir() {
                return Err(BuildError::Configuration(format!(
                    "engine project is missing its {}/ directory",
                    marker
                )));
            }
        }

        let scratch = ctx.init_scratch_dir()?;
        let source = ctx.source_path.clone();
        let copied = futil::copy_project(&source, &scratch)
            .map_err(|e| BuildError::stage("prepare", e.to_string()))?;
        info!(files = copied, "engine project staged");
        Ok(())
    }

    async fn configure(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();
        write_build_script(&scratch, ctx)?;
        Ok(())
    }

    async fn build(&self, ctx: &mut BuildContext) -> Result<PathBuf, BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();
        let editor = ctx
            .env
            .root(ToolchainRole::UnityEditor)
            .join("Editor")
            .join("Unity");

        let spec = CommandSpec::new(editor)
            .args(["-batchmode", "-quit", "-nographics"])
            .args(["-projectPath", &scratch.display().to_string()])
            .args(["-buildTarget", "Android"])
            .args(["-executeMethod", BUILD_METHOD])
            .args(["-logFile", "-"])
            .env(
                "JAVA_HOME",
                ctx.env.root(ToolchainRole::JavaHome).display().to_string(),
            )
            .env(
                "ANDROID_HOME",
                ctx.env.root(ToolchainRole::AndroidSdk).display().to_string(),
            )
            .env(
                "ANDROID_NDK_HOME",
                ctx.env.root(ToolchainRole::AndroidNdk).display().to_string(),
            );

        ctx.runner.run_checked(&spec, ctx.line_sink()).await?;

        let apk = scratch.join(OUTPUT_APK);
        if !apk.is_file() {
            return Err(BuildError::ArtifactMissing { expected: apk });
        }
        Ok(apk)
    }
}

/// Editor-side build method invoked through `-executeMethod`. Generated
/// into `Assets/Editor/` with the build identity baked in.
fn write_build_script(scratch: &Path, ctx: &BuildContext) -> Result<(), BuildError> {
    let editor_dir = scratch.join("Assets").join("Editor");
    std::fs::create_dir_all(&editor_dir)?;

    let script = format!(
        r#"using System.Linq;
using UnityEditor;
using UnityEngine;

public static class BatchBuild
{{
    public static void BuildAndroid()
    {{
        PlayerSettings.productName = "{app_name}";
        PlayerSettings.SetApplicationIdentifier(BuildTargetGroup.Android, "{package_name}");
        PlayerSettings.bundleVersion = "{version_name}";
        PlayerSettings.Android.bundleVersionCode = {version_code};
        PlayerSettings.Android.minSdkVersion = (AndroidSdkVersions){min_sdk};
        PlayerSettings.Android.targetSdkVersion = (AndroidSdkVersions){target_sdk};

        string[] scenes = EditorBuildSettings.scenes
            .Where(s => s.enabled)
            .Select(s => s.path)
            .ToArray();

        BuildPipeline.BuildPlayer(scenes, "{output}", BuildTarget.Android, BuildOptions.None);
    }}
}}
"#,
        app_name = ctx.options.app_name,
        package_name = ctx.options.package_name,
        version_name = ctx.options.version_name,
        version_code = ctx.options.version_code,
        min_sdk = ctx.options.min_sdk,
        target_sdk = ctx.options.target_sdk,
        output = OUTPUT_APK,
    );

    std::fs::write(editor_dir.join("BatchBuild.cs"), script)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::OfflineEnvironment;
    use crate::options::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    fn engine_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Assets")).unwrap();
        fs::create_dir(dir.path().join("ProjectSettings")).unwrap();
        fs::write(
            dir.path().join("ProjectSettings/ProjectVersion.txt"),
            "m_EditorVersion: 2022.3.10f1",
        )
        .unwrap();
        dir
    }

    fn context(source: &Path) -> BuildContext {
        BuildContext::new(
            source,
            BuildOptions::named("EngineDemo", "com.example.enginedemo"),
            OfflineEnvironment::resolve("/opt/toolchains"),
        )
    }

    #[tokio::test]
    async fn test_prepare_rejects_missing_markers() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Assets")).unwrap();

        let mut ctx = context(dir.path());
        let err = EnginePipeline.prepare(&mut ctx).await.unwrap_err();
        assert!(matches!(err, BuildError::Configuration(_)));
        assert!(err.to_string().contains("ProjectSettings"));
    }

    #[tokio::test]
    async fn test_prepare_copies_markers() {
        let fixture = engine_fixture();
        let mut ctx = context(fixture.path());
        EnginePipeline.prepare(&mut ctx).await.unwrap();

        let scratch = ctx.scratch_dir().unwrap();
        assert!(scratch.join("Assets").is_dir());
        assert!(scratch.join("ProjectSettings/ProjectVersion.txt").is_file());

        fs::remove_dir_all(scratch).unwrap();
    }

    #[tokio::test]
    async fn test_configure_generates_build_method() {
        let fixture = engine_fixture();
        let mut ctx = context(fixture.path());
        EnginePipeline.prepare(&mut ctx).await.unwrap();
        EnginePipeline.configure(&mut ctx).await.unwrap();

        let scratch = ctx.scratch_dir().unwrap();
        let script =
            fs::read_to_string(scratch.join("Assets/Editor/BatchBuild.cs")).unwrap();
        assert!(script.contains("com.example.enginedemo"));
        assert!(script.contains("BuildTarget.Android"));
        assert!(script.contains("bundleVersionCode = 1"));

        fs::remove_dir_all(scratch).unwrap();
    }

    #[tokio::test]
    async fn test_configure_is_idempotent() {
        let fixture = engine_fixture();
        let mut ctx = context(fixture.path());
        EnginePipeline.prepare(&mut ctx).await.unwrap();

        EnginePipeline.configure(&mut ctx).await.unwrap();
        let scratch = ctx.scratch_dir().unwrap().to_path_buf();
        let first = fs::read(scratch.join("Assets/Editor/BatchBuild.cs")).unwrap();
        EnginePipeline.configure(&mut ctx).await.unwrap();
        assert_eq!(
            fs::read(scratch.join("Assets/Editor/BatchBuild.cs")).unwrap(),
            first
        );

        fs::remove_dir_all(scratch).unwrap();
    }

    #[test]
    fn test_required_roles_include_editor() {
        assert!(EnginePipeline
            .required_roles()
            .contains(&ToolchainRole::UnityEditor));
    }
}
