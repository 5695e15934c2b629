//! Web pipeline: wraps a static or bundled web app in a WebView shell.

use super::{gradle, gradle_apk_path, gradle_task, BuildContext, BuildPipeline};
use crate::detect::ProjectType;
use crate::env::ToolchainRole;
use crate::error::BuildError;
use crate::generators::{
    DefaultIconGenerator, DefaultManifestGenerator, GradleScaffold, IconGenerator,
    ManifestGenerator, ModuleSpec,
};
use crate::options::SignMode;
use crate::util::fs as futil;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct WebPipeline;

const REQUIRED_ROLES: [ToolchainRole; 4] = [
    ToolchainRole::JavaHome,
    ToolchainRole::AndroidSdk,
    ToolchainRole::GradleHome,
    ToolchainRole::GradleCache,
];

#[async_trait]
impl BuildPipeline for WebPipeline {
    fn project_type(&self) -> ProjectType {
        ProjectType::Web
    }

    fn required_roles(&self) -> &'static [ToolchainRole] {
        &REQUIRED_ROLES
    }

    async fn prepare(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.init_scratch_dir()?;
        let assets = scratch.join("app/src/main/assets/www");
        std::fs::create_dir_all(&assets)?;

        let source = ctx.source_path.clone();
        let copied = futil::copy_project(&source, &assets)
            .map_err(|e| BuildError::stage("prepare", e.to_string()))?;
        info!(files = copied, "web assets staged");

        if !assets.join("index.html").is_file() {
            return Err(BuildError::stage(
                "prepare",
                "project has no index.html to serve as the app entry point",
            ));
        }
        Ok(())
    }

    async fn configure(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();
        let main = scratch.join("app/src/main");

        DefaultManifestGenerator
            .generate(&ctx.options, &main.join("AndroidManifest.xml"))
            .map_err(|e| BuildError::Configuration(e.to_string()))?;

        GradleScaffold
            .write(
                &ctx.options,
                &scratch,
                ctx.env.root(ToolchainRole::AndroidSdk),
                &ModuleSpec::default(),
            )
            .map_err(|e| BuildError::Configuration(e.to_string()))?;

        DefaultIconGenerator
            .generate(ctx.options.icon_source.as_deref(), &main.join("res"))
            .map_err(|e| BuildError::Configuration(e.to_string()))?;

        write_activity_source(&main, &ctx.options.package_name)?;
        Ok(())
    }

    async fn build(&self, ctx: &mut BuildContext) -> Result<PathBuf, BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();
        let release = ctx.options.sign_mode == SignMode::Release;

        gradle::run_gradle(ctx, &scratch, gradle_task(release)).await?;

        let apk = gradle_apk_path(&scratch, release);
        if !apk.is_file() {
            return Err(BuildError::ArtifactMissing { expected: apk });
        }
        Ok(apk)
    }
}

/// WebView shell activity, placed under the reverse-domain package path.
fn write_activity_source(main_dir: &Path, package_name: &str) -> Result<(), BuildError> {
    let java_dir = main_dir
        .join("java")
        .join(futil::package_to_path(package_name));
    std::fs::create_dir_all(&java_dir)?;

    let source = format!(
        r#"package {package_name};

import android.app.Activity;
import android.os.Bundle;
import android.webkit.WebSettings;
import android.webkit.WebView;
import android.webkit.WebViewClient;

public class MainActivity extends Activity {{
    @Override
    protected void onCreate(Bundle savedInstanceState) {{
        super.onCreate(savedInstanceState);
        WebView webView = new WebView(this);
        WebSettings settings = webView.getSettings();
        settings.setJavaScriptEnabled(true);
        settings.setDomStorageEnabled(true);
        settings.setAllowFileAccess(true);
        webView.setWebViewClient(new WebViewClient());
        webView.loadUrl("file:///android_asset/www/index.html");
        setContentView(webView);
    }}
}}
"#
    );

    std::fs::write(java_dir.join("MainActivity.java"), source)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::OfflineEnvironment;
    use crate::options::BuildOptions;
    use std::fs;
    use tempfile::TempDir;

    fn web_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html><body>hi</body></html>").unwrap();
        fs::write(dir.path().join("app.js"), "console.log('hi')").unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "site"}"#).unwrap();
        dir
    }

    fn context(source: &Path) -> BuildContext {
        BuildContext::new(
            source,
            BuildOptions::named("Demo", "com.example.demo"),
            OfflineEnvironment::resolve("/opt/toolchains"),
        )
    }

    #[tokio::test]
    async fn test_prepare_stages_assets_without_mutating_source() {
        let fixture = web_fixture();
        let before: Vec<_> = fs::read_dir(fixture.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();

        let mut ctx = context(fixture.path());
        WebPipeline.prepare(&mut ctx).await.unwrap();

        let scratch = ctx.scratch_dir().unwrap();
        assert!(scratch.join("app/src/main/assets/www/index.html").is_file());

        let after: Vec<_> = fs::read_dir(fixture.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(before.len(), after.len());

        fs::remove_dir_all(scratch).unwrap();
    }

    #[tokio::test]
    async fn test_prepare_requires_index_html() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.css"), "body{}").unwrap();

        let mut ctx = context(dir.path());
        let err = WebPipeline.prepare(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("index.html"));
        fs::remove_dir_all(ctx.scratch_dir().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_configure_emits_manifest_and_relocated_source() {
        let fixture = web_fixture();
        let mut ctx = context(fixture.path());
        WebPipeline.prepare(&mut ctx).await.unwrap();
        WebPipeline.configure(&mut ctx).await.unwrap();

        let scratch = ctx.scratch_dir().unwrap();
        let manifest =
            fs::read_to_string(scratch.join("app/src/main/AndroidManifest.xml")).unwrap();
        assert!(manifest.contains(r#"package="com.example.demo""#));
        assert!(manifest.contains(r#"android:label="Demo""#));
        assert!(manifest.contains("android.permission.INTERNET"));

        let activity = scratch.join("app/src/main/java/com/example/demo/MainActivity.java");
        assert!(activity.is_file());
        let source = fs::read_to_string(activity).unwrap();
        assert!(source.contains("package com.example.demo;"));
        assert!(source.contains("android_asset/www/index.html"));

        fs::remove_dir_all(scratch).unwrap();
    }

    #[tokio::test]
    async fn test_configure_is_idempotent() {
        let fixture = web_fixture();
        let mut ctx = context(fixture.path());
        WebPipeline.prepare(&mut ctx).await.unwrap();

        WebPipeline.configure(&mut ctx).await.unwrap();
        let scratch = ctx.scratch_dir().unwrap().to_path_buf();
        let manifest_path = scratch.join("app/src/main/AndroidManifest.xml");
        let gradle_path = scratch.join("app/build.gradle");
        let first_manifest = fs::read(&manifest_path).unwrap();
        let first_gradle = fs::read(&gradle_path).unwrap();

        WebPipeline.configure(&mut ctx).await.unwrap();
        assert_eq!(fs::read(&manifest_path).unwrap(), first_manifest);
        assert_eq!(fs::read(&gradle_path).unwrap(), first_gradle);

        fs::remove_dir_all(scratch).unwrap();
    }

    #[test]
    fn test_required_roles() {
        let roles = WebPipeline.required_roles();
        assert!(roles.contains(&ToolchainRole::GradleHome));
        assert!(!roles.contains(&ToolchainRole::UnityEditor));
    }
}
