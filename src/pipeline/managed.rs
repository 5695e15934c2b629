//! Managed pipeline: .NET MAUI projects built with the dotnet toolchain.

use super::{BuildContext, BuildPipeline};
use crate::detect::ProjectType;
use crate::env::ToolchainRole;
use crate::error::BuildError;
use crate::options::SignMode;
use crate::process::CommandSpec;
use crate::util::fs as futil;
use async_trait::async_trait;
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ManagedPipeline;

const REQUIRED_ROLES: [ToolchainRole; 3] = [
    ToolchainRole::DotnetRoot,
    ToolchainRole::JavaHome,
    ToolchainRole::AndroidSdk,
];

const ANDROID_FRAMEWORK: &str = "net8.0-android";

#[async_trait]
impl BuildPipeline for ManagedPipeline {
    fn project_type(&self) -> ProjectType {
        ProjectType::Managed
    }

    fn required_roles(&self) -> &'static [ToolchainRole] {
        &REQUIRED_ROLES
    }

    async fn prepare(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.init_scratch_dir()?;
        let source = ctx.source_path.clone();
        let copied = futil::copy_project(&source, &scratch)
            .map_err(|e| BuildError::stage("prepare", e.to_string()))?;
        info!(files = copied, "managed project staged");

        if find_csproj(&scratch).is_none() {
            return Err(BuildError::stage(
                "prepare",
                "no .csproj found in the project",
            ));
        }
        Ok(())
    }

    async fn configure(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();
        let csproj = find_csproj(&scratch).ok_or_else(|| {
            BuildError::Configuration("no .csproj found in the scratch copy".to_string())
        })?;
        patch_csproj(&csproj, ctx)?;
        Ok(())
    }

    async fn build(&self, ctx: &mut BuildContext) -> Result<PathBuf, BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();
        let csproj = find_csproj(&scratch).ok_or_else(|| {
            BuildError::stage("build", "no .csproj found in the scratch copy")
        })?;

        let dotnet_root = ctx.env.root(ToolchainRole::DotnetRoot);
        let inherited_path = std::env::var("PATH").unwrap_or_default();
        let configuration = match ctx.options.sign_mode {
            SignMode::Release => "Release",
            SignMode::Debug => "Debug",
        };

        let spec = CommandSpec::new(dotnet_root.join("dotnet"))
            .arg("publish")
            .arg(csproj.display().to_string())
            .args(["-f", ANDROID_FRAMEWORK])
            .args(["-c", configuration])
            .arg(format!(
                "-p:AndroidSdkDirectory={}",
                ctx.env.root(ToolchainRole::AndroidSdk).display()
            ))
            .arg(format!(
                "-p:JavaSdkDirectory={}",
                ctx.env.root(ToolchainRole::JavaHome).display()
            ))
            // The pipeline owns signing; dotnet only produces the package.
            .arg("-p:AndroidKeyStore=false")
            .cwd(&scratch)
            .env("DOTNET_ROOT", dotnet_root.display().to_string())
            .env("DOTNET_CLI_TELEMETRY_OPTOUT", "1")
            .env("PATH", format!("{}:{}", dotnet_root.display(), inherited_path));

        ctx.runner.run_checked(&spec, ctx.line_sink()).await?;

        find_apk(&scratch).ok_or_else(|| BuildError::ArtifactMissing {
            expected: scratch.join("bin").join(configuration),
        })
    }
}

/// First `.csproj` in the scratch copy, shallowest path wins.
fn find_csproj(root: &Path) -> Option<PathBuf> {
    let mut found: Vec<PathBuf> = WalkBuilder::new(root)
        .max_depth(Some(3))
        .build()
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("csproj"))
                    .unwrap_or(false)
        })
        .collect();
    found.sort_by_key(|path| (path.components().count(), path.clone()));
    found.into_iter().next()
}

/// First APK under the publish output, in stable path order.
fn find_apk(root: &Path) -> Option<PathBuf> {
    let mut apks: Vec<PathBuf> = WalkBuilder::new(root)
        .build()
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("apk"))
                    .unwrap_or(false)
        })
        .collect();
    apks.sort();
    apks.into_iter().next()
}

/// Rewrite identity properties in the project file. Properties already
/// present are replaced in place; missing ones are added to the first
/// property group, keeping re-runs byte-identical.
fn patch_csproj(csproj: &Path, ctx: &BuildContext) -> Result<(), BuildError> {
    let content = std::fs::read_to_string(csproj)?;

    let properties = [
        ("ApplicationId", ctx.options.package_name.clone()),
        ("ApplicationTitle", ctx.options.app_name.clone()),
        (
            "ApplicationDisplayVersion",
            ctx.options.version_name.clone(),
        ),
        ("ApplicationVersion", ctx.options.version_code.to_string()),
        (
            "SupportedOSPlatformVersion",
            ctx.options.min_sdk.to_string(),
        ),
    ];

    let mut patched = content;
    let mut to_insert = Vec::new();
    for (name, value) in properties {
        let pattern = Regex::new(&format!(r"<{name}>[^<]*</{name}>")).unwrap();
        let replacement = format!("<{name}>{value}</{name}>", name = name, value = value);
        if pattern.is_match(&patched) {
            patched = pattern.replace(&patched, replacement.as_str()).into_owned();
        } else {
            to_insert.push(replacement);
        }
    }

    if !to_insert.is_empty() {
        let insertion = format!(
            "<PropertyGroup>\n    {}\n",
            to_insert
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n    ")
        );
        if patched.contains("<PropertyGroup>") {
            patched = patched.replacen("<PropertyGroup>", &insertion, 1);
        } else {
            return Err(BuildError::Configuration(format!(
                "{} has no <PropertyGroup> to carry identity properties",
                csproj.display()
            )));
        }
    }

    std::fs::write(csproj, patched)?;
    Ok(())
}
