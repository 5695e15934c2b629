//! Native pipeline: C/C++ sources built through CMake and the NDK.

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

pub struct NativePipeline;

const REQUIRED_ROLES: [ToolchainRole; 5] = [
    ToolchainRole::JavaHome,
    ToolchainRole::AndroidSdk,
    ToolchainRole::AndroidNdk,
    ToolchainRole::GradleHome,
    ToolchainRole::GradleCache,
];

const NATIVE_LIB_NAME: &str = "main";

#[async_trait]
impl BuildPipeline for NativePipeline {
    fn project_type(&self) -> ProjectType {
        ProjectType::Native
    }

    fn required_roles(&self) -> &'static [ToolchainRole] {
        &REQUIRED_ROLES
    }

    async fn prepare(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.init_scratch_dir()?;
        let cpp_dir = scratch.join("app/src/main/cpp");
        std::fs::create_dir_all(&cpp_dir)?;

        let source = ctx.source_path.clone();
        let copied = futil::copy_project(&source, &cpp_dir)
            .map_err(|e| BuildError::stage("prepare", e.to_string()))?;
        info!(files = copied, "native sources staged");

        // Projects without a CMake descriptor get a synthesized one over
        // whatever sources were found.
        let cmake = cpp_dir.join("CMakeLists.txt");
        if !cmake.is_file() {
            write_synthesized_cmake(&cpp_dir)?;
            ctx.warn("project had no CMakeLists.txt, synthesized a minimal one");
        }
        Ok(())
    }

    async fn configure(&self, ctx: &mut BuildContext) -> Result<(), BuildError> {
        let scratch = ctx.scratch_dir()?.to_path_buf();
        let main = scratch.join("app/src/main");

        DefaultManifestGenerator
            .generate(&ctx.options, &main.join("AndroidManifest.xml"))
            .map_err(|e| BuildError::Configuration(e.to_string()))?;

        let module = ModuleSpec {
            extra_android_block: concat!(
                "externalNativeBuild {\n",
                "    cmake {\n",
                "        path 'src/main/cpp/CMakeLists.txt'\n",
                "    }\n",
                "}"
            )
            .to_string(),
            extra_dependencies: String::new(),
        };
        GradleScaffold
            .write(
                &ctx.options,
                &scratch,
                ctx.env.root(ToolchainRole::AndroidSdk),
                &module,
            )
            .map_err(|e| BuildError::Configuration(e.to_string()))?;

        DefaultIconGenerator
            .generate(ctx.options.icon_source.as_deref(), &main.join("res"))
            .map_err(|e| BuildError::Configuration(e.to_string()))?;

        write_loader_activity(&main, &ctx.options.package_name)?;
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

fn write_synthesized_cmake(cpp_dir: &Path) -> Result<(), BuildError> {
    let content = format!(
        r#"cmake_minimum_required(VERSION 3.22.1)
project({lib})

file(GLOB_RECURSE SOURCES "*.c" "*.cc" "*.cpp" "*.cxx")
add_library({lib} SHARED ${{SOURCES}})
target_link_libraries({lib} android log)
"#,
        lib = NATIVE_LIB_NAME
    );
    std::fs::write(cpp_dir.join("CMakeLists.txt"), content)?;
    Ok(())
}

/// Entry activity loading the native library, placed under the
/// reverse-domain package path.
fn write_loader_activity(main_dir: &Path, package_name: &str) -> Result<(), BuildError> {
    let java_dir = main_dir
        .join("java")
        .join(futil::package_to_path(package_name));
    std::fs::create_dir_all(&java_dir)?;

    let source = format!(
        r#"package {package_name};

import android.app.Activity;
import android.os.Bundle;

public class MainActivity extends Activity {{
    static {{
        System.loadLibrary("{NATIVE_LIB_NAME}");
    }}

    @Override
    protected void onCreate(Bundle savedInstanceState) {{
        super.onCreate(savedInstanceState);
    }}
}}
"#
    );

    std::fs::write(java_dir.join("MainActivity.java"), source)?;
    Ok(())
}
