//! Gradle descriptor set emission.
//!
//! Writes the root/settings/properties files and an `app` module build
//! script derived from [`BuildOptions`]. Variants customize the module
//! through [`ModuleSpec`] (the native pipeline adds its CMake wiring
//! there). Output is deterministic for a given input.

use crate::options::{BuildOptions, SignMode};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;

const AGP_VERSION: &str = "8.2.2";

/// Variant-specific additions to the module build script.
#[derive(Debug, Default, Clone)]
pub struct ModuleSpec {
    /// Extra lines inside the `android { ... }` block.
    pub extra_android_block: String,
    /// Extra lines inside the `dependencies { ... }` block.
    pub extra_dependencies: String,
}

/// Emits the build-tool descriptor files for a scratch project.
#[derive(Debug, Default, Clone, Copy)]
pub struct GradleScaffold;

impl GradleScaffold {
    /// Write settings, root and module build scripts plus properties
    /// files under `root`. `sdk_dir` lands in `local.properties`.
    pub fn write(
        &self,
        options: &BuildOptions,
        root: &Path,
        sdk_dir: &Path,
        module: &ModuleSpec,
    ) -> Result<()> {
        let app_dir = root.join("app");
        std::fs::create_dir_all(&app_dir)
            .with_context(|| format!("failed to create {}", app_dir.display()))?;

        write_file(&root.join("settings.gradle"), &self.settings_script(options))?;
        write_file(&root.join("build.gradle"), &self.root_script())?;
        write_file(&root.join("gradle.properties"), &self.properties())?;
        write_file(
            &root.join("local.properties"),
            &format!("sdk.dir={}\n", sdk_dir.display()),
        )?;
        write_file(&app_dir.join("build.gradle"), &self.module_script(options, module))?;
        Ok(())
    }

    fn settings_script(&self, options: &BuildOptions) -> String {
        format!(
            "rootProject.name = \"{}\"\ninclude ':app'\n",
            options.app_name
        )
    }

    fn root_script(&self) -> String {
        format!(
            r#"buildscript {{
    repositories {{
        google()
        mavenCentral()
    }}
    dependencies {{
        classpath 'com.android.tools.build:gradle:{}'
    }}
}}

allprojects {{
    repositories {{
        google()
        mavenCentral()
    }}
}}
"#,
            AGP_VERSION
        )
    }

    fn properties(&self) -> String {
        concat!(
            "org.gradle.jvmargs=-Xmx2048m\n",
            "android.useAndroidX=true\n",
            "android.nonTransitiveRClass=true\n",
        )
        .to_string()
    }

    fn module_script(&self, options: &BuildOptions, module: &ModuleSpec) -> String {
        let abi_list = options
            .abis
            .iter()
            .map(|abi| format!("'{}'", abi))
            .collect::<Vec<_>>()
            .join(", ");
        let minify = options.shrink && options.sign_mode == SignMode::Release;

        let mut script = String::new();
        writeln!(script, "apply plugin: 'com.android.application'").unwrap();
        writeln!(script).unwrap();
        writeln!(script, "android {{").unwrap();
        writeln!(script, "    namespace '{}'", options.package_name).unwrap();
        writeln!(script, "    compileSdk {}", options.compile_sdk).unwrap();
        writeln!(script).unwrap();
        writeln!(script, "    defaultConfig {{").unwrap();
        writeln!(script, "        applicationId '{}'", options.package_name).unwrap();
        writeln!(script, "        minSdk {}", options.min_sdk).unwrap();
        writeln!(script, "        targetSdk {}", options.target_sdk).unwrap();
        writeln!(script, "        versionCode {}", options.version_code).unwrap();
        writeln!(script, "        versionName '{}'", options.version_name).unwrap();
        writeln!(script, "        ndk {{ abiFilters {} }}", abi_list).unwrap();
        writeln!(script, "    }}").unwrap();
        writeln!(script).unwrap();
        writeln!(script, "    buildTypes {{").unwrap();
        writeln!(script, "        release {{").unwrap();
        writeln!(script, "            minifyEnabled {}", minify).unwrap();
        writeln!(script, "        }}").unwrap();
        writeln!(script, "    }}").unwrap();
        if !module.extra_android_block.is_empty() {
            for line in module.extra_android_block.lines() {
                writeln!(script, "    {}", line).unwrap();
            }
        }
        writeln!(script, "}}").unwrap();
        writeln!(script).unwrap();
        writeln!(script, "dependencies {{").unwrap();
        if !module.extra_dependencies.is_empty() {
            for line in module.extra_dependencies.lines() {
                writeln!(script, "    {}", line).unwrap();
            }
        }
        writeln!(script, "}}").unwrap();
        script
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("failed to write {}", path.display()))
}
