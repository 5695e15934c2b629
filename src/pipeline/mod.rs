//! Type-specific build pipelines.
//!
//! Every variant implements the same four-stage contract — prepare,
//! configure, build, sign — over a per-build [`BuildContext`], so the
//! orchestrator stays type-agnostic. Variants are looked up through the
//! [`PipelineRegistry`].

mod cross_js;
mod engine;
pub mod gradle;
mod managed;
mod native;
pub mod signing;
mod web;

pub use cross_js::CrossJsPipeline;
pub use engine::EnginePipeline;
pub use managed::ManagedPipeline;
pub use native::NativePipeline;
pub use web::WebPipeline;

use crate::detect::ProjectType;
use crate::env::{OfflineEnvironment, ToolchainRole};
use crate::error::BuildError;
use crate::options::BuildOptions;
use crate::process::{LineSink, ProcessRunner};
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::util::fs as futil;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Terminal outcome of one build attempt.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub success: bool,
    /// Signed artifact, present only on success.
    pub apk_path: Option<PathBuf>,
    /// Secondary artifact (shrinker mapping file) when produced.
    pub mapping_path: Option<PathBuf>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

impl BuildResult {
    pub fn failed(errors: Vec<String>, warnings: Vec<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            apk_path: None,
            mapping_path: None,
            errors,
            warnings,
            elapsed,
        }
    }
}

/// Mutable state threaded through the four stages of one build.
pub struct BuildContext {
    pub source_path: PathBuf,
    pub options: BuildOptions,
    pub env: OfflineEnvironment,
    pub runner: ProcessRunner,
    scratch_dir: Option<PathBuf>,
    progress: Option<Arc<dyn ProgressHandler>>,
    warnings: Vec<String>,
}

impl BuildContext {
    pub fn new(
        source_path: impl Into<PathBuf>,
        options: BuildOptions,
        env: OfflineEnvironment,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            options,
            env,
            runner: ProcessRunner::new(),
            scratch_dir: None,
            progress: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress = Some(handler);
        self
    }

    /// Scratch directory, available after `prepare` has run.
    pub fn scratch_dir(&self) -> Result<&Path, BuildError> {
        self.scratch_dir
            .as_deref()
            .ok_or_else(|| BuildError::stage("configure", "prepare has not run"))
    }

    /// Create (or recreate) the isolated scratch copy root for this
    /// build and remember it.
    pub fn init_scratch_dir(&mut self) -> Result<PathBuf, BuildError> {
        let path = futil::scratch_dir_path(&self.options.app_name);
        futil::create_scratch_dir(&path)
            .map_err(|e| BuildError::stage("prepare", e.to_string()))?;
        info!(scratch = %path.display(), "created scratch directory");
        self.scratch_dir = Some(path.clone());
        Ok(path)
    }

    /// Record a non-fatal problem; surfaced on the final result.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress {
            handler.on_progress(&event);
        }
    }

    /// Sink forwarding toolchain output lines to the progress handler.
    pub fn line_sink(&self) -> Option<LineSink> {
        self.progress.as_ref().map(|handler| {
            let handler = handler.clone();
            let sink: LineSink = Arc::new(move |line: &str| {
                handler.on_progress(&ProgressEvent::ToolchainOutput {
                    line: line.to_string(),
                });
            });
            sink
        })
    }
}

/// The four-stage build contract every variant implements.
#[async_trait]
pub trait BuildPipeline: Send + Sync {
    fn project_type(&self) -> ProjectType;

    /// Toolchain roles this variant needs present before starting.
    fn required_roles(&self) -> &'static [ToolchainRole];

    /// Materialize an isolated working copy of the project. Never
    /// mutates the original source tree.
    async fn prepare(&self, ctx: &mut BuildContext) -> Result<(), BuildError>;

    /// Apply [`BuildOptions`] into the scratch copy. Called exactly once
    /// after `prepare`; emission is deterministic.
    async fn configure(&self, ctx: &mut BuildContext) -> Result<(), BuildError>;

    /// Invoke the external toolchain and return the unsigned artifact.
    async fn build(&self, ctx: &mut BuildContext) -> Result<PathBuf, BuildError>;

    /// Sign the artifact and return the new path. The default covers
    /// every APK-producing variant.
    async fn sign(&self, ctx: &mut BuildContext, artifact: &Path) -> Result<PathBuf, BuildError> {
        signing::sign_apk(ctx, artifact).await
    }
}

/// Maps resolved project types to their pipeline.
#[derive(Clone)]
pub struct PipelineRegistry {
    pipelines: Vec<Arc<dyn BuildPipeline>>,
}

impl Default for PipelineRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self {
            pipelines: Vec::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WebPipeline));
        registry.register(Arc::new(NativePipeline));
        registry.register(Arc::new(ManagedPipeline));
        registry.register(Arc::new(CrossJsPipeline));
        registry.register(Arc::new(EnginePipeline));
        registry
    }

    pub fn register(&mut self, pipeline: Arc<dyn BuildPipeline>) {
        self.pipelines.push(pipeline);
    }

    pub fn get(&self, project_type: ProjectType) -> Option<Arc<dyn BuildPipeline>> {
        self.pipelines
            .iter()
            .find(|p| p.project_type() == project_type)
            .cloned()
    }
}

/// Expected unsigned-APK location for gradle-based variants.
pub(crate) fn gradle_apk_path(project_dir: &Path, release: bool) -> PathBuf {
    let (variant, file) = if release {
        ("release", "app-release-unsigned.apk")
    } else {
        ("debug", "app-debug.apk")
    };
    project_dir
        .join("app/build/outputs/apk")
        .join(variant)
        .join(file)
}

/// Gradle assemble task for the requested sign mode.
pub(crate) fn gradle_task(release: bool) -> &'static str {
    if release {
        "assembleRelease"
    } else {
        "assembleDebug"
    }
}
