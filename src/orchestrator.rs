//! Build orchestration.
//!
//! Sequences one build: environment verification, detection, pipeline
//! selection, the four pipeline stages, then output placement. Every
//! failure path ends in a terminal [`BuildResult`] — the orchestrator
//! never lets a stage error escape as a panic or a bare `Err`.

use crate::detect::{DetectorRegistry, ProjectInfo, ProjectType};
use crate::env::OfflineEnvironment;
use crate::error::BuildError;
use crate::options::BuildOptions;
use crate::pipeline::{BuildContext, BuildResult, PipelineRegistry};
use crate::process::{CancelToken, ProcessRunner};
use crate::progress::{ProgressEvent, ProgressHandler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Long-lived build coordinator. Safe to keep around and issue builds
/// one at a time; each call gets its own progress scope and scratch
/// space.
pub struct BuildOrchestrator {
    env: OfflineEnvironment,
    detectors: DetectorRegistry,
    pipelines: PipelineRegistry,
}

impl BuildOrchestrator {
    pub fn new(env: OfflineEnvironment) -> Self {
        Self {
            env,
            detectors: DetectorRegistry::with_defaults(),
            pipelines: PipelineRegistry::with_defaults(),
        }
    }

    /// Constructor for callers that need to swap registries (tests,
    /// embedders with extra project types).
    pub fn with_registries(
        env: OfflineEnvironment,
        detectors: DetectorRegistry,
        pipelines: PipelineRegistry,
    ) -> Self {
        Self {
            env,
            detectors,
            pipelines,
        }
    }

    pub fn environment(&self) -> &OfflineEnvironment {
        &self.env
    }

    /// Classify a project directory. Never fails; an unrecognized tree
    /// comes back as [`ProjectType::Unknown`] with confidence 0.
    pub fn detect_project(&self, path: &Path) -> ProjectInfo {
        self.detectors.resolve(path)
    }

    /// Run a full build. The progress handler and cancellation token are
    /// scoped to this call only.
    pub async fn build(
        &self,
        path: &Path,
        options: BuildOptions,
        progress: Option<Arc<dyn ProgressHandler>>,
        cancel: Option<CancelToken>,
    ) -> BuildResult {
        let start = Instant::now();
        let emit = |event: ProgressEvent| {
            if let Some(handler) = &progress {
                handler.on_progress(&event);
            }
        };
        emit(ProgressEvent::Started {
            source_path: path.display().to_string(),
        });

        let runner = match cancel {
            Some(token) => ProcessRunner::with_cancel_token(token),
            None => ProcessRunner::new(),
        };
        let mut ctx = BuildContext::new(path, options, self.env.clone()).with_runner(runner);
        if let Some(handler) = &progress {
            ctx = ctx.with_progress(handler.clone());
        }

        let outcome = self.run_stages(path, &mut ctx, &emit).await;
        let warnings = ctx.warnings().to_vec();
        let elapsed = start.elapsed();

        match outcome {
            Ok((apk_path, mapping_path)) => {
                emit(ProgressEvent::Completed {
                    apk_path: apk_path.display().to_string(),
                    total_time: elapsed,
                });
                BuildResult {
                    success: true,
                    apk_path: Some(apk_path),
                    mapping_path,
                    errors: Vec::new(),
                    warnings,
                    elapsed,
                }
            }
            Err(err) => {
                let errors = vec![err.to_string()];
                emit(ProgressEvent::Failed {
                    errors: errors.clone(),
                });
                BuildResult::failed(errors, warnings, elapsed)
            }
        }
    }

    async fn run_stages(
        &self,
        path: &Path,
        ctx: &mut BuildContext,
        emit: &dyn Fn(ProgressEvent),
    ) -> Result<(PathBuf, Option<PathBuf>), BuildError> {
        ctx.options
            .validate()
            .map_err(BuildError::Configuration)?;

        // Environment first: a missing toolchain should fail fast and
        // clearly, not twenty minutes into an external invocation.
        let report = self.env.verify();
        if !report.valid {
            return Err(BuildError::EnvironmentMissing {
                roles: report.missing,
            });
        }

        let info = self.detect_project(path);
        emit(ProgressEvent::Detected {
            project_type: info.project_type.to_string(),
            confidence: info.confidence,
        });
        if info.project_type == ProjectType::Unknown {
            return Err(BuildError::UnknownProjectType {
                path: path.to_path_buf(),
            });
        }

        let pipeline = self.pipelines.get(info.project_type).ok_or_else(|| {
            BuildError::stage("select", format!("no pipeline for type {}", info.project_type))
        })?;

        // Re-validate the variant's own roles; the global check above
        // is advisory for the whole toolchain set.
        let report = self.env.verify_roles(pipeline.required_roles());
        if !report.valid {
            return Err(BuildError::EnvironmentMissing {
                roles: report.missing,
            });
        }

        let stage = |name: &str, percent: u8, message: &str| {
            emit(ProgressEvent::Stage {
                stage: name.to_string(),
                percent,
                message: message.to_string(),
            });
        };

        stage("prepare", 10, "staging isolated working copy");
        pipeline.prepare(ctx).await?;

        stage("configure", 30, "applying build options");
        pipeline.configure(ctx).await?;

        stage("build", 50, "invoking toolchain");
        let artifact = pipeline.build(ctx).await?;
        debug!(artifact = %artifact.display(), "unsigned artifact produced");

        stage("sign", 85, "signing artifact");
        let signed = pipeline.sign(ctx, &artifact).await?;

        stage("finalize", 95, "placing output");
        let (apk_path, mapping_path) = self.place_output(ctx, &signed)?;

        info!(apk = %apk_path.display(), "build succeeded");
        Ok((apk_path, mapping_path))
    }

    /// Copy the signed artifact (and shrinker mapping when one exists)
    /// into the requested output directory.
    fn place_output(
        &self,
        ctx: &mut BuildContext,
        signed: &Path,
    ) -> Result<(PathBuf, Option<PathBuf>), BuildError> {
        let output_dir = ctx
            .options
            .output_dir
            .clone()
            .unwrap_or_else(|| ctx.source_path.join("dist"));
        std::fs::create_dir_all(&output_dir)?;

        let file_name = signed
            .file_name()
            .ok_or_else(|| BuildError::stage("finalize", "signed artifact has no file name"))?;
        let destination = output_dir.join(file_name);
        std::fs::copy(signed, &destination)?;

        let mapping_path = self.place_mapping(ctx, &output_dir);
        Ok((destination, mapping_path))
    }

    fn place_mapping(&self, ctx: &mut BuildContext, output_dir: &Path) -> Option<PathBuf> {
        if !ctx.options.shrink {
            return None;
        }
        let scratch = ctx.scratch_dir().ok()?;
        let mapping = scratch.join("app/build/outputs/mapping/release/mapping.txt");
        if !mapping.is_file() {
            ctx.warn("shrinking was enabled but no mapping file was produced");
            return None;
        }
        let destination = output_dir.join("mapping.txt");
        match std::fs::copy(&mapping, &destination) {
            Ok(_) => Some(destination),
            Err(err) => {
                ctx.warn(format!("failed to copy mapping file: {}", err));
                None
            }
        }
    }
}
