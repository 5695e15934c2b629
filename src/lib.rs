//! apkforge - offline project type detection and Android package builds
//!
//! This library classifies an arbitrary source project (web, native
//! C/C++, .NET MAUI, React Native/Expo, or a Unity-like engine project)
//! with weighted file-presence heuristics, then drives a type-specific
//! four-stage build pipeline (prepare, configure, build, sign) against a
//! pre-provisioned offline toolchain environment.
//!
//! # Core Concepts
//!
//! - **Detectors**: one pure, read-only heuristic per project type,
//!   accumulating confidence from fixed-weight signals
//! - **Type Resolver**: runs every detector and picks the winner, with
//!   fault isolation and a documented priority tie-break
//! - **Pipelines**: per-type implementations of the shared four-stage
//!   contract, working in isolated scratch copies
//! - **Orchestrator**: verifies the environment, resolves the type and
//!   runs the stages, always terminating in a [`BuildResult`]
//!
//! # Example Usage
//!
//! ```ignore
//! use apkforge::{BuildOptions, BuildOrchestrator, OfflineEnvironment};
//! use std::path::Path;
//!
//! # async fn example() {
//! let env = OfflineEnvironment::resolve("/opt/toolchains");
//! let orchestrator = BuildOrchestrator::new(env);
//!
//! let info = orchestrator.detect_project(Path::new("/work/my-app"));
//! println!("{} ({}%)", info.project_type, info.confidence);
//!
//! let options = BuildOptions::named("My App", "com.example.myapp");
//! let result = orchestrator
//!     .build(Path::new("/work/my-app"), options, None, None)
//!     .await;
//! if result.success {
//!     println!("{}", result.apk_path.unwrap().display());
//! }
//! # }
//! ```

pub mod cli;
pub mod detect;
pub mod env;
pub mod error;
pub mod generators;
pub mod options;
pub mod orchestrator;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod util;

// Re-export key types for convenient access
pub use detect::{DetectorRegistry, ProjectInfo, ProjectType};
pub use env::{OfflineEnvironment, ToolchainRole, VerifyReport};
pub use error::BuildError;
pub use options::{BuildOptions, ReleaseCredentials, SignMode};
pub use orchestrator::BuildOrchestrator;
pub use pipeline::{BuildContext, BuildPipeline, BuildResult, PipelineRegistry};
pub use process::{CancelToken, CommandSpec, ProcessRunner};
pub use progress::{LoggingHandler, NoOpHandler, ProgressEvent, ProgressHandler};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
