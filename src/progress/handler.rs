//! Progress handler trait and events.

use std::time::Duration;

/// Events emitted while a build runs.
///
/// `Stage` percent is monotonically non-decreasing within one build.
/// Events are ephemeral; nothing is persisted.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Build started for a source path.
    Started { source_path: String },

    /// Project type resolved.
    Detected {
        project_type: String,
        confidence: u8,
    },

    /// A pipeline stage advanced.
    Stage {
        stage: String,
        percent: u8,
        message: String,
    },

    /// A line of external toolchain output, forwarded as it arrives.
    ToolchainOutput { line: String },

    /// Build finished successfully.
    Completed {
        apk_path: String,
        total_time: Duration,
    },

    /// Build failed.
    Failed { errors: Vec<String> },
}

/// Trait for handling progress events during a build.
///
/// Handlers are passed per `build()` call, never stored on the
/// orchestrator, so overlapping builds cannot cross-talk events.
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}
