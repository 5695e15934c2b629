//! Logging-based progress handler.

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info};

/// Handler that logs progress events using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started { source_path } => {
                info!(source = %source_path, "Starting build");
            }
            ProgressEvent::Detected {
                project_type,
                confidence,
            } => {
                info!(project_type = %project_type, confidence, "Project type resolved");
            }
            ProgressEvent::Stage {
                stage,
                percent,
                message,
            } => {
                info!(stage = %stage, percent, "{}", message);
            }
            ProgressEvent::ToolchainOutput { line } => {
                debug!(target: "apkforge::toolchain", "{}", line);
            }
            ProgressEvent::Completed {
                apk_path,
                total_time,
            } => {
                info!(
                    apk = %apk_path,
                    total_time_ms = total_time.as_millis(),
                    "Build complete"
                );
            }
            ProgressEvent::Failed { errors } => {
                error!(error_count = errors.len(), "Build failed");
                for err in errors {
                    error!("  {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_handler_accepts_all_events() {
        let handler = LoggingHandler;
        handler.on_progress(&ProgressEvent::Started {
            source_path: "/p".into(),
        });
        handler.on_progress(&ProgressEvent::Detected {
            project_type: "web".into(),
            confidence: 60,
        });
        handler.on_progress(&ProgressEvent::Failed {
            errors: vec!["boom".into()],
        });
    }
}
