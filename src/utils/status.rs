use std::time::Duration;

use log::{error, info};

use crate::config::defs::StepName;

/// Lifecycle event sink for a pipeline run.
///
/// Reporters hold no state across events and may be shared freely.
pub trait StatusReporter: Send + Sync {
    fn step_started(&self, step: StepName, program: &str);
    fn step_completed(&self, step: StepName, elapsed: Duration);
    fn pipeline_failed(&self, step: StepName);
}

/// Swallows every event.
pub struct SilentStatus;

impl StatusReporter for SilentStatus {
    fn step_started(&self, _step: StepName, _program: &str) {}
    fn step_completed(&self, _step: StepName, _elapsed: Duration) {}
    fn pipeline_failed(&self, _step: StepName) {}
}

/// Emits one log line per lifecycle event.
pub struct VerboseStatus;

impl StatusReporter for VerboseStatus {
    fn step_started(&self, step: StepName, program: &str) {
        info!("Starting step {}: {}", step, program);
    }

    fn step_completed(&self, step: StepName, elapsed: Duration) {
        info!("Step {} completed in {} milliseconds.", step, elapsed.as_millis());
    }

    fn pipeline_failed(&self, step: StepName) {
        error!("Pipeline halted at step {}; later steps were not started.", step);
    }
}
