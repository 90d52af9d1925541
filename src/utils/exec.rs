use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::config::defs::{PipelineError, StepName};
use crate::utils::command::{CommandInvocation, PlannedCommand};
use crate::utils::status::StatusReporter;

/// How a planned command list is carried out.
///
/// One implementation is selected at startup and passed by reference into
/// the pipeline run; nothing else dispatches dynamically. Every policy
/// walks the list in order and stops at the first failure, so a failed step
/// is never followed by another invocation.
#[async_trait]
pub trait ExecutionPolicy: Send + Sync {
    async fn execute(
        &self,
        commands: &[PlannedCommand],
        reporter: &dyn StatusReporter,
    ) -> Result<(), PipelineError>;
}

/// Renders each command without running anything. Dry runs always succeed.
pub struct PrintOnly;

#[async_trait]
impl ExecutionPolicy for PrintOnly {
    async fn execute(
        &self,
        commands: &[PlannedCommand],
        _reporter: &dyn StatusReporter,
    ) -> Result<(), PipelineError> {
        for planned in commands {
            println!("{}", planned.invocation.render());
        }
        Ok(())
    }
}

/// Spawns one wrapped tool and waits for it, capturing stderr for the
/// failure report. Stdout is left attached so the tool's own progress
/// output still reaches the terminal.
async fn run_tool(invocation: &CommandInvocation) -> Result<(), String> {
    debug!("Invoking: {}", invocation.render());

    let child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            format!(
                "failed to spawn {}: {}. Is it installed?",
                invocation.program, e
            )
        })?;

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| format!("failed to wait on {}: {}", invocation.program, e))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        match output.status.code() {
            Some(code) => Err(format!("exit status {}: {}", code, stderr.trim())),
            None => Err(format!("terminated by signal: {}", stderr.trim())),
        }
    }
}

async fn run_step(
    invocation: &CommandInvocation,
    reporter: &dyn StatusReporter,
) -> Result<(), String> {
    reporter.step_started(invocation.step, &invocation.program);
    let start = Instant::now();
    match run_tool(invocation).await {
        Ok(()) => {
            reporter.step_completed(invocation.step, start.elapsed());
            Ok(())
        }
        Err(detail) => {
            reporter.pipeline_failed(invocation.step);
            Err(detail)
        }
    }
}

fn step_failed(step: StepName, program: &str, detail: String) -> PipelineError {
    PipelineError::StepFailed {
        step,
        program: program.to_string(),
        detail,
    }
}

/// Runs each command to completion, in list order. The prior step's result
/// is checked before the next invocation is issued; the only cancellation
/// point is between steps.
pub struct Serial;

#[async_trait]
impl ExecutionPolicy for Serial {
    async fn execute(
        &self,
        commands: &[PlannedCommand],
        reporter: &dyn StatusReporter,
    ) -> Result<(), PipelineError> {
        for planned in commands {
            let invocation = &planned.invocation;
            run_step(invocation, reporter)
                .await
                .map_err(|detail| step_failed(invocation.step, &invocation.program, detail))?;
        }
        Ok(())
    }
}

/// Hands parallel-capable steps to the external backend and runs the rest
/// like [`Serial`]. Dispatch blocks until the backend reports completion, so
/// the chain ordering is unchanged; a backend failure halts the pipeline
/// exactly like a step failure.
pub struct Parallel;

#[async_trait]
impl ExecutionPolicy for Parallel {
    async fn execute(
        &self,
        commands: &[PlannedCommand],
        reporter: &dyn StatusReporter,
    ) -> Result<(), PipelineError> {
        for planned in commands {
            match &planned.parallel {
                Some(invocation) => {
                    run_step(invocation, reporter).await.map_err(|detail| {
                        PipelineError::ParallelBackend {
                            step: invocation.step,
                            program: invocation.program.clone(),
                            detail,
                        }
                    })?;
                }
                None => {
                    let invocation = &planned.invocation;
                    run_step(invocation, reporter)
                        .await
                        .map_err(|detail| step_failed(invocation.step, &invocation.program, detail))?;
                }
            }
        }
        Ok(())
    }
}
