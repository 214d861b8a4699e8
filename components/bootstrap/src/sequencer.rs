//! Phase sequencers.
//!
//! [`Phase1Sequencer`] prepares the primitive facilities on a dedicated
//! bring-up thread and has no failure path: a step that cannot complete
//! aborts the process. [`Phase2Sequencer`] builds the subsystems on the
//! caller's thread, stops at the first failing fallible step and reports
//! it, and finally dumps the resolved flags if asked to.

use crate::fatal::{fatal, infallible_step_failed};
use crate::flags::RuntimeFlags;
use crate::handles::HandleArea;
use crate::metrics::{PhaseMetrics, StepMetrics};
use crate::ostream::Tty;
use crate::step::{StepTable, SubsystemStep};
use crate::subsystems::{StepContext, Subsystems};
use core_types::{BootError, BootResult, Phase, StatusCode};
use std::thread;
use std::time::Instant;

/// Name of the bring-up thread.
pub const BRING_UP_THREAD_NAME: &str = "vm-bringup";

fn run_step<S: Subsystems + ?Sized>(
    step: &SubsystemStep,
    host: &mut S,
    cx: &StepContext<'_>,
    metrics: &mut PhaseMetrics,
) -> StatusCode {
    let span = tracing::debug_span!("init_step", step = step.name());
    let _entered = span.enter();

    let started = Instant::now();
    let status = step.run(host, cx);
    let duration = started.elapsed();

    tracing::debug!(status = %status, elapsed_us = duration.as_micros() as u64, "step finished");
    metrics.steps.push(StepMetrics {
        step: step.id(),
        duration,
    });
    status
}

/// Runs the phase 1 table.
pub struct Phase1Sequencer<'a> {
    table: &'a StepTable,
}

impl<'a> Phase1Sequencer<'a> {
    /// A sequencer over `table`.
    pub fn new(table: &'a StepTable) -> Self {
        Self { table }
    }

    /// Runs every step in order on the bring-up thread and waits for it.
    ///
    /// Any step reporting an error is fatal, whatever fallibility it was
    /// registered with. A panic on the bring-up thread is re-raised here.
    pub fn run<S: Subsystems + Send>(
        &self,
        host: &mut S,
        flags: &RuntimeFlags,
        handles: &HandleArea,
    ) -> PhaseMetrics {
        let table = self.table;
        let outcome = thread::scope(|scope| {
            let worker = thread::Builder::new()
                .name(BRING_UP_THREAD_NAME.to_string())
                .spawn_scoped(scope, move || {
                    let cx = StepContext {
                        phase: Phase::BringUp,
                        flags,
                        handles,
                    };
                    let mut metrics = PhaseMetrics::new(Phase::BringUp);
                    let started = Instant::now();
                    for step in table.steps() {
                        if run_step(step, host, &cx, &mut metrics).is_error() {
                            infallible_step_failed(step.id(), Phase::BringUp);
                        }
                    }
                    metrics.total = started.elapsed();
                    metrics
                })
                .unwrap_or_else(|err| fatal(&format!("cannot start bring-up thread: {err}")));
            worker.join()
        });

        match outcome {
            Ok(metrics) => {
                tracing::info!(steps = metrics.steps.len(), "phase 1 complete");
                metrics
            }
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

/// Runs the phase 2 table.
pub struct Phase2Sequencer<'a> {
    table: &'a StepTable,
}

impl<'a> Phase2Sequencer<'a> {
    /// A sequencer over `table`.
    pub fn new(table: &'a StepTable) -> Self {
        Self { table }
    }

    /// Runs every step in order inside a handle scope.
    ///
    /// Stops at the first fallible step that reports an error and returns
    /// [`BootError::StepFailed`] naming it; nothing after it runs and
    /// nothing before it is undone. The handle scope is released on every
    /// exit path. On success the resolved flags are printed to `tty` when
    /// `PrintFlagsFinal` is set.
    pub fn run<S: Subsystems + ?Sized>(
        &self,
        host: &mut S,
        flags: &RuntimeFlags,
        handles: &HandleArea,
        tty: &Tty,
    ) -> BootResult<PhaseMetrics> {
        let _mark = handles.mark();
        let cx = StepContext {
            phase: Phase::Primary,
            flags,
            handles,
        };

        let mut metrics = PhaseMetrics::new(Phase::Primary);
        let started = Instant::now();
        for step in self.table.steps() {
            if run_step(step, host, &cx, &mut metrics).is_ok() {
                continue;
            }
            if !step.fallibility().is_fallible() {
                infallible_step_failed(step.id(), Phase::Primary);
            }
            tracing::error!(step = step.name(), "initialization step failed, aborting startup");
            return Err(BootError::StepFailed { step: step.id() });
        }
        metrics.total = started.elapsed();

        if flags.print_flags_final {
            if let Err(err) = tty.with_writer(|out| flags.print_flags(out)) {
                tracing::warn!(error = %err, "failed to print flags");
            }
        }

        tracing::info!(
            steps = metrics.steps.len(),
            elapsed_ms = metrics.total.as_millis() as u64,
            "phase 2 complete"
        );
        Ok(metrics)
    }
}
