//! The embedding-facing bootstrap context.
//!
//! A [`Bootstrap`] owns the subsystem host and everything the sequencers
//! share (plan, flags, handle area, diagnostic stream) and points at the
//! lifecycle context holding the completion flag and shutdown latch.
//!
//! # Example
//!
//! ```ignore
//! let mut vm = Bootstrap::new(host, RuntimeFlags::default());
//! vm.create_vm()?;
//! assert!(vm.is_completed());
//! vm.run_shutdown();
//! ```

use crate::flags::RuntimeFlags;
use crate::handles::HandleArea;
use crate::lifecycle::VmLifecycle;
use crate::metrics::PhaseMetrics;
use crate::ostream::Tty;
use crate::sequencer::{Phase1Sequencer, Phase2Sequencer};
use crate::shutdown::ShutdownSequencer;
use crate::step::BootPlan;
use crate::subsystems::Subsystems;
use core_types::{BootError, BootResult, Phase, StatusCode};

/// How far the bootstrap has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    /// Nothing has run yet
    Created,
    /// Phase 1 finished
    BroughtUp,
    /// Phase 2 finished successfully
    Initialized,
    /// Phase 2 failed or was refused; the process is expected to exit
    Failed,
}

/// Drives the bring-up and teardown of one VM.
pub struct Bootstrap<'l, S: Subsystems> {
    host: S,
    plan: BootPlan,
    flags: RuntimeFlags,
    handles: HandleArea,
    tty: Tty,
    lifecycle: &'l VmLifecycle,
    state: BootState,
    metrics: Vec<PhaseMetrics>,
}

impl<S: Subsystems> Bootstrap<'static, S> {
    /// A bootstrap using the standard plan, standard output and the
    /// process-wide lifecycle context.
    pub fn new(host: S, flags: RuntimeFlags) -> Self {
        Bootstrap::with_lifecycle(host, flags, VmLifecycle::global())
    }
}

impl<'l, S: Subsystems> Bootstrap<'l, S> {
    /// A bootstrap bound to an explicit lifecycle context.
    pub fn with_lifecycle(host: S, flags: RuntimeFlags, lifecycle: &'l VmLifecycle) -> Self {
        Self {
            host,
            plan: BootPlan::standard(),
            flags,
            handles: HandleArea::new(),
            tty: Tty::stdout(),
            lifecycle,
            state: BootState::Created,
            metrics: Vec::new(),
        }
    }

    /// Replaces the boot plan.
    pub fn with_plan(mut self, plan: BootPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Replaces the diagnostic stream.
    pub fn with_tty(mut self, tty: Tty) -> Self {
        self.tty = tty;
        self
    }

    /// Runs phase 1 on the bring-up thread.
    ///
    /// Has no failure path: an irrecoverable condition aborts. Running it
    /// again after it completed is a fatal ordering error.
    pub fn run_phase1(&mut self)
    where
        S: Send,
    {
        if self.state != BootState::Created {
            crate::fatal::fatal("phase 1 has already run");
        }
        let metrics =
            Phase1Sequencer::new(self.plan.bring_up()).run(&mut self.host, &self.flags, &self.handles);
        self.metrics.push(metrics);
        self.state = BootState::BroughtUp;
    }

    /// Runs phase 2 and reports the overall status.
    pub fn run_phase2(&mut self) -> StatusCode {
        match self.try_run_phase2() {
            Ok(()) => StatusCode::Ok,
            Err(_) => StatusCode::Error,
        }
    }

    /// Runs phase 2, naming the step that failed.
    ///
    /// # Errors
    ///
    /// [`BootError::PhaseOutOfOrder`] if phase 1 has not completed or
    /// phase 2 already ran; [`BootError::StepFailed`] if a fallible step
    /// reported failure.
    pub fn try_run_phase2(&mut self) -> BootResult<()> {
        let reason = match self.state {
            BootState::BroughtUp => None,
            BootState::Created => Some("phase 1 has not completed"),
            BootState::Initialized | BootState::Failed => Some("phase 2 has already run"),
        };
        if let Some(reason) = reason {
            tracing::error!(reason, "refusing to run phase 2");
            // Nothing ran yet, so phase 1 may still follow.
            if self.state != BootState::Created {
                self.state = BootState::Failed;
            }
            return Err(BootError::PhaseOutOfOrder {
                phase: Phase::Primary,
                reason,
            });
        }

        let result = Phase2Sequencer::new(self.plan.primary()).run(
            &mut self.host,
            &self.flags,
            &self.handles,
            &self.tty,
        );
        match result {
            Ok(metrics) => {
                self.metrics.push(metrics);
                self.state = BootState::Initialized;
                Ok(())
            }
            Err(err) => {
                self.state = BootState::Failed;
                Err(err)
            }
        }
    }

    /// Runs both phases and marks the bootstrap complete.
    ///
    /// # Errors
    ///
    /// Any error from [`Bootstrap::try_run_phase2`], or
    /// [`BootError::ContractViolation`] if the object model does not
    /// report itself fully initialized afterwards.
    pub fn create_vm(&mut self) -> BootResult<()>
    where
        S: Send,
    {
        self.run_phase1();
        self.try_run_phase2()?;
        self.lifecycle.completion().try_set_completed(&self.host)?;
        tracing::info!("VM initialization complete");
        Ok(())
    }

    /// True once the bootstrap has been marked complete.
    pub fn is_completed(&self) -> bool {
        self.lifecycle.completion().is_completed()
    }

    /// Marks the bootstrap complete; see [`crate::CompletionFlag::set_completed`].
    pub fn set_completed(&self) {
        self.lifecycle.completion().set_completed(&self.host);
    }

    /// Checked variant of [`Bootstrap::set_completed`].
    pub fn try_set_completed(&self) -> BootResult<()> {
        self.lifecycle.completion().try_set_completed(&self.host)
    }

    /// Runs the teardown once; later calls do nothing.
    pub fn run_shutdown(&mut self) {
        ShutdownSequencer::new(self.lifecycle.shutdown()).run(&mut self.host, &self.flags, &self.tty);
    }

    /// Current progress.
    pub fn state(&self) -> BootState {
        self.state
    }

    /// The boot plan in use.
    pub fn plan(&self) -> &BootPlan {
        &self.plan
    }

    /// The resolved flags.
    pub fn flags(&self) -> &RuntimeFlags {
        &self.flags
    }

    /// The handle area used by phase 2.
    pub fn handles(&self) -> &HandleArea {
        &self.handles
    }

    /// Per-phase timings of the phases that completed.
    pub fn metrics(&self) -> &[PhaseMetrics] {
        &self.metrics
    }

    /// The subsystem host.
    pub fn host(&self) -> &S {
        &self.host
    }

    /// Mutable access to the subsystem host.
    pub fn host_mut(&mut self) -> &mut S {
        &mut self.host
    }

    /// Consumes the bootstrap, returning the host.
    pub fn into_host(self) -> S {
        self.host
    }
}
