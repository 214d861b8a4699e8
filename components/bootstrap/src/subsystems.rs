//! The interface the bootstrap consumes from the runtime's subsystems.
//!
//! The orchestrator never implements what an entry point does. It only
//! decides when each one runs, what happens when it reports failure, and
//! which teardown routines run at exit. A [`Subsystems`] host maps every
//! [`StepId`] to the real initialization routine.

use crate::flags::RuntimeFlags;
use crate::handles::HandleArea;
use core_types::{Phase, StatusCode, StepId, SubsystemError};
use std::io::Write;

/// Read-only view a step gets of the bootstrap while it runs.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Phase the step is running in
    pub phase: Phase,
    /// Resolved runtime flags
    pub flags: &'a RuntimeFlags,
    /// Handle area for transient references created during initialization
    pub handles: &'a HandleArea,
}

/// Teardown routines run by the shutdown sequencer, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeardownAction {
    /// Release the performance counter memory region
    PerfMemory,
    /// Print collected safepoint statistics
    SafepointStatistics,
    /// Print symbol interning table statistics
    SymbolTableStatistics,
    /// Print string interning table statistics
    StringTableStatistics,
}

impl TeardownAction {
    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TeardownAction::PerfMemory => "perf_memory_exit",
            TeardownAction::SafepointStatistics => "safepoint_statistics",
            TeardownAction::SymbolTableStatistics => "symbol_table_statistics",
            TeardownAction::StringTableStatistics => "string_table_statistics",
        }
    }
}

/// Readiness of the heap/object model.
///
/// This is the precondition checked before the bootstrap is marked
/// complete.
pub trait UniverseStatus {
    /// True once the object model reports itself fully initialized.
    fn is_fully_initialized(&self) -> bool;
}

/// A host providing every subsystem entry point.
pub trait Subsystems: UniverseStatus {
    /// Runs the initialization entry point for `step`.
    ///
    /// Infallible steps must return [`StatusCode::Ok`]; an error from one
    /// of them is treated as an irrecoverable condition.
    fn initialize(&mut self, step: StepId, cx: &StepContext<'_>) -> StatusCode;

    /// Runs a teardown routine, writing any diagnostics to `out`.
    fn teardown(
        &mut self,
        action: TeardownAction,
        out: &mut dyn Write,
    ) -> Result<(), SubsystemError>;
}

impl<S: UniverseStatus + ?Sized> UniverseStatus for &mut S {
    fn is_fully_initialized(&self) -> bool {
        (**self).is_fully_initialized()
    }
}

impl<S: Subsystems + ?Sized> Subsystems for &mut S {
    fn initialize(&mut self, step: StepId, cx: &StepContext<'_>) -> StatusCode {
        (**self).initialize(step, cx)
    }

    fn teardown(
        &mut self,
        action: TeardownAction,
        out: &mut dyn Write,
    ) -> Result<(), SubsystemError> {
        (**self).teardown(action, out)
    }
}
