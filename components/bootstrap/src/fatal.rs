//! Process-fatal aborts.
//!
//! Bring-up failures cannot be reported through the normal error path
//! because the facilities it needs (locks, allocators, streams) may be the
//! very things that failed. A fatal abort logs what it can and panics; the
//! release profile turns that panic into an immediate process abort, while
//! test builds can still observe it by unwinding.

use core_types::{Phase, StepId};

/// Message prefix carried by every fatal abort.
pub const FATAL_PREFIX: &str = "fatal error during VM initialization";

/// Aborts the process with a diagnostic.
#[track_caller]
pub fn fatal(message: &str) -> ! {
    tracing::error!("{FATAL_PREFIX}: {message}");
    panic!("{FATAL_PREFIX}: {message}");
}

/// Aborts because an infallible step reported failure.
#[track_caller]
pub(crate) fn infallible_step_failed(step: StepId, phase: Phase) -> ! {
    fatal(&format!(
        "infallible step '{step}' reported failure during {phase}"
    ))
}
