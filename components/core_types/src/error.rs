//! Bootstrap error types.
//!
//! Step failures themselves travel as [`crate::StatusCode`]; these errors
//! are what the embedding-facing API reports once a failure has been
//! attributed to a step, a plan or a contract.

use crate::{Phase, StepId};
use thiserror::Error;

/// Errors reported by plan validation and VM creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    /// A fallible phase 2 step reported an error status
    #[error("initialization step '{step}' failed")]
    StepFailed {
        /// The step that reported failure
        step: StepId,
    },

    /// A phase was started out of order or more than once
    #[error("{phase} cannot run: {reason}")]
    PhaseOutOfOrder {
        /// The phase that was refused
        phase: Phase,
        /// Why it was refused
        reason: &'static str,
    },

    /// A documented precondition did not hold
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// A step was registered before one of its prerequisites
    #[error("step '{step}' requires '{requires}' to run first")]
    OrderingViolation {
        /// The dependent step
        step: StepId,
        /// The prerequisite that is missing or later in the plan
        requires: StepId,
    },

    /// A step was registered twice
    #[error("step '{0}' is registered more than once")]
    DuplicateStep(StepId),

    /// A step was registered in a table for the wrong phase
    #[error("step '{step}' belongs to {expected}, not {found}")]
    PhaseMismatch {
        /// The misplaced step
        step: StepId,
        /// The phase the step belongs to
        expected: Phase,
        /// The phase of the table it was registered in
        found: Phase,
    },

    /// A whole table was supplied in the other phase's slot
    #[error("{found} table supplied where the {expected} table belongs")]
    TableMismatch {
        /// The phase the slot requires
        expected: Phase,
        /// The phase the table was built for
        found: Phase,
    },
}

/// Result type for bootstrap operations
pub type BootResult<T> = Result<T, BootError>;

/// Error raised by a subsystem teardown routine.
///
/// Teardown is best-effort, so these are logged by the caller and never
/// propagated out of shutdown.
#[derive(Debug, Error)]
pub enum SubsystemError {
    /// Writing diagnostic output failed
    #[error("diagnostic output failed: {0}")]
    Io(#[from] std::io::Error),

    /// The subsystem was asked to tear down state it never created
    #[error("subsystem '{0}' was never initialized")]
    NotInitialized(&'static str),

    /// Any other subsystem-specific failure
    #[error("{0}")]
    Other(String),
}
