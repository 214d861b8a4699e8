//! Staged bring-up and teardown of the Corten VM.
//!
//! The bootstrap brings every runtime subsystem up in a fixed dependency
//! order before any program runs, and tears the diagnostics down exactly
//! once at exit:
//!
//! - Phase 1 ([`Phase1Sequencer`]): infallible primitive facilities, on a
//!   dedicated bring-up thread
//! - Phase 2 ([`Phase2Sequencer`]): ordered subsystem construction on the
//!   primary thread, stopping at the first failure
//! - [`CompletionFlag`]: set once the object model reports itself ready
//! - [`ShutdownSequencer`]: one-shot teardown guarded by a [`ShutdownLatch`]
//!
//! The order is data: [`BootPlan`] holds one [`StepTable`] per phase and
//! rejects any table where a step precedes one of its prerequisites.
//!
//! # Example
//!
//! ```
//! use bootstrap::{BootPlan, Phase};
//! use core_types::StepId;
//!
//! let plan = BootPlan::standard();
//! let primary = plan.primary();
//! assert_eq!(primary.phase(), Phase::Primary);
//! assert!(primary.position(StepId::CodeCache) < primary.position(StepId::Universe));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod fatal;
pub mod flags;
pub mod handles;
pub mod lifecycle;
pub mod metrics;
pub mod ostream;
pub mod sequencer;
pub mod shutdown;
pub mod step;
pub mod subsystems;

pub use context::{BootState, Bootstrap};
pub use core_types::{
    BootError, BootResult, Fallibility, Phase, StatusCode, StepId, SubsystemError,
};
pub use fatal::{fatal, FATAL_PREFIX};
pub use flags::RuntimeFlags;
pub use handles::{Handle, HandleArea, HandleMark, ObjectRef};
pub use lifecycle::{is_init_completed, CompletionFlag, ShutdownLatch, VmLifecycle};
pub use metrics::{PhaseMetrics, StepMetrics};
pub use ostream::{SharedBuffer, Tty};
pub use sequencer::{Phase1Sequencer, Phase2Sequencer, BRING_UP_THREAD_NAME};
pub use shutdown::ShutdownSequencer;
pub use step::{BootPlan, Requires, StepTable, StepTableBuilder, SubsystemStep};
pub use subsystems::{StepContext, Subsystems, TeardownAction, UniverseStatus};
