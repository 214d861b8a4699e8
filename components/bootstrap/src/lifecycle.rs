//! Process lifecycle flags.
//!
//! Two pieces of state outlive any object graph: whether the bootstrap
//! completed, and whether shutdown has started. Both live in a
//! [`VmLifecycle`]. The process owns exactly one, reachable through
//! [`VmLifecycle::global`]; tests build their own or call
//! [`VmLifecycle::reset`] between runs.
//!
//! Lifecycle of each flag:
//! - `CompletionFlag`: starts `false`, set once after a successful
//!   bootstrap, read from anywhere.
//! - `ShutdownLatch`: starts `false`, flipped by the first shutdown call;
//!   whoever flips it runs the teardown.

use crate::fatal::fatal;
use crate::subsystems::UniverseStatus;
use core_types::{BootError, BootResult};
use std::sync::atomic::{AtomicBool, Ordering};

/// Records whether the full bootstrap succeeded.
#[derive(Debug, Default)]
pub struct CompletionFlag {
    completed: AtomicBool,
}

impl CompletionFlag {
    /// A flag that has not been set.
    pub const fn new() -> Self {
        Self {
            completed: AtomicBool::new(false),
        }
    }

    /// True once the bootstrap has been marked complete.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Marks the bootstrap complete if the object model is fully initialized.
    ///
    /// # Errors
    ///
    /// Returns [`BootError::ContractViolation`] and leaves the flag
    /// untouched when `universe` is not fully initialized.
    pub fn try_set_completed(&self, universe: &dyn UniverseStatus) -> BootResult<()> {
        if !universe.is_fully_initialized() {
            return Err(BootError::ContractViolation(
                "object model must be fully initialized before init is marked complete"
                    .to_string(),
            ));
        }
        self.completed.store(true, Ordering::Release);
        Ok(())
    }

    /// Marks the bootstrap complete.
    ///
    /// Calling this before the object model is fully initialized is a
    /// programming error: debug builds abort, release builds log it and
    /// leave the flag unset.
    pub fn set_completed(&self, universe: &dyn UniverseStatus) {
        if let Err(err) = self.try_set_completed(universe) {
            if cfg!(debug_assertions) {
                fatal(&err.to_string());
            }
            tracing::error!(error = %err, "refusing to mark initialization complete");
        }
    }

    fn reset(&self) {
        self.completed.store(false, Ordering::Release);
    }
}

/// One-shot guard for the shutdown path.
#[derive(Debug, Default)]
pub struct ShutdownLatch {
    latched: AtomicBool,
}

impl ShutdownLatch {
    /// An unlatched latch.
    pub const fn new() -> Self {
        Self {
            latched: AtomicBool::new(false),
        }
    }

    /// Flips the latch. Returns true only for the caller that flipped it.
    pub fn try_latch(&self) -> bool {
        !self.latched.swap(true, Ordering::AcqRel)
    }

    /// True once shutdown has started.
    pub fn is_latched(&self) -> bool {
        self.latched.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.latched.store(false, Ordering::Release);
    }
}

/// The process-wide lifecycle context.
#[derive(Debug, Default)]
pub struct VmLifecycle {
    completion: CompletionFlag,
    shutdown: ShutdownLatch,
}

static GLOBAL_LIFECYCLE: VmLifecycle = VmLifecycle::new();

impl VmLifecycle {
    /// A fresh context, independent of the global one.
    pub const fn new() -> Self {
        Self {
            completion: CompletionFlag::new(),
            shutdown: ShutdownLatch::new(),
        }
    }

    /// The context shared by the whole process.
    pub fn global() -> &'static VmLifecycle {
        &GLOBAL_LIFECYCLE
    }

    /// The bootstrap completion flag.
    pub fn completion(&self) -> &CompletionFlag {
        &self.completion
    }

    /// The shutdown latch.
    pub fn shutdown(&self) -> &ShutdownLatch {
        &self.shutdown
    }

    /// Clears both flags.
    ///
    /// Only harnesses that bootstrap repeatedly inside one process call
    /// this; a running VM never goes back to uninitialized.
    pub fn reset(&self) {
        self.completion.reset();
        self.shutdown.reset();
    }
}

/// True once the process-wide bootstrap has completed.
pub fn is_init_completed() -> bool {
    VmLifecycle::global().completion().is_completed()
}
