//! One-shot teardown.

use crate::flags::RuntimeFlags;
use crate::lifecycle::ShutdownLatch;
use crate::ostream::Tty;
use crate::subsystems::{Subsystems, TeardownAction};
use std::panic::{self, AssertUnwindSafe};

/// Runs the teardown routines exactly once per latch.
pub struct ShutdownSequencer<'a> {
    latch: &'a ShutdownLatch,
}

impl<'a> ShutdownSequencer<'a> {
    /// A sequencer guarded by `latch`.
    pub fn new(latch: &'a ShutdownLatch) -> Self {
        Self { latch }
    }

    /// Tears down diagnostics and released memory.
    ///
    /// The first call releases perf memory, prints the statistics enabled
    /// by `flags`, then flushes and closes `tty`. A routine that fails, or
    /// panics, is logged and the remaining routines still run. Every later
    /// call returns immediately. Returns true if this call did the work.
    pub fn run<S: Subsystems + ?Sized>(&self, host: &mut S, flags: &RuntimeFlags, tty: &Tty) -> bool {
        if !self.latch.try_latch() {
            tracing::debug!("shutdown already performed");
            return false;
        }

        let mut actions = vec![TeardownAction::PerfMemory];
        if flags.print_safepoint_statistics {
            actions.push(TeardownAction::SafepointStatistics);
        }
        if flags.print_string_table_statistics {
            actions.push(TeardownAction::SymbolTableStatistics);
            actions.push(TeardownAction::StringTableStatistics);
        }

        for action in actions {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                tty.with_writer(|out| host.teardown(action, out))
            }));
            match outcome {
                Ok(Ok(())) => tracing::debug!(action = action.name(), "teardown complete"),
                Ok(Err(err)) => {
                    tracing::warn!(action = action.name(), error = %err, "teardown failed")
                }
                Err(_) => tracing::warn!(action = action.name(), "teardown panicked"),
            }
        }

        if let Err(err) = tty.close() {
            tracing::warn!(error = %err, "failed to flush diagnostic output");
        }
        tracing::info!("shutdown complete");
        true
    }
}
