//! Bring-up timings.

use core_types::{Phase, StepId};
use std::time::Duration;

/// Wall time of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMetrics {
    /// The step that ran
    pub step: StepId,
    /// How long it took
    pub duration: Duration,
}

/// Timings of one completed phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseMetrics {
    /// The phase measured
    pub phase: Phase,
    /// Wall time of the whole phase
    pub total: Duration,
    /// Per-step timings, in run order
    pub steps: Vec<StepMetrics>,
}

impl PhaseMetrics {
    pub(crate) fn new(phase: Phase) -> Self {
        Self {
            phase,
            total: Duration::ZERO,
            steps: Vec::new(),
        }
    }

    /// Duration of `step`, if it ran in this phase.
    pub fn step_duration(&self, step: StepId) -> Option<Duration> {
        self.steps
            .iter()
            .find(|m| m.step == step)
            .map(|m| m.duration)
    }

    /// Steps that ran, in order.
    pub fn executed(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.iter().map(|m| m.step)
    }
}
