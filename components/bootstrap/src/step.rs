//! Step tables.
//!
//! Each phase is an ordered table of [`SubsystemStep`]s. A step names its
//! entry point, its failure contract and the steps that must already have
//! run. Tables are assembled with [`StepTable::builder`] and a
//! [`BootPlan`] checks the declared prerequisites against the actual
//! order before anything runs.
//!
//! ```text
//! BootPlan
//!   phase 1: thread_shadow → basic_types → ... → perf_memory
//!   phase 2: management → bytecodes → ... → universe_post_init → java_classes → stub_routines_2
//! ```

use crate::subsystems::{StepContext, Subsystems};
use core_types::{BootError, BootResult, Fallibility, Phase, StatusCode, StepId};
use std::collections::HashSet;

/// Steps that must have run before a given step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requires {
    /// The listed steps, from this phase or an earlier one
    Steps(&'static [StepId]),
    /// Every step registered before this one in the same phase
    AllPrevious,
}

/// One named unit of initialization work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsystemStep {
    id: StepId,
    fallibility: Fallibility,
    requires: Requires,
}

impl SubsystemStep {
    /// Entry point this step runs.
    pub fn id(&self) -> StepId {
        self.id
    }

    /// Stable name of the step.
    pub fn name(&self) -> &'static str {
        self.id.name()
    }

    /// Phase the step belongs to.
    pub fn phase(&self) -> Phase {
        self.id.phase()
    }

    /// Failure contract of the step.
    pub fn fallibility(&self) -> Fallibility {
        self.fallibility
    }

    /// Declared prerequisites.
    pub fn requires(&self) -> Requires {
        self.requires
    }

    /// Runs the step against `host`.
    pub fn run<S: Subsystems + ?Sized>(&self, host: &mut S, cx: &StepContext<'_>) -> StatusCode {
        host.initialize(self.id, cx)
    }
}

/// Ordered steps of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTable {
    phase: Phase,
    steps: Vec<SubsystemStep>,
}

impl StepTable {
    /// Starts a table for `phase`.
    pub fn builder(phase: Phase) -> StepTableBuilder {
        StepTableBuilder {
            phase,
            steps: Vec::new(),
        }
    }

    /// Phase of every step in the table.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[SubsystemStep] {
        &self.steps
    }

    /// Step ids in execution order.
    pub fn ids(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.iter().map(|s| s.id)
    }

    /// Position of `id` in the table.
    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// True if `id` is registered.
    pub fn contains(&self, id: StepId) -> bool {
        self.position(id).is_some()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the table has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Builder for [`StepTable`].
#[derive(Debug)]
pub struct StepTableBuilder {
    phase: Phase,
    steps: Vec<SubsystemStep>,
}

impl StepTableBuilder {
    /// Appends an infallible step.
    pub fn infallible(self, id: StepId, requires: &'static [StepId]) -> Self {
        self.push(id, Fallibility::Infallible, Requires::Steps(requires))
    }

    /// Appends a fallible step.
    pub fn fallible(self, id: StepId, requires: &'static [StepId]) -> Self {
        self.push(id, Fallibility::Fallible, Requires::Steps(requires))
    }

    /// Appends an infallible step only when `enabled`.
    pub fn infallible_if(self, enabled: bool, id: StepId, requires: &'static [StepId]) -> Self {
        if enabled {
            self.infallible(id, requires)
        } else {
            self
        }
    }

    /// Appends a fallible step that requires everything registered so far.
    pub fn checkpoint(self, id: StepId) -> Self {
        self.push(id, Fallibility::Fallible, Requires::AllPrevious)
    }

    fn push(mut self, id: StepId, fallibility: Fallibility, requires: Requires) -> Self {
        self.steps.push(SubsystemStep {
            id,
            fallibility,
            requires,
        });
        self
    }

    /// Finishes the table.
    ///
    /// # Errors
    ///
    /// Fails if a step belongs to another phase or is registered twice.
    /// Prerequisites are checked by [`BootPlan::new`], which sees both
    /// phases.
    pub fn build(self) -> BootResult<StepTable> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.phase() != self.phase {
                return Err(BootError::PhaseMismatch {
                    step: step.id,
                    expected: step.phase(),
                    found: self.phase,
                });
            }
            if !seen.insert(step.id) {
                return Err(BootError::DuplicateStep(step.id));
            }
        }
        Ok(StepTable {
            phase: self.phase,
            steps: self.steps,
        })
    }
}

/// Both phase tables, with every declared prerequisite checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootPlan {
    bring_up: StepTable,
    primary: StepTable,
}

impl BootPlan {
    /// Validates and combines the two tables.
    ///
    /// # Errors
    ///
    /// Returns [`BootError::TableMismatch`] if a table was built for the
    /// wrong phase and [`BootError::OrderingViolation`] if a step is
    /// registered before one of its prerequisites.
    pub fn new(bring_up: StepTable, primary: StepTable) -> BootResult<Self> {
        for (table, phase) in [(&bring_up, Phase::BringUp), (&primary, Phase::Primary)] {
            if table.phase != phase {
                return Err(BootError::TableMismatch {
                    expected: phase,
                    found: table.phase,
                });
            }
        }

        let mut done = HashSet::new();
        for table in [&bring_up, &primary] {
            for step in &table.steps {
                if let Requires::Steps(required) = step.requires {
                    if let Some(missing) = required.iter().find(|r| !done.contains(*r)) {
                        return Err(BootError::OrderingViolation {
                            step: step.id,
                            requires: *missing,
                        });
                    }
                }
                done.insert(step.id);
            }
        }

        Ok(Self { bring_up, primary })
    }

    /// The standard plan of the Corten VM.
    pub fn standard() -> Self {
        Self::new(standard_bring_up_table(), standard_primary_table())
            .unwrap_or_else(|err| crate::fatal::fatal(&format!("invalid standard boot plan: {err}")))
    }

    /// Phase 1 table.
    pub fn bring_up(&self) -> &StepTable {
        &self.bring_up
    }

    /// Phase 2 table.
    pub fn primary(&self) -> &StepTable {
        &self.primary
    }

    /// Every step of both phases, in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &SubsystemStep> {
        self.bring_up.steps.iter().chain(self.primary.steps.iter())
    }
}

impl Default for BootPlan {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_bring_up_table() -> StepTable {
    use StepId::*;

    StepTable::builder(Phase::BringUp)
        .infallible(ThreadShadowCheck, &[])
        .infallible(BasicTypes, &[])
        .infallible(EventLog, &[])
        .infallible(MutexTable, &[])
        .infallible(ChunkPool, &[MutexTable])
        .infallible(PerfMemory, &[MutexTable])
        .build()
        .unwrap_or_else(|err| crate::fatal::fatal(&err.to_string()))
}

fn standard_primary_table() -> StepTable {
    use StepId::*;

    StepTable::builder(Phase::Primary)
        .infallible(Management, &[PerfMemory])
        .infallible(Bytecodes, &[Management])
        .infallible(ClassLoader, &[Bytecodes])
        .infallible(CodeCache, &[ClassLoader])
        .infallible(VmVersion, &[CodeCache])
        .infallible(OsGlobals, &[VmVersion])
        .infallible(StubRoutinesPhase1, &[CodeCache])
        .fallible(Universe, &[CodeCache, StubRoutinesPhase1])
        // before any methods are loaded
        .infallible(Interpreter, &[Universe])
        .infallible(InvocationCounter, &[Universe])
        .infallible(MarkSweep, &[Universe])
        .infallible(AccessFlagsCheck, &[BasicTypes])
        .infallible(TemplateTable, &[Bytecodes, Universe])
        .infallible(InterfaceSupport, &[])
        .infallible(SharedRuntimeStubs, &[CodeCache, TemplateTable])
        .infallible(UniversePhase2, &[Universe, StubRoutinesPhase1, SharedRuntimeStubs])
        .infallible(ReferenceProcessor, &[UniversePhase2])
        .infallible(JniHandles, &[UniversePhase2])
        .infallible_if(cfg!(feature = "vm-structs"), VmStructs, &[UniversePhase2])
        .infallible(VtableStubs, &[CodeCache])
        .infallible(InlineCacheBuffer, &[VtableStubs])
        .infallible(CompilerOracle, &[InlineCacheBuffer])
        .infallible(CompilationPolicy, &[CompilerOracle])
        .infallible(CompileBroker, &[CompilationPolicy])
        .infallible(RegisterNames, &[CompileBroker])
        .checkpoint(UniversePostInit)
        .infallible(JavaClasses, &[VtableStubs, UniversePostInit])
        // some stubs depend on library classes existing
        .infallible(StubRoutinesPhase2, &[JavaClasses])
        .build()
        .unwrap_or_else(|err| crate::fatal::fatal(&err.to_string()))
}
