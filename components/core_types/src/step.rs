//! Identifiers for the subsystem entry points driven by the bootstrap.
//!
//! Every entry point the orchestrator knows about has a [`StepId`]. The id
//! carries a stable snake_case name (used in logs, on the command line and
//! in flags files) and the [`Phase`] it belongs to. Ordering and
//! fallibility are not properties of the id; they are declared by the step
//! tables that register it.

use std::fmt;
use std::str::FromStr;

/// The two sequential bring-up stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Phase 1: primitive facilities, run on the dedicated bring-up thread
    BringUp,
    /// Phase 2: subsystem construction, run on the primary thread
    Primary,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::BringUp => write!(f, "phase 1 (bring-up)"),
            Phase::Primary => write!(f, "phase 2 (primary)"),
        }
    }
}

/// Failure contract of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fallibility {
    /// The step cannot report failure; an error status is a fatal abort
    Infallible,
    /// The step may report [`crate::StatusCode::Error`], which stops startup
    Fallible,
}

impl Fallibility {
    /// Returns true for [`Fallibility::Fallible`].
    pub fn is_fallible(self) -> bool {
        matches!(self, Fallibility::Fallible)
    }
}

macro_rules! step_ids {
    ($($(#[$doc:meta])* $variant:ident => ($name:literal, $phase:ident),)+) => {
        /// A subsystem initialization entry point.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum StepId {
            $($(#[$doc])* $variant,)+
        }

        impl StepId {
            /// Every step id, phase 1 entries first.
            pub const ALL: &'static [StepId] = &[$(StepId::$variant,)+];

            /// Stable snake_case name of the entry point.
            pub fn name(self) -> &'static str {
                match self {
                    $(StepId::$variant => $name,)+
                }
            }

            /// Phase this entry point belongs to.
            pub fn phase(self) -> Phase {
                match self {
                    $(StepId::$variant => Phase::$phase,)+
                }
            }
        }
    };
}

step_ids! {
    /// Thread exception-shadow layout check
    ThreadShadowCheck => ("thread_shadow", BringUp),
    /// Primitive type size and layout check
    BasicTypes => ("basic_types", BringUp),
    /// Event log ring buffers
    EventLog => ("event_log", BringUp),
    /// Global mutex table
    MutexTable => ("mutex_table", BringUp),
    /// Small-object chunk pools
    ChunkPool => ("chunk_pool", BringUp),
    /// Performance counter memory region
    PerfMemory => ("perf_memory", BringUp),

    /// Management and metrics hooks
    Management => ("management", Primary),
    /// Bytecode metadata tables
    Bytecodes => ("bytecodes", Primary),
    /// Boot class loader setup
    ClassLoader => ("class_loader", Primary),
    /// Code cache reservation
    CodeCache => ("code_cache", Primary),
    /// CPU version and feature detection
    VmVersion => ("vm_version", Primary),
    /// Platform extension hooks
    OsGlobals => ("os_globals", Primary),
    /// Low-level call stub generation, first half
    StubRoutinesPhase1 => ("stub_routines_1", Primary),
    /// Heap and object model construction
    Universe => ("universe", Primary),
    /// Interpreter setup
    Interpreter => ("interpreter", Primary),
    /// Invocation counter setup
    InvocationCounter => ("invocation_counter", Primary),
    /// Mark-sweep collector support
    MarkSweep => ("mark_sweep", Primary),
    /// Structural size self-check
    AccessFlagsCheck => ("access_flags", Primary),
    /// Per-opcode execution templates
    TemplateTable => ("template_table", Primary),
    /// Interface support tables
    InterfaceSupport => ("interface_support", Primary),
    /// Runtime-support stubs (error handlers, static resolution)
    SharedRuntimeStubs => ("shared_runtime_stubs", Primary),
    /// Bootstrap class creation, second half of heap construction
    UniversePhase2 => ("universe_2", Primary),
    /// Reference processing setup
    ReferenceProcessor => ("reference_processor", Primary),
    /// Native handle block allocation
    JniHandles => ("jni_handles", Primary),
    /// Internal structure introspection tables
    VmStructs => ("vm_structs", Primary),
    /// Virtual dispatch table sizing and preallocation
    VtableStubs => ("vtable_stubs", Primary),
    /// Inline cache buffer
    InlineCacheBuffer => ("inline_cache_buffer", Primary),
    /// Compiler oracle directives
    CompilerOracle => ("compiler_oracle", Primary),
    /// Compilation policy selection
    CompilationPolicy => ("compilation_policy", Primary),
    /// Compile request broker
    CompileBroker => ("compile_broker", Primary),
    /// Register name table population
    RegisterNames => ("register_names", Primary),
    /// Post-initialization checkpoint
    UniversePostInit => ("universe_post_init", Primary),
    /// Class library bootstrap
    JavaClasses => ("java_classes", Primary),
    /// Stub generation, second half
    StubRoutinesPhase2 => ("stub_routines_2", Primary),
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when parsing a name that matches no [`StepId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bootstrap step '{0}'")]
pub struct UnknownStep(pub String);

impl FromStr for StepId {
    type Err = UnknownStep;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL
            .iter()
            .copied()
            .find(|step| step.name() == s)
            .ok_or_else(|| UnknownStep(s.to_string()))
    }
}
