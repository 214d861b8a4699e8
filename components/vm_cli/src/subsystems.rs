//! Simulated subsystem host.
//!
//! The launcher drives the real bootstrap over a host whose subsystems are
//! bookkeeping models: a code cache that hands out reservations, a heap
//! with a size check, interning tables, a register name table. Each entry
//! point re-checks the subsystems it relies on, so running the steps out
//! of order fails the same way a real VM would.

use bootstrap::{
    ObjectRef, StatusCode, StepContext, StepId, SubsystemError, Subsystems, TeardownAction,
    UniverseStatus,
};
use std::collections::{BTreeSet, VecDeque};
use std::io::Write;
use std::mem::size_of;

const MIN_HEAP_SIZE: u64 = 2 * 1024 * 1024;
const PERF_MEMORY_SIZE: usize = 32 * 1024;
const EVENT_LOG_CAPACITY: usize = 256;

const STUB_ROUTINES_1_SIZE: u64 = 20 * 1024;
const SHARED_RUNTIME_STUBS_SIZE: u64 = 16 * 1024;
const VTABLE_STUBS_SIZE: u64 = 8 * 1024;
const INLINE_CACHE_BUFFER_SIZE: u64 = 10 * 1024;
const STUB_ROUTINES_2_SIZE: u64 = 20 * 1024;

const GLOBAL_MUTEXES: &[&str] = &[
    "Threads_lock",
    "Heap_lock",
    "CodeCache_lock",
    "Compile_lock",
    "SymbolTable_lock",
    "StringTable_lock",
    "Safepoint_lock",
];

const CHUNK_POOL_SIZES: &[usize] = &[32, 256, 1024, 32 * 1024];

const VM_SYMBOLS: &[&str] = &["<init>", "<clinit>", "main", "([Ljava/lang/String;)V", "()V"];

const BOOTSTRAP_CLASSES: &[&str] = &[
    "java/lang/Object",
    "java/lang/String",
    "java/lang/Class",
    "java/lang/Throwable",
    "java/lang/ref/Reference",
    "java/lang/Thread",
];

const PREALLOCATED_ERRORS: &[&str] = &[
    "java.lang.OutOfMemoryError: Java heap space",
    "java.lang.OutOfMemoryError: Metaspace",
    "java.lang.StackOverflowError",
];

const CLASS_LIBRARY_FIELDS: &[&str] = &["value", "hash", "referent", "queue", "next", "discovered"];

const REGISTER_NAMES: &[&str] = &[
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12",
    "r13", "r14", "r15",
];

/// A string interning table with the statistics the shutdown dump needs.
#[derive(Debug, Default)]
pub struct InternTable {
    entries: BTreeSet<String>,
    lookups: u64,
}

impl InternTable {
    /// Interns `value`, returning true if it was not present.
    pub fn intern(&mut self, value: &str) -> bool {
        self.lookups += 1;
        self.entries.insert(value.to_string())
    }

    /// True if `value` has been interned.
    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains(value)
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn dump(&self, title: &str, out: &mut dyn Write) -> std::io::Result<()> {
        let bytes: usize = self.entries.iter().map(String::len).sum();
        let average = if self.entries.is_empty() {
            0.0
        } else {
            bytes as f64 / self.entries.len() as f64
        };
        writeln!(out, "{title} statistics:")?;
        writeln!(out, "Number of entries   : {:>9}", self.entries.len())?;
        writeln!(out, "Number of lookups   : {:>9}", self.lookups)?;
        writeln!(out, "Total bytes         : {:>9}", bytes)?;
        writeln!(out, "Average entry length: {:>9.3}", average)
    }
}

#[derive(Debug)]
struct CodeHeap {
    capacity: u64,
    used: u64,
}

impl CodeHeap {
    fn reserve(&mut self, what: &str, size: u64) -> StatusCode {
        if self.used + size > self.capacity {
            tracing::error!(what, size, free = self.capacity - self.used, "code cache is full");
            return StatusCode::Error;
        }
        self.used += size;
        tracing::debug!(what, size, used = self.used, "reserved code cache space");
        StatusCode::Ok
    }
}

/// Host whose subsystems are in-memory models.
#[derive(Debug, Default)]
pub struct SimulatedSubsystems {
    initialized: Vec<StepId>,
    fail_at: Option<StepId>,
    event_log: VecDeque<String>,
    mutexes: Vec<&'static str>,
    chunk_pools: Vec<usize>,
    perf_memory: Option<Vec<u8>>,
    code_cache: Option<CodeHeap>,
    heap_capacity: u64,
    symbols: InternTable,
    strings: InternTable,
    register_names: Vec<&'static str>,
    compiler_threads: usize,
    safepoints: u64,
    fully_initialized: bool,
}

impl SimulatedSubsystems {
    /// A host with nothing initialized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `step` report failure when it runs.
    pub fn with_fault(mut self, step: Option<StepId>) -> Self {
        self.fail_at = step;
        self
    }

    /// Steps that completed, in order.
    pub fn initialized(&self) -> &[StepId] {
        &self.initialized
    }

    /// Interned symbols.
    pub fn symbols(&self) -> &InternTable {
        &self.symbols
    }

    /// Interned strings.
    pub fn strings(&self) -> &InternTable {
        &self.strings
    }

    /// Register names, once published.
    pub fn register_names(&self) -> &[&'static str] {
        &self.register_names
    }

    /// Compiler threads started by the compile broker.
    pub fn compiler_threads(&self) -> usize {
        self.compiler_threads
    }

    /// True while the performance memory region is mapped.
    pub fn has_perf_memory(&self) -> bool {
        self.perf_memory.is_some()
    }

    /// Global locks created by the mutex table step.
    pub fn mutexes(&self) -> &[&'static str] {
        &self.mutexes
    }

    /// Chunk sizes served by the chunk pools.
    pub fn chunk_pools(&self) -> &[usize] {
        &self.chunk_pools
    }

    /// Heap reservation, zero until the heap is built.
    pub fn heap_capacity(&self) -> u64 {
        self.heap_capacity
    }

    /// Most recent events, oldest first.
    pub fn event_log(&self) -> &VecDeque<String> {
        &self.event_log
    }

    fn ran(&self, step: StepId) -> bool {
        self.initialized.contains(&step)
    }

    /// Checks that every step in `deps` has completed.
    fn require(&self, step: StepId, deps: &[StepId]) -> StatusCode {
        match deps.iter().find(|dep| !self.ran(**dep)) {
            Some(missing) => {
                tracing::error!(step = step.name(), missing = missing.name(), "subsystem not ready");
                StatusCode::Error
            }
            None => StatusCode::Ok,
        }
    }

    fn log_event(&mut self, message: String) {
        if self.event_log.len() == EVENT_LOG_CAPACITY {
            self.event_log.pop_front();
        }
        self.event_log.push_back(message);
    }

    fn reserve_code(&mut self, what: &str, size: u64) -> StatusCode {
        match self.code_cache.as_mut() {
            Some(cache) => cache.reserve(what, size),
            None => {
                tracing::error!(what, "code cache has not been initialized");
                StatusCode::Error
            }
        }
    }

    fn run(&mut self, step: StepId, cx: &StepContext<'_>) -> StatusCode {
        use StepId::*;

        match step {
            ThreadShadowCheck => StatusCode::Ok,
            BasicTypes => StatusCode::from(
                size_of::<i8>() == 1
                    && size_of::<i16>() == 2
                    && size_of::<i32>() == 4
                    && size_of::<i64>() == 8
                    && size_of::<f32>() == 4
                    && size_of::<f64>() == 8
                    && size_of::<usize>() >= size_of::<u32>(),
            ),
            EventLog => {
                self.event_log = VecDeque::with_capacity(EVENT_LOG_CAPACITY);
                StatusCode::Ok
            }
            MutexTable => {
                self.mutexes = GLOBAL_MUTEXES.to_vec();
                StatusCode::Ok
            }
            ChunkPool => self.require(step, &[MutexTable]).and_then(|| {
                self.chunk_pools = CHUNK_POOL_SIZES.to_vec();
                StatusCode::Ok
            }),
            PerfMemory => {
                self.perf_memory = Some(vec![0; PERF_MEMORY_SIZE]);
                StatusCode::Ok
            }
            Management => self.require(step, &[PerfMemory]),
            Bytecodes => self.require(step, &[Management]),
            ClassLoader => self.require(step, &[Bytecodes]),
            CodeCache => {
                let capacity = cx.flags.reserved_code_cache_size;
                if capacity == 0 {
                    tracing::error!("reserved code cache size must be positive");
                    return StatusCode::Error;
                }
                self.code_cache = Some(CodeHeap { capacity, used: 0 });
                StatusCode::Ok
            }
            VmVersion => self.require(step, &[CodeCache]),
            OsGlobals => self.require(step, &[VmVersion]),
            StubRoutinesPhase1 => self.reserve_code("stub_routines_1", STUB_ROUTINES_1_SIZE),
            Universe => self.init_universe(cx),
            Interpreter | InvocationCounter | MarkSweep => self.require(step, &[Universe]),
            AccessFlagsCheck => StatusCode::from(size_of::<u32>() == size_of::<i32>()),
            TemplateTable => self.require(step, &[Bytecodes, Universe]),
            InterfaceSupport => StatusCode::Ok,
            SharedRuntimeStubs => self
                .require(step, &[TemplateTable])
                .and_then(|| self.reserve_code("shared_runtime_stubs", SHARED_RUNTIME_STUBS_SIZE)),
            UniversePhase2 => self.init_universe_2(step, cx),
            ReferenceProcessor | JniHandles | VmStructs => self.require(step, &[UniversePhase2]),
            VtableStubs => self.reserve_code("vtable_stubs", VTABLE_STUBS_SIZE),
            InlineCacheBuffer => self
                .require(step, &[VtableStubs])
                .and_then(|| self.reserve_code("inline_cache_buffer", INLINE_CACHE_BUFFER_SIZE)),
            CompilerOracle => self.require(step, &[InlineCacheBuffer]),
            CompilationPolicy => self.require(step, &[CompilerOracle]),
            CompileBroker => self.require(step, &[CompilationPolicy]).and_then(|| {
                self.compiler_threads = if cx.flags.use_compiler { 2 } else { 0 };
                StatusCode::Ok
            }),
            RegisterNames => self.require(step, &[CompileBroker]).and_then(|| {
                self.register_names = REGISTER_NAMES.to_vec();
                StatusCode::Ok
            }),
            UniversePostInit => self.universe_post_init(step),
            JavaClasses => self.require(step, &[UniversePostInit, VtableStubs]).and_then(|| {
                for field in CLASS_LIBRARY_FIELDS {
                    self.symbols.intern(field);
                }
                StatusCode::Ok
            }),
            StubRoutinesPhase2 => self
                .require(step, &[JavaClasses])
                .and_then(|| self.reserve_code("stub_routines_2", STUB_ROUTINES_2_SIZE)),
        }
    }

    fn init_universe(&mut self, cx: &StepContext<'_>) -> StatusCode {
        if self
            .require(StepId::Universe, &[StepId::CodeCache, StepId::StubRoutinesPhase1])
            .is_error()
        {
            return StatusCode::Error;
        }
        if cx.flags.max_heap_size < MIN_HEAP_SIZE {
            tracing::error!(
                max_heap_size = cx.flags.max_heap_size,
                minimum = MIN_HEAP_SIZE,
                "too small maximum heap"
            );
            return StatusCode::Error;
        }
        self.heap_capacity = cx.flags.max_heap_size;
        for symbol in VM_SYMBOLS {
            self.symbols.intern(symbol);
        }
        StatusCode::Ok
    }

    fn init_universe_2(&mut self, step: StepId, cx: &StepContext<'_>) -> StatusCode {
        if self
            .require(step, &[StepId::Universe, StepId::SharedRuntimeStubs])
            .is_error()
        {
            return StatusCode::Error;
        }
        for (i, class) in BOOTSTRAP_CLASSES.iter().enumerate() {
            self.symbols.intern(class);
            cx.handles.allocate(ObjectRef(i as u64));
        }
        // class loading stops the world once
        self.safepoints += 1;
        StatusCode::Ok
    }

    fn universe_post_init(&mut self, step: StepId) -> StatusCode {
        if self
            .require(step, &[StepId::UniversePhase2, StepId::CompileBroker, StepId::RegisterNames])
            .is_error()
        {
            return StatusCode::Error;
        }
        if let Some(missing) = BOOTSTRAP_CLASSES.iter().find(|c| !self.symbols.contains(c)) {
            tracing::error!(class = missing, "essential class was not loaded");
            return StatusCode::Error;
        }
        for message in PREALLOCATED_ERRORS {
            self.strings.intern(message);
        }
        self.fully_initialized = true;
        StatusCode::Ok
    }
}

impl UniverseStatus for SimulatedSubsystems {
    fn is_fully_initialized(&self) -> bool {
        self.fully_initialized
    }
}

impl Subsystems for SimulatedSubsystems {
    fn initialize(&mut self, step: StepId, cx: &StepContext<'_>) -> StatusCode {
        if self.fail_at == Some(step) {
            tracing::error!(step = step.name(), "injected failure");
            return StatusCode::Error;
        }

        let status = self.run(step, cx);
        if status.is_ok() {
            self.initialized.push(step);
            self.log_event(format!("initialized {step}"));
        }
        status
    }

    fn teardown(
        &mut self,
        action: TeardownAction,
        out: &mut dyn Write,
    ) -> Result<(), SubsystemError> {
        match action {
            TeardownAction::PerfMemory => {
                self.perf_memory
                    .take()
                    .ok_or(SubsystemError::NotInitialized("perf_memory"))?;
            }
            TeardownAction::SafepointStatistics => {
                writeln!(out, "Safepoint statistics:")?;
                writeln!(out, "Number of safepoints: {:>9}", self.safepoints)?;
            }
            TeardownAction::SymbolTableStatistics => self.symbols.dump("SymbolTable", out)?,
            TeardownAction::StringTableStatistics => self.strings.dump("StringTable", out)?,
        }
        Ok(())
    }
}
