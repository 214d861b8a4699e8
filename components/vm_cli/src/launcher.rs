//! Launcher orchestration
//!
//! The Launcher resolves the runtime flags, builds a bootstrap over the
//! simulated subsystems and drives it through:
//! - phase 1 and phase 2 of initialization
//! - the completion check
//! - teardown, which runs whether or not initialization succeeded

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use crate::subsystems::SimulatedSubsystems;
use bootstrap::{BootPlan, Bootstrap, PhaseMetrics, RuntimeFlags, StepId, Tty, VmLifecycle};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// Outcome of a successful launch.
#[derive(Debug, Clone)]
pub struct LaunchReport {
    /// Steps that ran, in order, across both phases
    pub steps: Vec<StepId>,
    /// Per-phase timings
    pub metrics: Vec<PhaseMetrics>,
    /// Whether the completion flag was set
    pub completed: bool,
}

impl LaunchReport {
    fn from_metrics(metrics: Vec<PhaseMetrics>, completed: bool) -> Self {
        let steps = metrics.iter().flat_map(PhaseMetrics::executed).collect();
        Self {
            steps,
            metrics,
            completed,
        }
    }

    /// Wall time spent across both phases.
    pub fn total(&self) -> Duration {
        self.metrics.iter().map(|m| m.total).sum()
    }
}

/// Drives one VM from flags to teardown.
pub struct Launcher<'l> {
    flags: RuntimeFlags,
    fail_at: Option<StepId>,
    tty: Option<Tty>,
    lifecycle: &'l VmLifecycle,
}

impl Launcher<'static> {
    /// Create a launcher bound to the process-wide lifecycle.
    ///
    /// # Example
    /// ```
    /// use bootstrap::RuntimeFlags;
    /// use vm_cli::Launcher;
    ///
    /// let launcher = Launcher::new(RuntimeFlags::default());
    /// assert!(launcher.flags().use_compiler);
    /// ```
    pub fn new(flags: RuntimeFlags) -> Self {
        Launcher::with_lifecycle(flags, VmLifecycle::global())
    }

    /// Create a launcher from parsed command line arguments.
    ///
    /// # Errors
    /// Returns `CliError` if the flags file cannot be read or parsed
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        Ok(Launcher::new(resolve_flags(cli)?).with_fault(cli.fail_at))
    }
}

impl<'l> Launcher<'l> {
    /// Create a launcher bound to an explicit lifecycle context.
    pub fn with_lifecycle(flags: RuntimeFlags, lifecycle: &'l VmLifecycle) -> Self {
        Self {
            flags,
            fail_at: None,
            tty: None,
            lifecycle,
        }
    }

    /// Make `step` report failure.
    pub fn with_fault(mut self, step: Option<StepId>) -> Self {
        self.fail_at = step;
        self
    }

    /// Send diagnostics to `tty` instead of standard output.
    pub fn with_tty(mut self, tty: Tty) -> Self {
        self.tty = Some(tty);
        self
    }

    /// The resolved flags.
    pub fn flags(&self) -> &RuntimeFlags {
        &self.flags
    }

    /// Bring the VM up, then tear it down.
    ///
    /// # Errors
    /// Returns `CliError::Boot` if initialization failed. Teardown has
    /// already run by the time the error is returned.
    pub fn run(self) -> CliResult<LaunchReport> {
        let host = SimulatedSubsystems::new().with_fault(self.fail_at);
        let mut vm = Bootstrap::with_lifecycle(host, self.flags, self.lifecycle);
        if let Some(tty) = self.tty {
            vm = vm.with_tty(tty);
        }

        let result = vm.create_vm();
        let report = LaunchReport::from_metrics(vm.metrics().to_vec(), vm.is_completed());
        vm.run_shutdown();

        match result {
            Ok(()) => {
                tracing::info!(
                    steps = report.steps.len(),
                    elapsed_us = report.total().as_micros() as u64,
                    "VM lifecycle finished"
                );
                Ok(report)
            }
            Err(err) => Err(CliError::Boot(err)),
        }
    }
}

/// Resolve the final flags: defaults, then the flags file, then the
/// command line.
///
/// # Errors
/// Returns `CliError` if the flags file cannot be read or parsed
pub fn resolve_flags(cli: &Cli) -> CliResult<RuntimeFlags> {
    let mut flags = match &cli.flags_file {
        Some(path) => read_flags_file(path)?,
        None => RuntimeFlags::default(),
    };

    flags.print_flags_final |= cli.print_flags_final;
    flags.print_safepoint_statistics |= cli.print_safepoint_statistics;
    flags.print_string_table_statistics |= cli.print_string_table_statistics;
    if let Some(size) = cli.max_heap_size {
        flags.max_heap_size = size;
    }
    if let Some(size) = cli.reserved_code_cache_size {
        flags.reserved_code_cache_size = size;
    }
    if cli.no_compiler {
        flags.use_compiler = false;
    }
    Ok(flags)
}

fn read_flags_file(path: &Path) -> CliResult<RuntimeFlags> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::FlagsFileIo {
        path: path.to_path_buf(),
        source,
    })?;
    RuntimeFlags::from_json_str(&source).map_err(|source| CliError::FlagsFileParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Print the boot plan, one step per line, grouped by phase.
pub fn list_steps(plan: &BootPlan, out: &mut dyn Write) -> io::Result<()> {
    for table in [plan.bring_up(), plan.primary()] {
        writeln!(out, "{}:", table.phase())?;
        for (i, step) in table.steps().iter().enumerate() {
            let kind = if step.fallibility().is_fallible() {
                "fallible"
            } else {
                "infallible"
            };
            writeln!(out, "  {:>2}. {:<22} {}", i + 1, step.name(), kind)?;
        }
    }
    Ok(())
}
