//! Command line arguments

use clap::{ArgAction, Parser};
use core_types::StepId;
use std::path::PathBuf;

/// Brings up the Corten VM, reports the outcome and tears it down.
#[derive(Parser, Debug, Clone)]
#[command(name = "corten-vm", version, about)]
pub struct Cli {
    /// JSON file with runtime flags (keys as in `--print-flags-final`)
    #[arg(long, value_name = "FILE")]
    pub flags_file: Option<PathBuf>,

    /// Print every resolved flag after initialization
    #[arg(long)]
    pub print_flags_final: bool,

    /// Print safepoint statistics at exit
    #[arg(long)]
    pub print_safepoint_statistics: bool,

    /// Print symbol and string table statistics at exit
    #[arg(long)]
    pub print_string_table_statistics: bool,

    /// Maximum heap size in bytes
    #[arg(long, value_name = "BYTES")]
    pub max_heap_size: Option<u64>,

    /// Code cache reservation in bytes
    #[arg(long, value_name = "BYTES")]
    pub reserved_code_cache_size: Option<u64>,

    /// Do not start the compiler broker's compiler threads
    #[arg(long)]
    pub no_compiler: bool,

    /// List the boot plan and exit
    #[arg(long)]
    pub list_steps: bool,

    /// Make the named step report failure (diagnostic)
    #[arg(long, value_name = "STEP", hide = true)]
    pub fail_at: Option<StepId>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
