//! Corten VM launcher library
//!
//! Provides the Launcher and the simulated subsystem host behind the
//! `corten-vm` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod subsystems;

pub use cli::Cli;
pub use error::{CliError, CliResult, EXIT_CONFIG_FAILURE, EXIT_INIT_FAILURE};
pub use launcher::{list_steps, resolve_flags, LaunchReport, Launcher};
pub use logging::init_logging;
pub use subsystems::{InternTable, SimulatedSubsystems};
