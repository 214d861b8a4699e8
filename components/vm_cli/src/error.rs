//! Error types for the CLI

use bootstrap::BootError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status when the VM could not be initialized.
pub const EXIT_INIT_FAILURE: i32 = 1;

/// Exit status when the configuration could not be resolved.
pub const EXIT_CONFIG_FAILURE: i32 = 2;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// VM bootstrap error
    #[error("Error occurred during initialization of VM: {0}")]
    Boot(#[from] BootError),

    /// Flags file could not be read
    #[error("Could not read flags file '{path}': {source}")]
    FlagsFileIo {
        /// Path of the flags file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Flags file is not a valid flags document
    #[error("Invalid flags file '{path}': {source}")]
    FlagsFileParse {
        /// Path of the flags file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Boot(_) => EXIT_INIT_FAILURE,
            CliError::FlagsFileIo { .. } | CliError::FlagsFileParse { .. } => EXIT_CONFIG_FAILURE,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
