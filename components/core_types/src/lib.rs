//! Core bootstrap types for the Corten VM.
//!
//! This crate provides the vocabulary shared by the bootstrap orchestrator,
//! the subsystem hosts it drives and the launcher that embeds it.
//!
//! # Overview
//!
//! - [`StatusCode`] - Success/failure status reported by an initialization step
//! - [`StepId`] - Closed set of subsystem entry points known to the bootstrap
//! - [`Phase`] - The two bring-up stages a step can belong to
//! - [`Fallibility`] - Whether a step may report a recoverable failure
//! - [`BootError`] - Errors surfaced by plan validation and VM creation
//!
//! # Examples
//!
//! ```
//! use core_types::{Phase, StatusCode, StepId};
//!
//! let step = StepId::Universe;
//! assert_eq!(step.name(), "universe");
//! assert_eq!(step.phase(), Phase::Primary);
//! assert!(StatusCode::Ok.is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod status;
mod step;

pub use error::{BootError, BootResult, SubsystemError};
pub use status::StatusCode;
pub use step::{Fallibility, Phase, StepId, UnknownStep};
