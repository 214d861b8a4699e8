//! Step status codes.

use std::fmt;

/// Status reported by a single initialization step.
///
/// There is deliberately no classification of failures at this layer:
/// any non-`Ok` status is fatal to startup. The failing subsystem is
/// expected to have emitted its own diagnostics.
///
/// # Examples
///
/// ```
/// use core_types::StatusCode;
///
/// let status = StatusCode::Ok.and_then(|| StatusCode::Error);
/// assert!(status.is_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusCode {
    /// The step completed successfully
    #[default]
    Ok,
    /// The step failed; startup cannot continue
    Error,
}

impl StatusCode {
    /// Returns true for [`StatusCode::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// Returns true for [`StatusCode::Error`].
    pub fn is_error(self) -> bool {
        !self.is_ok()
    }

    /// Runs `next` only if `self` is `Ok`, otherwise keeps the error.
    pub fn and_then(self, next: impl FnOnce() -> StatusCode) -> StatusCode {
        match self {
            StatusCode::Ok => next(),
            StatusCode::Error => StatusCode::Error,
        }
    }
}

impl From<bool> for StatusCode {
    fn from(ok: bool) -> Self {
        if ok {
            StatusCode::Ok
        } else {
            StatusCode::Error
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusCode::Ok => write!(f, "ok"),
            StatusCode::Error => write!(f, "error"),
        }
    }
}
