use std::{error::Error, fmt};

use super::BoxError;

/// Error returned when an operation was cancelled by its caller.
///
/// Found anywhere in a chain without an explicit status,
/// it resolves to [`Code::CANCELLED`](crate::Code::CANCELLED).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Canceled;

impl fmt::Display for Canceled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation canceled")
    }
}

impl Error for Canceled {}

/// Error returned when an operation did not complete before its deadline.
///
/// Found anywhere in a chain without an explicit status,
/// it resolves to [`Code::DEADLINE_EXCEEDED`](crate::Code::DEADLINE_EXCEEDED).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutExpired;

impl fmt::Display for TimeoutExpired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("deadline exceeded")
    }
}

impl Error for TimeoutExpired {}

/// Wrapper type to mark an error as temporary,
/// so that [`temporary`](crate::temporary) reports it as retryable.
///
/// The wrapper is transparent: it displays as the inner error,
/// which is exposed as its source.
pub struct Transient(BoxError);

impl Transient {
    /// Mark `error` as temporary.
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(error.into())
    }

    /// Consume the wrapper, returning the inner error.
    #[must_use]
    pub fn into_inner(self) -> BoxError {
        self.0
    }
}

impl fmt::Debug for Transient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transient").field(&self.0).finish()
    }
}

impl fmt::Display for Transient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for Transient {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.0.as_ref())
    }
}
