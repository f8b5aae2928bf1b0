//! Error types for Sluice.

use std::fmt;

use thiserror::Error;

/// Result type alias using Sluice's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type of sinks that accumulate a value while draining.
///
/// On failure the accumulated value is kept in [`Partial::value`].
pub type SinkResult<P> = std::result::Result<P, Partial<P>>;

/// Main error type for Sluice operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The pipeline (or one of its parent contexts) was cancelled.
    #[error("pipeline cancelled")]
    Cancelled,

    /// The deadline of a timeout context expired.
    #[error("pipeline deadline exceeded")]
    DeadlineExceeded,

    /// `first` was called on a stream that closed without elements.
    #[error("stream is empty, no first element found")]
    Empty,

    /// A caller-supplied function panicked inside a stage.
    #[error("stage '{stage}' faulted: {message}")]
    StageFault {
        /// Name of the stage whose callback panicked.
        stage: &'static str,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl Error {
    /// Whether this error reports a cancellation (explicit or by deadline).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }

    /// Build a stage fault from a panic payload.
    pub(crate) fn from_panic(stage: &'static str, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Error::StageFault { stage, message }
    }
}

/// An error returned by a sink together with what it accumulated so far.
///
/// Converts into [`Error`] so it can be propagated with `?` from functions
/// returning [`Result`].
#[derive(Clone, PartialEq, Eq)]
pub struct Partial<P> {
    /// The partial result accumulated before the failure.
    pub value: P,
    /// Why the sink stopped.
    pub error: Error,
}

impl<P> Partial<P> {
    /// Create a new partial result.
    pub fn new(value: P, error: Error) -> Self {
        Self { value, error }
    }

    /// Discard the partial value and keep the error.
    pub fn into_error(self) -> Error {
        self.error
    }

    /// Discard the error and keep the partial value.
    pub fn into_value(self) -> P {
        self.value
    }

    /// Map the partial value, keeping the error.
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Partial<Q> {
        Partial {
            value: f(self.value),
            error: self.error,
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for Partial<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partial")
            .field("value", &self.value)
            .field("error", &self.error)
            .finish()
    }
}

impl<P> fmt::Display for Partial<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (partial result kept)", self.error)
    }
}

impl<P: fmt::Debug> std::error::Error for Partial<P> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<P> From<Partial<P>> for Error {
    fn from(partial: Partial<P>) -> Self {
        partial.error
    }
}
