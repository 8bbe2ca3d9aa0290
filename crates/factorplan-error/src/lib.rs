//! Error taxonomy shared across the factorplan workspace (§7).
//!
//! Every solver, learning update, and backup returns `FactorplanResult<T>`.
//! Construction-time validation errors are meant to be fatal and immediate;
//! errors raised mid-solve leave the caller's model untouched (see the
//! per-module docs for exactly what state survives a failed call).

use std::fmt::{self, Display, Formatter};

pub type FactorplanResult<T> = Result<T, FactorplanError>;

/// Error kinds named by §7 of the specification — a taxonomy of kinds, not
/// of concrete types. `Context` is not one of the six named kinds; it is
/// the chaining mechanism [`ResultExt::context`] wraps the other five in.
#[derive(Debug)]
pub enum FactorplanError {
    /// A transition row does not sum to 1, an observation row contains a
    /// negative value, or a belief is not a probability vector.
    InvalidProbability { message: String },
    /// A belief update encountered an (a, o) pair with zero predicted
    /// probability.
    InvalidObservation { message: String },
    /// A parameter is out of its declared range (temperature < 0, discount
    /// not in (0, 1], lambda not in [0, 1], learning rate not in (0, 1]).
    InvalidArgument { message: String },
    /// A stream parse failed; no state was mutated.
    MalformedInput { message: String },
    /// The LP solver returned infeasible/unbounded when a feasible bounded
    /// result was expected. Not raised by the witness LP itself — there,
    /// "no witness found" is a valid result, not a failure.
    LpFailure { message: String },
    /// A fixed-point iteration (a blind-strategy bound, policy iteration)
    /// exhausted its budget without reaching the requested tolerance;
    /// never raised by an anytime algorithm.
    Unconverged { message: String },
    /// One of the above, annotated with the operation that was in
    /// progress when it propagated through a layer that could say more
    /// about it than the original message did.
    Context { note: String, source: Box<FactorplanError> },
}

impl FactorplanError {
    pub fn with_context(self, note: impl Into<String>) -> Self {
        FactorplanError::Context { note: note.into(), source: Box::new(self) }
    }
}

impl Display for FactorplanError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProbability { message } => write!(f, "invalid probability: {}", message),
            Self::InvalidObservation { message } => write!(f, "invalid observation: {}", message),
            Self::InvalidArgument { message } => write!(f, "invalid argument: {}", message),
            Self::MalformedInput { message } => write!(f, "malformed input: {}", message),
            Self::LpFailure { message } => write!(f, "LP failure: {}", message),
            Self::Unconverged { message } => write!(f, "did not converge: {}", message),
            Self::Context { note, source } => write!(f, "{}\nCaused by: {}", note, source),
        }
    }
}

impl std::error::Error for FactorplanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Attaches a note to an error as it propagates past a layer boundary,
/// without losing the original kind or message.
pub trait ResultExt<T> {
    fn context(self, note: impl Into<String>) -> FactorplanResult<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> FactorplanResult<T>;
}

impl<T> ResultExt<T> for FactorplanResult<T> {
    fn context(self, note: impl Into<String>) -> FactorplanResult<T> {
        self.map_err(|e| e.with_context(note))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> FactorplanResult<T> {
        self.map_err(|e| e.with_context(f()))
    }
}

#[macro_export]
macro_rules! factorplan_err {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::FactorplanError::$variant { message: format!($fmt, $($arg),*) }
    };
}

#[macro_export]
macro_rules! factorplan_bail {
    ($($tt:tt)+) => { return Err($crate::factorplan_err!($($tt)+)) };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($tt:tt)+) => {
        if !$cond { $crate::factorplan_bail!($variant: $($tt)+); }
    };
}
