use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Domain errors surfaced by the repository and the service facades.
///
/// Predicate evaluation never produces one of these; ill-typed comparisons
/// evaluate to `false` instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RhabacError {
    /// A read referenced a resource, attribute, or policy that does not exist.
    NotFound(String),

    /// A write would duplicate an existing record or close an inheritance cycle.
    Conflict(String),

    /// The request itself is malformed (empty permission name, root deletion).
    InvalidArgument(String),

    /// The backing store failed.
    Backend(String),

    /// The request's cancellation token tripped.
    Cancelled,

    /// An internal invariant did not hold.
    Internal(String),
}

impl Display for RhabacError {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Self::NotFound(what) => write!(f, "Not found: {}", what),
            Self::Conflict(what) => write!(f, "Conflict: {}", what),
            Self::InvalidArgument(what) => write!(f, "Invalid argument: {}", what),
            Self::Backend(what) => write!(f, "Backend failure: {}", what),
            Self::Cancelled => f.write_str("Cancelled"),
            Self::Internal(what) => write!(f, "Internal invariant violated: {}", what),
        }
    }
}

impl Error for RhabacError {}
