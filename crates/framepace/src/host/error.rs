use std::fmt;

use super::Primitive;

/// A host refused or could not service a scheduling request.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// The host does not expose this primitive at all.
    Unsupported(Primitive),
    /// The primitive exists but the request was rejected.
    Rejected { primitive: Primitive, reason: String },
    /// The host environment itself is missing (no window, no clock).
    Unavailable(&'static str),
}

impl HostError {
    pub(crate) fn rejected(primitive: Primitive, reason: impl Into<String>) -> Self {
        Self::Rejected { primitive, reason: reason.into() }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Unsupported(p) => write!(f, "host does not support {p}"),
            HostError::Rejected { primitive, reason } => {
                write!(f, "host rejected {primitive} request: {reason}")
            }
            HostError::Unavailable(what) => write!(f, "host environment unavailable: {what}"),
        }
    }
}

impl std::error::Error for HostError {}
