//! Error types for Warden.
//!
//! Authorization code has one hard rule: no failure path may ever surface as
//! an "allowed" decision. The taxonomy below keeps the three outcomes callers
//! must distinguish — a definite deny, a missing entity, and an indeterminate
//! collaborator failure — as separate variants so enforcement boundaries can
//! fail closed without guessing.

use thiserror::Error;

/// Result type alias for Warden operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Warden operations.
///
/// # Examples
///
/// ```rust
/// use warden_core::error::{Error, Result};
///
/// fn example_function() -> Result<()> {
///     Err(Error::denied("actor does not out-rank the target role"))
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced user, role, or permission no longer exists. Treated as
    /// deny, never as allow, for any authorization decision.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A repository or cache backend could not be reached. Enforcement
    /// boundaries treat this as deny.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// An authorization check concluded with a definite deny.
    #[error("Denied: {0}")]
    Denied(String),

    /// A uniqueness constraint would be violated (role name, username, ...).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The entity graph is in a state the requested operation cannot act on.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The engine was wired together incorrectly (missing repository,
    /// nonsensical cache settings, unreadable config file).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input/output error from the underlying system.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for other error types.
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a new not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a new denied error.
    pub fn denied(msg: impl Into<String>) -> Self {
        Self::Denied(msg.into())
    }

    /// Create a new conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a new invalid-state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a new configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// True when the error is a definite authorization refusal rather than
    /// an infrastructure failure.
    ///
    /// `NotFound` counts as a refusal: a decision about a missing entity is
    /// always deny.
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::Denied(_) | Self::NotFound(_))
    }

    /// True when the outcome could not be determined. Callers at the
    /// enforcement boundary must map this to deny, not retry-as-allow.
    pub fn is_indeterminate(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Serialization(_) | Self::Io(_) | Self::Other(_)
        )
    }
}
