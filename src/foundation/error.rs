/// Convenience result type used across snapbook.
pub type SnapResult<T> = Result<T, SnapError>;

/// Top-level error taxonomy used by store, render and editor APIs.
#[derive(thiserror::Error, Debug)]
pub enum SnapError {
    /// Invalid caller-provided data (bad sizes, unknown keys, malformed records).
    #[error("validation error: {0}")]
    Validation(String),

    /// Source image bytes could not be decoded. This is the one error meant for the user.
    #[error("decode error: {0}")]
    Decode(String),

    /// The backing store rejected a write for size reasons.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Any other backing store failure (IO, missing directory, permissions).
    #[error("storage error: {0}")]
    Storage(String),

    /// Errors when serializing or deserializing persisted records.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SnapError {
    /// Build a [`SnapError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SnapError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`SnapError::CapacityExceeded`] value.
    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::CapacityExceeded(msg.into())
    }

    /// Build a [`SnapError::Storage`] value.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Return `true` when the relief ladder should handle this error.
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::CapacityExceeded(_))
    }
}

impl From<serde_json::Error> for SnapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
