/// Convenience result type used across stagepen.
pub type PenResult<T> = Result<T, PenError>;

/// Error taxonomy for the fallible (construction-time) parts of the pen pipeline.
///
/// Frame-time operations such as collision checks and pixel sampling never return these; they
/// degrade to an empty result instead.
#[derive(thiserror::Error, Debug)]
pub enum PenError {
    /// Invalid configuration or caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required program failed to link against its declared interface.
    #[error("shader error: {0}")]
    Shader(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PenError {
    /// Build a [`PenError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PenError::Shader`] value.
    pub fn shader(msg: impl Into<String>) -> Self {
        Self::Shader(msg.into())
    }

    /// Build a [`PenError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
