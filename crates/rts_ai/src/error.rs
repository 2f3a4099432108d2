//! Error types for the AI decision engine.

use thiserror::Error;

/// Result type alias using [`AiError`].
pub type Result<T> = std::result::Result<T, AiError>;

/// Top-level error type for the AI decision engine.
#[derive(Debug, Error)]
pub enum AiError {
    /// The observer table was asked for a building name it has never seen.
    ///
    /// Per the engine's error-handling contract this is a programmer error,
    /// not a recoverable condition: every building the host exposes must be
    /// registered with the engine during late-initialization.
    #[error("unknown building observer requested: {0}")]
    UnknownBuilding(String),

    /// An [`crate::personality::EnginePersonality`] RON document failed to parse.
    #[error("failed to parse AI personality config '{path}': {message}")]
    ConfigParseError {
        /// Path (or source label) of the document that failed to parse.
        path: String,
        /// Underlying parse error message.
        message: String,
    },
}
