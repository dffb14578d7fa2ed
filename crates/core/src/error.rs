//! Error types for the generation pipeline.

use std::fmt;

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors that abort a generation run.
///
/// Any of these leaves no output behind: partial output would reference
/// declarations that were never produced.
#[derive(thiserror::Error, Debug)]
pub enum GenerationError {
    /// A reference does not resolve, or the description is structurally
    /// inconsistent in a way resolution cannot work around.
    #[error("Malformed schema at {location}: {reason}")]
    MalformedSchema {
        /// JSON-pointer-like location of the offending schema
        location: String,
        /// What is wrong with it
        reason: String,
    },

    /// A construct has no TypeScript mapping policy (e.g. `not`).
    ///
    /// Only raised when best-effort mode is off; otherwise the construct is
    /// recorded as a [`Diagnostic`] and typed as `unknown`.
    #[error("Unsupported construct `{construct}` at {location}")]
    UnsupportedConstruct {
        /// JSON-pointer-like location of the construct
        location: String,
        /// Keyword or shape that could not be mapped
        construct: String,
    },

    /// Two generated artifacts ended up with the same identifier.
    ///
    /// The name allocator disambiguates collisions itself, so this is an
    /// internal invariant violation.
    #[error("Identifier `{identifier}` could not be made unique: {reason}")]
    NameCollision {
        /// Identifier that collided
        identifier: String,
        /// Why disambiguation failed
        reason: String,
    },

    /// The input helper could not parse a JSON description.
    #[error("Failed to parse API description as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input helper could not parse a YAML description.
    #[error("Failed to parse API description as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// An unsupported construct that was replaced by `unknown` in best-effort mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// JSON-pointer-like location of the construct
    pub location: String,
    /// Keyword or shape that could not be mapped
    pub construct: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported construct `{}` at {} (typed as unknown)",
            self.construct, self.location
        )
    }
}
