//! Domain error types

use thiserror::Error;

/// Failure of a single call to an LLM provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Rate limit, timeout, 5xx, or connection failure; safe to retry
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Authentication failure or invalid request; never retried
    #[error("Fatal provider error: {0}")]
    Fatal(String),
}

impl ProviderError {
    /// Whether a retry could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    /// The underlying message
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Transient(m) | ProviderError::Fatal(m) => m,
        }
    }
}

/// Requested schema is not registered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown schema: {0}")]
pub struct UnknownSchemaError(pub String);

/// Schema definition violates an invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two fields share a name
    #[error("Schema '{schema}' defines field '{field}' more than once")]
    DuplicateField {
        /// Schema name
        schema: String,
        /// Repeated field name
        field: String,
    },

    /// No field is marked required
    #[error("Schema '{0}' has no required fields")]
    NoRequiredFields(String),

    /// Enum field without allowed values
    #[error("Enum field '{field}' in schema '{schema}' has no allowed values")]
    EmptyEnum {
        /// Schema name
        schema: String,
        /// Field name
        field: String,
    },

    /// A schema with this name is already registered
    #[error("Schema '{0}' is already registered")]
    AlreadyRegistered(String),

    /// Schema file could not be parsed
    #[error("Invalid schema definition: {0}")]
    Parse(String),
}
