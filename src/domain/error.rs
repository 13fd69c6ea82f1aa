//! Domain-level errors (no I/O, no CLI concerns)

use thiserror::Error;

/// Domain errors represent schema and type violations.
/// These are independent of how flags are parsed or requests are sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("field '{field}': union of {alternatives} types has no flag encoding")]
    UnsupportedUnion { field: String, alternatives: usize },

    #[error("field '{field}': {shape} has no flag encoding")]
    UnsupportedNesting { field: String, shape: String },

    #[error("invalid value for --{flag}: '{value}' is not a valid {expected}")]
    FlagFormat {
        flag: String,
        value: String,
        expected: String,
    },

    #[error("cannot construct {schema} request: {message}")]
    SchemaConstruction { schema: String, message: String },

    #[error("invalid schema {schema}: {message}")]
    InvalidSchema { schema: String, message: String },

    #[error("duplicate flag --{flag} in command {command}")]
    DuplicateFlag { command: String, flag: String },
}

impl DomainError {
    /// Attach the field name to a resolution error raised without one.
    pub(crate) fn for_field(self, name: &str) -> Self {
        match self {
            DomainError::UnsupportedUnion { alternatives, .. } => DomainError::UnsupportedUnion {
                field: name.to_string(),
                alternatives,
            },
            DomainError::UnsupportedNesting { shape, .. } => DomainError::UnsupportedNesting {
                field: name.to_string(),
                shape,
            },
            other => other,
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
