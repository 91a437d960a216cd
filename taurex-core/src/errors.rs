use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum TaurexError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),
    #[error("Unknown {kind} '{name}'")]
    LookupFailure { kind: String, name: String },
    #[error("Wrong shape for {name}. Expected {expected}, got {got}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("Could not parse configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TaurexError {
    /// Shorthand for a failed lookup of a named item
    pub fn lookup(kind: &str, name: &str) -> Self {
        TaurexError::LookupFailure {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }
}

/// Convenience type for `Result<T, TaurexError>`.
pub type TaurexResult<T> = Result<T, TaurexError>;
