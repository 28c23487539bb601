//! Error types for the integration mapping engine

use thiserror::Error;

/// Errors raised by the record and schema store boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A record that was expected to exist could not be found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The store refused to create, transform or submit a record
    #[error("Record rejected: {0}")]
    Rejected(String),

    /// A sublist line index outside `1..=line_count`
    #[error("Line {index} does not exist on sublist '{sublist}'")]
    InvalidLine { sublist: String, index: usize },

    /// A line-level write or commit without a selected line
    #[error("No line is selected on sublist '{0}'")]
    NoCurrentLine(String),

    /// Any other failure reported by the backing store
    #[error("Store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new rejected error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create a new backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// A raw external value that cannot be represented as the declared field type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("'{0}' is not a valid integer")]
    InvalidInteger(String),

    #[error("'{0}' is not a valid decimal number")]
    InvalidFloat(String),

    #[error("'{0}' is not a valid date")]
    InvalidDate(String),
}

/// Errors that can occur while mapping a payload onto a record
#[derive(Error, Debug)]
pub enum MappingError {
    /// Mapping schema missing, empty or malformed
    #[error("Schema error: {0}")]
    Schema(String),

    /// A join or lookup could not be resolved or created
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Source document missing, in a restricted status, or `createdfrom` absent
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A sublist line could not be set or received
    #[error("Line error: {0}")]
    Line(String),

    /// An address block could not be populated
    #[error("Address error: {0}")]
    Address(String),

    /// Engine or project configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input payload
    #[error("Invalid input data: {0}")]
    InvalidInput(String),

    /// Store boundary errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Value conversion errors
    #[error("Value error: {0}")]
    Transform(#[from] TransformError),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// File access errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MappingError {
    /// Create a new schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a new resolution error
    pub fn resolution(msg: impl Into<String>) -> Self {
        Self::Resolution(msg.into())
    }

    /// Create a new precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create a new line error
    pub fn line(msg: impl Into<String>) -> Self {
        Self::Line(msg.into())
    }

    /// Create a new address error
    pub fn address(msg: impl Into<String>) -> Self {
        Self::Address(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// The message returned to the calling party, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Schema(msg)
            | Self::Resolution(msg)
            | Self::Precondition(msg)
            | Self::Line(msg)
            | Self::Address(msg)
            | Self::Configuration(msg)
            | Self::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;
