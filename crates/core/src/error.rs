//! Error handling for the qagen core library

use std::fmt;
use thiserror::Error;

/// Result type alias for qagen operations
pub type Result<T> = std::result::Result<T, QagenError>;

/// Main error type for qagen operations
#[derive(Error, Debug)]
pub enum QagenError {
    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Prompt template rendering errors
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Nothing left to process after preprocessing or an empty request
    #[error("Empty input: {message}")]
    EmptyInput { message: String },

    /// A blank context reached the generator
    #[error("Context is empty or whitespace-only")]
    EmptyContext,

    /// The generation collaborator answered without the expected text field
    #[error("Unexpected output format from generation service: {raw}")]
    UnexpectedOutputFormat { raw: String },

    /// Every candidate failed answer validation
    #[error("No valid question/answer pairs were generated")]
    NoValidQa,

    /// Deduplication removed every candidate
    #[error("All question/answer pairs were removed as duplicates")]
    AllDuplicates,

    /// A model-serving collaborator could not be reached
    #[error("Service '{service}' unavailable: {message}")]
    CollaboratorUnavailable { service: String, message: String },

    /// A collaborator call exceeded its deadline
    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    /// Caller broke an API precondition
    #[error("Precondition violated: {message}")]
    PreconditionViolation { message: String },

    /// Configuration or argument validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Embedding generation errors
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Chunking errors
    #[error("Chunking error: {message}")]
    Chunking { message: String },

    /// Invalid state errors
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}

impl QagenError {
    /// Create an empty input error
    pub fn empty_input<S: Into<String>>(message: S) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Create an unexpected output format error carrying the raw payload
    pub fn unexpected_output<S: Into<String>>(raw: S) -> Self {
        Self::UnexpectedOutputFormat { raw: raw.into() }
    }

    /// Create a collaborator unavailable error
    pub fn unavailable<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::CollaboratorUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a precondition violation error
    pub fn precondition<S: Into<String>>(message: S) -> Self {
        Self::PreconditionViolation {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a chunking error
    pub fn chunking<S: Into<String>>(message: S) -> Self {
        Self::Chunking {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Check if error is retryable by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CollaboratorUnavailable { .. } | Self::Timeout { .. } | Self::Http(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Io(_) => ErrorCategory::FileSystem,
            Self::Http(_) | Self::CollaboratorUnavailable { .. } => ErrorCategory::Network,
            Self::Json(_) | Self::Yaml(_) => ErrorCategory::Serialization,
            Self::Config(_) | Self::Validation { .. } => ErrorCategory::Configuration,
            Self::Template(_) => ErrorCategory::Template,
            Self::Url(_) => ErrorCategory::Url,
            Self::EmptyInput { .. } | Self::NoValidQa | Self::AllDuplicates => {
                ErrorCategory::Curation
            }
            Self::EmptyContext | Self::UnexpectedOutputFormat { .. } => ErrorCategory::Generation,
            Self::Embedding { .. } => ErrorCategory::Embedding,
            Self::Chunking { .. } => ErrorCategory::Chunking,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::PreconditionViolation { .. } => ErrorCategory::Precondition,
            Self::InvalidState { .. } => ErrorCategory::State,
            Self::Generic(_) => ErrorCategory::Generic,
        }
    }

    /// HTTP-like status code used by the service surface
    ///
    /// 410 means nothing survived filtering, 503 a collaborator was
    /// unreachable, 400 the caller sent something unusable, 500 the rest.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmptyInput { .. } | Self::NoValidQa | Self::AllDuplicates => 410,
            Self::CollaboratorUnavailable { .. } | Self::Timeout { .. } => 503,
            Self::PreconditionViolation { .. } | Self::Validation { .. } => 400,
            _ => 500,
        }
    }
}

/// Error categories for logging
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    FileSystem,
    Network,
    Serialization,
    Configuration,
    Template,
    Url,
    Curation,
    Generation,
    Embedding,
    Chunking,
    Timeout,
    Precondition,
    State,
    Generic,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileSystem => write!(f, "filesystem"),
            Self::Network => write!(f, "network"),
            Self::Serialization => write!(f, "serialization"),
            Self::Configuration => write!(f, "configuration"),
            Self::Template => write!(f, "template"),
            Self::Url => write!(f, "url"),
            Self::Curation => write!(f, "curation"),
            Self::Generation => write!(f, "generation"),
            Self::Embedding => write!(f, "embedding"),
            Self::Chunking => write!(f, "chunking"),
            Self::Timeout => write!(f, "timeout"),
            Self::Precondition => write!(f, "precondition"),
            Self::State => write!(f, "state"),
            Self::Generic => write!(f, "generic"),
        }
    }
}
