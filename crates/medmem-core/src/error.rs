//! Error types for medmem operations.
//!
//! Every runtime error kind here is recoverable: the session degrades the
//! affected step (fallback extraction, placeholder context fragment, apology
//! response) instead of aborting the turn. Only construction-time
//! configuration errors are fatal.

use thiserror::Error;

/// Result type alias for medmem operations.
pub type MedMemResult<T> = Result<T, MedMemError>;

/// Main error type for all medmem operations.
#[derive(Error, Debug)]
pub enum MedMemError {
    /// Extraction, routing or assembly was requested before a patient name is known.
    #[error("Patient identity has not been resolved")]
    UnresolvedIdentity,

    /// The completion service could not classify an utterance.
    #[error("Extraction unavailable: {message}")]
    ExtractionUnavailable { message: String, code: ErrorCode },

    /// A persistence backend failed.
    #[error("{store} store unavailable: {message}")]
    StoreUnavailable {
        store: StoreKind,
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The completion service failed to produce a response.
    #[error("Completion failure: {message}")]
    CompletionFailure {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The long-term store an error or write refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum StoreKind {
    Visit,
    Profile,
    Fact,
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Identity (ID_xxx)
    IdUnresolved,

    // Extraction (EXT_xxx)
    ExtCompletionFailed,
    ExtUnparseable,

    // Store (STORE_xxx)
    StoreReadFailed,
    StoreWriteFailed,

    // Completion (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmEmptyResponse,

    // Configuration (CFG_xxx)
    CfgInvalid,

    // Database (DB_xxx)
    DbOperationFailed,

    // Parse (PARSE_xxx)
    ParseInvalidFormat,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IdUnresolved => "ID_001",
            ErrorCode::ExtCompletionFailed => "EXT_001",
            ErrorCode::ExtUnparseable => "EXT_002",
            ErrorCode::StoreReadFailed => "STORE_001",
            ErrorCode::StoreWriteFailed => "STORE_002",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmEmptyResponse => "LLM_003",
            ErrorCode::CfgInvalid => "CFG_001",
            ErrorCode::DbOperationFailed => "DB_001",
            ErrorCode::ParseInvalidFormat => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl MedMemError {
    /// Create an extraction-unavailable error.
    pub fn extraction_unavailable(message: impl Into<String>) -> Self {
        Self::ExtractionUnavailable {
            message: message.into(),
            code: ErrorCode::ExtCompletionFailed,
        }
    }

    /// Create an extraction-unavailable error for output that could not be parsed.
    pub fn unparseable(message: impl Into<String>) -> Self {
        Self::ExtractionUnavailable {
            message: message.into(),
            code: ErrorCode::ExtUnparseable,
        }
    }

    /// Create a store read error.
    pub fn store_read(store: StoreKind, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store,
            message: message.into(),
            code: ErrorCode::StoreReadFailed,
            source: None,
        }
    }

    /// Create a store write error.
    pub fn store_write(store: StoreKind, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store,
            message: message.into(),
            code: ErrorCode::StoreWriteFailed,
            source: None,
        }
    }

    /// Create a completion error.
    pub fn completion(message: impl Into<String>) -> Self {
        Self::CompletionFailure {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create a completion error for a transport-level failure.
    pub fn completion_transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CompletionFailure {
            message: message.into(),
            code: ErrorCode::LlmConnectionFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create a missing-credentials configuration error.
    pub fn missing_credentials(variable: &str, provider: &str) -> Self {
        Self::Configuration(format!(
            "{} API key not found. Set {} environment variable or provide api_key in config.",
            provider, variable
        ))
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidFormat,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnresolvedIdentity => ErrorCode::IdUnresolved,
            Self::ExtractionUnavailable { code, .. } => *code,
            Self::StoreUnavailable { code, .. } => *code,
            Self::CompletionFailure { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::CfgInvalid,
            Self::Parse { code, .. } => *code,
            Self::Database { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::UnresolvedIdentity => Some("Ask the patient for their name first"),
            Self::CompletionFailure { .. } => Some("Please check your LLM provider configuration"),
            Self::StoreUnavailable { .. } | Self::Database { .. } => {
                Some("Please check that the data directory is writable")
            }
            Self::Configuration(_) => Some("Please check your .env file or config file"),
            _ => None,
        }
    }

    /// Re-tag a database or internal error as a failure of the given store.
    pub fn for_store(self, store: StoreKind, code: ErrorCode) -> Self {
        match self {
            Self::StoreUnavailable { .. } => self,
            Self::Database {
                message, source, ..
            } => Self::StoreUnavailable {
                store,
                message,
                code,
                source,
            },
            other => Self::StoreUnavailable {
                store,
                message: other.to_string(),
                code,
                source: None,
            },
        }
    }
}

impl From<rusqlite::Error> for MedMemError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_unavailable_codes() {
        let err = MedMemError::extraction_unavailable("timeout");
        assert_eq!(err.code(), ErrorCode::ExtCompletionFailed);
        assert!(err.to_string().contains("timeout"));

        let err = MedMemError::unparseable("no labels");
        assert_eq!(err.code(), ErrorCode::ExtUnparseable);
    }

    #[test]
    fn test_for_store_retags_database_error() {
        let err = MedMemError::database("disk I/O error")
            .for_store(StoreKind::Visit, ErrorCode::StoreReadFailed);
        assert_eq!(err.code(), ErrorCode::StoreReadFailed);
        assert_eq!(err.to_string(), "Visit store unavailable: disk I/O error");
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::IdUnresolved.as_str(), "ID_001");
        assert_eq!(ErrorCode::StoreWriteFailed.as_str(), "STORE_002");
        assert_eq!(MedMemError::UnresolvedIdentity.code().as_str(), "ID_001");
    }
}
