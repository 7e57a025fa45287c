/// Core error type for rollcall
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error during {operation} ({key}): {source}")]
    Database {
        operation: &'static str,
        key: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous result: {0}")]
    Ambiguous(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a store failure with the operation and key it happened on
    pub fn database(operation: &'static str, key: impl ToString, source: sqlx::Error) -> Self {
        Error::Database {
            operation,
            key: key.to_string(),
            source,
        }
    }

    /// Name of the failed store operation, if this is a store error
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Error::Database { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
