use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt;
use thiserror::Error;

/// DynamoDB Error Codes, bei denen ein erneuter Versuch sinnvoll ist
const RETRYABLE_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "ThrottlingException",
    "RequestLimitExceeded",
    "InternalServerError",
    "ServiceUnavailable",
];

/// Fehler der Storage-Schicht
#[derive(Debug, Error)]
pub enum StorageError {
    /// Netzwerk, Timeout oder unlesbare Antwort
    #[error("transport error: {0}")]
    Transport(String),

    /// Vom Service gemeldeter Fehler
    #[error("service error {code}: {message}")]
    Service {
        code: String,
        message: String,
        retryable: bool,
    },

    /// Request konnte nicht gebaut werden
    #[error("invalid request: {0}")]
    Configuration(String),
}

impl StorageError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let retryable = RETRYABLE_CODES.contains(&code.as_str());
        Self::Service {
            code,
            message: message.into(),
            retryable,
        }
    }

    /// Transportfehler und Throttling werden wiederholt, alles andere nicht
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Transport(_) => true,
            StorageError::Service { retryable, .. } => *retryable,
            StorageError::Configuration(_) => false,
        }
    }

    /// Klassifiziere einen SDK Fehler
    pub fn from_sdk<E, R>(err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: fmt::Debug + Send + Sync + 'static,
    {
        let message = DisplayErrorContext(&err).to_string();
        match &err {
            SdkError::ServiceError(ctx) => {
                let code = ctx.err().code().unwrap_or("Unknown").to_string();
                let message = ctx
                    .err()
                    .message()
                    .map(str::to_string)
                    .unwrap_or(message);
                StorageError::service(code, message)
            }
            SdkError::ConstructionFailure(_) => StorageError::Configuration(message),
            _ => StorageError::Transport(message),
        }
    }
}

/// Phase einer Tabellenmigration, in der ein Fehler auftrat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scan,
    Write,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Scan => f.write_str("scan"),
            Phase::Write => f.write_str("write"),
        }
    }
}

/// Fehler beim Kopieren einer Tabelle
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("{phase} of table {table} failed")]
    Storage {
        table: String,
        phase: Phase,
        #[source]
        source: StorageError,
    },

    #[error("{remaining} items still unprocessed by table {table} after retries")]
    UnprocessedItems { table: String, remaining: usize },
}

impl MigrationError {
    pub fn scan(table: &str, source: StorageError) -> Self {
        Self::Storage {
            table: table.to_string(),
            phase: Phase::Scan,
            source,
        }
    }

    pub fn write(table: &str, source: StorageError) -> Self {
        Self::Storage {
            table: table.to_string(),
            phase: Phase::Write,
            source,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            MigrationError::Storage { table, .. } => table,
            MigrationError::UnprocessedItems { table, .. } => table,
        }
    }
}
