//! Error types for inbox-triage.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration-related errors. All fatal: a process that cannot load its
/// rules must not guess at actions.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Failed to read rules file {path}: {source}")]
    RulesIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed rules file {path}: {source}")]
    RulesParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Mail provider errors.
///
/// `AuthFailed` is fatal at connect time. Everything else is recoverable at
/// the item level inside a cycle: the failing message is reported and the
/// rest of the batch proceeds.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gmail API returned {status} for {endpoint}")]
    Api { endpoint: String, status: u16 },

    #[error("Malformed message {id}: {reason}")]
    MalformedMessage { id: String, reason: String },
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
