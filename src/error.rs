//! Error types for the GitHub provider.
//!
//! [`ClientError`] classifies the outcome of a single HTTP round-trip against the
//! GitHub REST API. [`ProviderError`] is what every lifecycle transition returns
//! to the host tool; client failures are wrapped unchanged so callers can still
//! match on the status that was observed.

use std::time::Duration;

use thiserror::Error;

use crate::schema::Diagnostic;

/// No HTTP response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The execution context was cancelled before or during the round-trip.
    #[error("request cancelled")]
    Cancelled,

    /// The round-trip exceeded the configured wall-clock bound.
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),

    /// Connection, DNS, TLS or body-read failure.
    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

/// Errors produced by [`GitHubClient`](crate::client::GitHubClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// `GET` reported that the repository does not exist.
    #[error("Repository not found")]
    NotFound,

    /// The response status did not match the operation's success status.
    #[error("Unexpected HTTP status {status}{}", fmt_remote_message(.message))]
    Remote {
        /// The numeric HTTP status.
        status: u16,
        /// The `message` field of the GitHub error body, if any.
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request payload could not be encoded.
    #[error("Failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
}

fn fmt_remote_message(message: &Option<String>) -> String {
    match message {
        Some(msg) => format!(": {}", msg),
        None => String::new(),
    }
}

impl ClientError {
    /// The HTTP status observed for this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure happened before any HTTP response was obtained.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub(crate) fn remote(status: u16, message: Option<String>) -> Self {
        Self::Remote { status, message }
    }
}

/// Errors returned by provider lifecycle transitions.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A call to the GitHub API failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The declared state failed schema validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider is not configured, or its configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// Invalid request from the host tool.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The transition cannot run against the current state.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// A state record could not be converted to or from JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> String {
        match self {
            Self::Client(err) => err.to_string(),
            Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::InvalidRequest(msg)
            | Self::FailedPrecondition(msg) => msg.clone(),
            Self::Serialization(err) => err.to_string(),
        }
    }

    /// The client error behind this failure, if the API was involved.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client(err) => Some(err),
            _ => None,
        }
    }

    /// Convert this error into an error diagnostic for the host tool.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let summary = match self {
            Self::Client(ClientError::Transport(_)) => "GitHub API unreachable",
            Self::Client(_) => "GitHub API error",
            Self::Validation(_) => "Invalid resource configuration",
            Self::Configuration(_) => "Provider configuration error",
            Self::UnknownResource(_) => "Unknown resource type",
            Self::InvalidRequest(_) => "Invalid request",
            Self::FailedPrecondition(_) => "Operation not allowed",
            Self::Serialization(_) => "Invalid state record",
        };
        Diagnostic::error(summary).with_detail(self.to_string())
    }
}
