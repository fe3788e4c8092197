//! Error types for the BalancEED client.
//!
//! Every failure the client can hit is surfaced as a [`BalanceedError`] with a
//! human-readable message. None of them are fatal to the application: callers
//! show the message inline, log it, or fall back to default data.

use std::path::PathBuf;

/// A specialized `Result` type for BalancEED client operations.
pub type Result<T> = std::result::Result<T, BalanceedError>;

/// Errors that can occur while talking to the platform or driving local state.
#[derive(Debug, thiserror::Error)]
pub enum BalanceedError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your balanceed.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Authentication Errors
    // ========================================================================
    /// Login, registration or demo setup was rejected.
    ///
    /// Session state is left unchanged when this is returned.
    #[error("Authentication failed: {reason}")]
    AuthFailed {
        /// Reason reported by the server, or a generic description.
        reason: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The API answered with a non-success status.
    #[error("Request failed with status {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail, or the status reason.
        message: String,
    },

    /// The API could not be reached.
    #[error("Network error: {message}\n\nSuggestion: Check your connection and the apiBaseUrl setting")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The API answered with a document of the wrong shape.
    #[error("Invalid server response: {message}")]
    InvalidResponse {
        /// Description of what was wrong.
        message: String,
    },

    /// The realtime channel failed to open or send.
    #[error("Chat channel error: {message}")]
    Channel {
        /// Description of the channel failure.
        message: String,
    },

    // ========================================================================
    // Form Errors
    // ========================================================================
    /// Required form fields were left empty.
    #[error("Please fill in the required fields for {form}: {}", fields.join(", "))]
    MissingFields {
        /// Name of the form being submitted.
        form: String,
        /// Names of the empty required fields.
        fields: Vec<String>,
    },

    /// A survey answer does not fit its question.
    #[error("Invalid answer for '{question}': {message}")]
    InvalidAnswer {
        /// Identifier of the question.
        question: String,
        /// Why the answer was rejected.
        message: String,
    },

    /// Wizard navigation was attempted past a boundary.
    #[error("Cannot move {direction} from step {step}")]
    NavigationBlocked {
        /// Current step index.
        step: usize,
        /// "back" or "forward".
        direction: String,
    },

    // ========================================================================
    // Exercise Errors
    // ========================================================================
    /// An answer was submitted after the attempt completed.
    #[error("Attempt for exercise '{exercise_id}' is already completed")]
    AttemptCompleted {
        /// Exercise the attempt belongs to.
        exercise_id: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BalanceedError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `AuthFailed` error.
    #[must_use]
    pub fn auth_failed(reason: impl Into<String>) -> Self {
        Self::AuthFailed {
            reason: reason.into(),
        }
    }

    /// Creates a new `Http` error.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Creates a new `Channel` error.
    #[must_use]
    pub fn channel(message: impl Into<String>) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }

    /// Creates a new `MissingFields` error.
    #[must_use]
    pub fn missing_fields(form: impl Into<String>, fields: &[&str]) -> Self {
        Self::MissingFields {
            form: form.into(),
            fields: fields.iter().map(ToString::to_string).collect(),
        }
    }

    /// Creates a new `InvalidAnswer` error.
    #[must_use]
    pub fn invalid_answer(question: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAnswer {
            question: question.into(),
            message: message.into(),
        }
    }

    /// Creates a new `NavigationBlocked` error.
    #[must_use]
    pub fn navigation_blocked(step: usize, direction: impl Into<String>) -> Self {
        Self::NavigationBlocked {
            step,
            direction: direction.into(),
        }
    }

    /// Creates a new `AttemptCompleted` error.
    #[must_use]
    pub fn attempt_completed(exercise_id: impl Into<String>) -> Self {
        Self::AttemptCompleted {
            exercise_id: exercise_id.into(),
        }
    }

    /// Returns `true` if this error is transient and the user may simply retry.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Channel { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the server rejected the credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. } | Self::AuthFailed { .. })
    }
}
