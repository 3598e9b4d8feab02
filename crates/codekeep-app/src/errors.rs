//! Categorized application errors
//!
//! Provides structured error types that enable:
//! - Categorized error handling (input vs config vs network vs operation)
//! - Appropriate toast severity routing
//! - A generic, retry-oriented user message that never leaks raw transport text

use std::fmt;

// Re-export ToastLevel from views/notifications (single source of truth)
pub use crate::views::notifications::ToastLevel;

// ============================================================================
// Error Categories
// ============================================================================

/// High-level error categories for frontend error handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// User input validation errors (correctable by user)
    Input,
    /// Configuration errors (correctable by modifying settings)
    Config,
    /// Network connectivity or remote status errors (often transient)
    Network,
    /// General operation failures (catch-all)
    Operation,
}

impl ErrorCategory {
    /// Get the appropriate toast severity for this category.
    #[must_use]
    pub fn toast_severity(&self) -> ToastLevel {
        match self {
            Self::Input => ToastLevel::Info,
            Self::Config => ToastLevel::Warning,
            Self::Network => ToastLevel::Warning,
            Self::Operation => ToastLevel::Error,
        }
    }

    /// Get a short label for this category.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Config => "Config",
            Self::Network => "Network",
            Self::Operation => "Operation",
        }
    }

    /// Get a hint for the user on how to resolve this category of error.
    #[must_use]
    pub fn resolution_hint(&self) -> &'static str {
        match self {
            Self::Input => "Check your input and try again",
            Self::Config => "Review your configuration settings",
            Self::Network => "Check your network connection and retry",
            Self::Operation => "Something went wrong while processing your request. Please try again",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Network error codes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkErrorCode {
    /// Request exceeded the configured timeout
    Timeout,
    /// Connection could not be established
    ConnectionRefused,
    /// Response body could not be read
    Body,
    /// Generic network error
    Other,
}

impl fmt::Display for NetworkErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionRefused => write!(f, "connection refused"),
            Self::Body => write!(f, "unreadable body"),
            Self::Other => write!(f, "network error"),
        }
    }
}

/// Categorized application errors
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    /// A required form field is missing or malformed
    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: String, reason: String },

    /// A mutating call was attempted without an anti-forgery token
    #[error("Anti-forgery token is unavailable for {endpoint}")]
    MissingToken { endpoint: String },

    /// The request itself is malformed (e.g. a POST with no JSON object body)
    #[error("Malformed request to {endpoint}: {message}")]
    Request { endpoint: String, message: String },

    /// Connection-level failure
    #[error("Network error ({code}): {message}")]
    Network {
        code: NetworkErrorCode,
        message: String,
    },

    /// The server answered with a non-success status
    #[error("Remote call to {endpoint} failed with status {status}: {message}")]
    Remote {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The server answered with a body that could not be understood
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (unexpected conditions)
    #[error("{origin}: {message}")]
    Internal { origin: String, message: String },
}

impl AppError {
    /// Create a validation error for a form field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error
    pub fn network(code: NetworkErrorCode, message: impl Into<String>) -> Self {
        Self::Network {
            code,
            message: message.into(),
        }
    }

    /// Create a remote status error
    pub fn remote(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-request error
    pub fn request(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an internal error
    pub fn internal(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Category used for toast routing
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Input,
            Self::Config(_) | Self::MissingToken { .. } => ErrorCategory::Config,
            Self::Network { .. } => ErrorCategory::Network,
            Self::Remote { status, .. } if *status >= 500 => ErrorCategory::Network,
            Self::Remote { .. }
            | Self::Decode { .. }
            | Self::Request { .. }
            | Self::Internal { .. } => ErrorCategory::Operation,
        }
    }

    /// Get the appropriate toast severity for this error
    #[must_use]
    pub fn toast_level(&self) -> ToastLevel {
        self.category().toast_severity()
    }

    /// Message safe to show to the user.
    ///
    /// Validation messages are specific; everything else collapses to the
    /// category's hint so raw transport text stays in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { reason, .. } => reason.clone(),
            other => other.category().resolution_hint().to_string(),
        }
    }

    /// Get a short error code string
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "INPUT_INVALID",
            Self::MissingToken { .. } => "AUTH_TOKEN_MISSING",
            Self::Request { .. } => "REQUEST_MALFORMED",
            Self::Network { code, .. } => match code {
                NetworkErrorCode::Timeout => "NET_TIMEOUT",
                NetworkErrorCode::ConnectionRefused => "NET_REFUSED",
                NetworkErrorCode::Body => "NET_BODY",
                NetworkErrorCode::Other => "NET_ERROR",
            },
            Self::Remote { .. } => "REMOTE_STATUS",
            Self::Decode { .. } => "REMOTE_DECODE",
            Self::Config(_) => "CONFIG",
            Self::Internal { .. } => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_display() {
        let err = AppError::network(NetworkErrorCode::Timeout, "request timed out after 30s");
        assert_eq!(
            err.to_string(),
            "Network error (timeout): request timed out after 30s"
        );
        assert_eq!(err.code(), "NET_TIMEOUT");
        assert_eq!(err.toast_level(), ToastLevel::Warning);
    }

    #[test]
    fn test_validation_error_keeps_reason_for_user() {
        let err = AppError::validation("days-to-expiry", "Days to expiry must be a positive number");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert_eq!(err.user_message(), "Days to expiry must be a positive number");
        assert_eq!(err.toast_level(), ToastLevel::Info);
    }

    #[test]
    fn test_remote_error_hides_raw_text() {
        let err = AppError::remote("/auth/recovery-codes/email/", 400, "traceback ...");
        assert_eq!(err.category(), ErrorCategory::Operation);
        assert!(!err.user_message().contains("traceback"));
        assert_eq!(err.code(), "REMOTE_STATUS");
    }

    #[test]
    fn test_server_errors_route_as_network() {
        let err = AppError::remote("/auth/recovery-codes/email/", 503, "unavailable");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.user_message(), "Check your network connection and retry");
    }

    #[test]
    fn test_missing_token_is_config() {
        let err = AppError::MissingToken {
            endpoint: "/auth/recovery-codes/regenerate/".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Config);
        assert_eq!(err.toast_level(), ToastLevel::Warning);
    }

    #[test]
    fn test_internal_error() {
        let err = AppError::internal("console", "renderer missing");
        assert_eq!(err.to_string(), "console: renderer missing");
        assert_eq!(err.code(), "INTERNAL");
        assert_eq!(err.toast_level(), ToastLevel::Error);
    }

    // ========================================================================
    // ErrorCategory Tests
    // ========================================================================

    #[test]
    fn test_error_category_labels() {
        assert_eq!(ErrorCategory::Input.label(), "Input");
        assert_eq!(ErrorCategory::Config.label(), "Config");
        assert_eq!(ErrorCategory::Network.label(), "Network");
        assert_eq!(ErrorCategory::Operation.label(), "Operation");
        assert_eq!(format!("{}", ErrorCategory::Network), "Network");
    }

    #[test]
    fn test_error_category_resolution_hints() {
        for category in [
            ErrorCategory::Input,
            ErrorCategory::Config,
            ErrorCategory::Network,
            ErrorCategory::Operation,
        ] {
            assert!(!category.resolution_hint().is_empty());
        }
    }
}
