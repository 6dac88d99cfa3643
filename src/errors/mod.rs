//! Error handling module for the roster core.
//!
//! Every failure is converted into a user-facing [`Notice`] at the point where it
//! occurs; nothing here is meant to abort a session.

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Error codes as constants to avoid stringly-typed errors.
#[allow(dead_code)]
pub mod codes {
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const SESSION_FAILED: &str = "SESSION_FAILED";
    pub const SUBSCRIPTION_ERROR: &str = "SUBSCRIPTION_ERROR";
    pub const WRITE_FAILED: &str = "WRITE_FAILED";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Roster error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// Remote configuration is missing or malformed
    ConfigInvalid(String),
    /// Anonymous session was rejected
    SessionFailed(String),
    /// A remote listener reported an error
    SubscriptionError(String),
    /// A remote write was rejected; optimistic state is kept
    WriteFailed(String),
    /// Write attempted outside the caller's bus or role
    Unauthorized(String),
    /// Malformed user input
    Validation(String),
    /// Nothing matched the request
    NotFound(String),
    /// Local key-value storage failed
    Storage(String),
    /// Anything else
    Internal(String),
}

impl RosterError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            RosterError::ConfigInvalid(_) => codes::CONFIG_INVALID,
            RosterError::SessionFailed(_) => codes::SESSION_FAILED,
            RosterError::SubscriptionError(_) => codes::SUBSCRIPTION_ERROR,
            RosterError::WriteFailed(_) => codes::WRITE_FAILED,
            RosterError::Unauthorized(_) => codes::UNAUTHORIZED,
            RosterError::Validation(_) => codes::VALIDATION_ERROR,
            RosterError::NotFound(_) => codes::NOT_FOUND,
            RosterError::Storage(_) => codes::STORAGE_ERROR,
            RosterError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            RosterError::ConfigInvalid(msg) => msg.clone(),
            RosterError::SessionFailed(msg) => msg.clone(),
            RosterError::SubscriptionError(msg) => msg.clone(),
            RosterError::WriteFailed(msg) => msg.clone(),
            RosterError::Unauthorized(msg) => msg.clone(),
            RosterError::Validation(msg) => msg.clone(),
            RosterError::NotFound(msg) => msg.clone(),
            RosterError::Storage(msg) => msg.clone(),
            RosterError::Internal(msg) => msg.clone(),
        }
    }

    /// Whether this error switches the orchestrator back to local mode.
    pub fn changes_mode(&self) -> bool {
        matches!(
            self,
            RosterError::SessionFailed(_) | RosterError::SubscriptionError(_)
        )
    }

    /// Convert into the notice shown to the user.
    pub fn notice(&self) -> Notice {
        let title = match self {
            RosterError::ConfigInvalid(_) => "Invalid cloud configuration",
            RosterError::SessionFailed(_) => "Cloud sign-in failed",
            RosterError::SubscriptionError(_) => "Cloud sync interrupted",
            RosterError::WriteFailed(_) => "Cloud write failed",
            RosterError::Unauthorized(_) => "Permission denied",
            RosterError::Validation(_) => "Invalid input",
            RosterError::NotFound(_) => "Not found",
            RosterError::Storage(_) => "Local storage failed",
            RosterError::Internal(_) => "Unexpected error",
        };
        Notice::error(title, self.message())
    }
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for RosterError {}

impl From<sqlx::Error> for RosterError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Local storage error: {:?}", err);
        RosterError::Storage(format!("Local storage error: {}", err))
    }
}

impl From<serde_json::Error> for RosterError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        RosterError::Internal(format!("JSON error: {}", err))
    }
}

impl From<base64::DecodeError> for RosterError {
    fn from(err: base64::DecodeError) -> Self {
        tracing::warn!("Setup code is not valid base64: {:?}", err);
        RosterError::ConfigInvalid(format!("Setup code is not valid base64: {}", err))
    }
}

impl From<StoreError> for RosterError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Remote store error: {}", err);
        RosterError::WriteFailed(format!(
            "Cloud database write failed, check the network connection ({})",
            err
        ))
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorKind;

    #[test]
    fn test_only_session_and_subscription_errors_change_mode() {
        assert!(RosterError::SessionFailed("x".into()).changes_mode());
        assert!(RosterError::SubscriptionError("x".into()).changes_mode());
        assert!(!RosterError::WriteFailed("x".into()).changes_mode());
        assert!(!RosterError::Unauthorized("x".into()).changes_mode());
        assert!(!RosterError::NotFound("x".into()).changes_mode());
    }

    #[test]
    fn test_notice_carries_message() {
        let notice = RosterError::Validation("Enter the last 3 digits".into()).notice();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.title, "Invalid input");
        assert_eq!(notice.message, "Enter the last 3 digits");
    }

    #[test]
    fn test_store_error_becomes_write_failed() {
        let err: RosterError =
            StoreError::with_kind("permission denied", StoreErrorKind::PermissionDenied).into();
        assert_eq!(err.error_code(), codes::WRITE_FAILED);
        assert!(err.message().contains("permission denied"));
    }

    #[test]
    fn test_display_includes_code() {
        let err = RosterError::NotFound("no member".into());
        assert_eq!(err.to_string(), "NOT_FOUND: no member");
    }
}
