//! # Notification Types
//!
//! Toast severity and the queued toast record shared by operation outcomes
//! and push notifications.

use serde::{Deserialize, Serialize};

/// Toast severity level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    /// Indicator symbol for plain-text surfaces
    pub fn icon(self) -> &'static str {
        match self {
            Self::Info => "i",
            Self::Success => "*",
            Self::Warning => "!",
            Self::Error => "x",
        }
    }
}

/// Monotonic toast identifier, assigned by the queue on enqueue.
pub type ToastId = u64;

/// A toast waiting in (or popped from) the message queue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedToast {
    pub id: ToastId,
    pub message: String,
    pub level: ToastLevel,
}

impl QueuedToast {
    pub fn new(id: ToastId, message: impl Into<String>, level: ToastLevel) -> Self {
        Self {
            id,
            message: message.into(),
            level,
        }
    }

    /// Check if this toast is an error level toast
    pub fn is_error(&self) -> bool {
        matches!(self.level, ToastLevel::Error)
    }
}

// ============================================================================
// Fixed user-facing texts
// ============================================================================

/// Generic failure text for transport and remote errors.
pub const GENERIC_FAILURE: &str =
    "Something went wrong while processing your request. Please try again.";

/// Shown while the download request is in flight.
pub const DOWNLOAD_PREPARING: &str = "Preparing your download... just a moment!";

/// Shown when the server returns a file but flags it unsuccessful.
pub const DOWNLOAD_FAILED: &str = "Failed to download your recovery codes";
pub const DOWNLOAD_SUCCEEDED: &str = "Your recovery codes have successfully been downloaded";

/// Shown when the email endpoint answers without a message.
pub const EMAIL_NOT_SENT: &str = "The email wasn't sent";

/// Shown when a generation result arrives but the codes table stays empty.
pub const CODES_NOT_DISPLAYED: &str = "Your codes were generated but could not be displayed";

/// Shown when an invalidate/delete response carries no success marker.
pub const CODE_INVALID: &str = "The code is invalid";

/// Fallbacks for a failed invalidate/delete response.
pub const CODE_NOT_VALID_TITLE: &str = "Code not valid";
pub const CODE_NO_LONGER_VALID: &str = "The code entered is no longer valid";

/// Server alert texts that mark a fully successful code operation.
pub const CODE_DEACTIVATED: &str = "Code successfully deactivated";
pub const CODE_DELETED: &str = "Code successfully deleted";

/// Verification outcome texts
pub const SETUP_VERIFIED: &str = "Your recovery code setup has been verified";
pub const SETUP_NOT_VERIFIED: &str = "Setup verification failed";
