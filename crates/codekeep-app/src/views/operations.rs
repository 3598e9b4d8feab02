//! Portable operation result types
//!
//! Structured payloads returned by the recovery-code endpoints. Server keys
//! are SCREAMING_SNAKE_CASE; missing keys fall back to their defaults so a
//! partial payload degrades to a failure rather than a decode error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::history::BatchRecord;

// ============================================================================
// Generation
// ============================================================================

/// Result of generate-with-expiry, generate-without-expiry and regenerate
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct GenerateResponse {
    pub success: bool,
    /// False when the server refuses to issue a new batch right now
    pub can_generate: bool,
    pub total_issued: u64,
    pub codes: Vec<String>,
    pub batch: Option<BatchRecord>,
    /// Server-side page size for the history window, when it sends one
    pub item_per_page: Option<usize>,
    pub has_completed_setup: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

// ============================================================================
// Single-code operations
// ============================================================================

/// Result of invalidate and delete-one
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct CodeOperationResponse {
    /// Absent when the server did not recognise the code at all
    pub success: Option<bool>,
    pub operation_success: bool,
    pub alert_text: Option<String>,
    pub message: Option<String>,
}

/// Result of email and delete-all
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct MessageResponse {
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl MessageResponse {
    /// Message if present, otherwise the error text
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

// ============================================================================
// Download
// ============================================================================

/// A file returned by the download endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// The server's own success flag for the download
    pub success: bool,
}

impl DownloadedFile {
    /// Name used when the response does not carry one
    pub const DEFAULT_FILENAME: &'static str = "downloaded_file";

    pub fn new(filename: impl Into<String>, bytes: Vec<u8>, success: bool) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            success,
        }
    }
}

// ============================================================================
// Setup verification
// ============================================================================

/// One check reported by the verification endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationLine {
    pub key: String,
    pub text: String,
}

/// Result of verify-setup, with check lines in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyResponse {
    pub success: bool,
    pub failure: bool,
    pub lines: Vec<VerificationLine>,
}

impl VerifyResponse {
    /// Build from the raw JSON object.
    ///
    /// Object order is preserved by `serde_json`'s `preserve_order`, so the
    /// lines come out in the order the server wrote them. Returns `None` for
    /// non-object bodies.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let flag = |key: &str| object.get(key).and_then(Value::as_bool).unwrap_or(false);

        let lines = object
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "SUCCESS" | "FAILURE"))
            .map(|(key, value)| VerificationLine {
                key: key.clone(),
                text: match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                },
            })
            .collect();

        Some(Self {
            success: flag("SUCCESS"),
            // A body without the flag counts as a failed verification
            failure: object.get("FAILURE").and_then(Value::as_bool).unwrap_or(true),
            lines,
        })
    }

    pub fn passed(&self) -> bool {
        self.success && !self.failure
    }
}
