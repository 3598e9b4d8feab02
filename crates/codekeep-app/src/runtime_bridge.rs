//! # RuntimeBridge: Abstract Remote Operations
//!
//! This module defines the `RemoteChannel` and `TokenSource` traits, which
//! abstract everything that needs the network. This keeps `codekeep-app` a
//! pure console core: the `http` feature supplies the reqwest adapter, tests
//! supply scripted mocks.
//!
//! ## Design
//!
//! ```text
//! codekeep-app (pure)       adapter (http / testkit)
//! ┌─────────────────┐      ┌──────────────────┐
//! │ RecoveryConsole │      │ HttpRemote       │
//! │  ┌────────────┐ │      │   implements     │
//! │  │RemoteChannel│◄──────│   RemoteChannel  │
//! │  └────────────┘ │      │                  │
//! └─────────────────┘      └──────────────────┘
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::errors::AppError;
use crate::views::operations::DownloadedFile;

/// HTTP method of a remote request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// One call to a recovery-code endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub endpoint: String,
    pub method: Method,
    pub body: Option<Value>,
    pub anti_forgery_token: Option<String>,
}

impl RemoteRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Get,
            body: None,
            anti_forgery_token: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::Post,
            body: Some(body),
            anti_forgery_token: None,
        }
    }

    /// Attach the anti-forgery token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.anti_forgery_token = Some(token.into());
        self
    }

    /// Reject malformed requests before they reach the transport.
    ///
    /// A POST must carry a JSON object body and an anti-forgery token.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.method == Method::Post {
            match &self.body {
                Some(Value::Object(_)) => {}
                Some(_) => {
                    return Err(AppError::request(
                        &self.endpoint,
                        "POST body must be a JSON object",
                    ))
                }
                None => return Err(AppError::request(&self.endpoint, "POST requires a body")),
            }
            if self.anti_forgery_token.as_deref().map_or(true, str::is_empty) {
                return Err(AppError::MissingToken {
                    endpoint: self.endpoint.clone(),
                });
            }
        }
        Ok(())
    }
}

/// What an endpoint answered with
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteResponse {
    /// A JSON document
    Json(Value),
    /// A file attachment
    File(DownloadedFile),
}

impl RemoteResponse {
    /// The JSON body, or a decode error naming `endpoint`
    pub fn into_json(self, endpoint: &str) -> Result<Value, AppError> {
        match self {
            Self::Json(value) => Ok(value),
            Self::File(file) => Err(AppError::decode(
                endpoint,
                format!("expected JSON, got file '{}'", file.filename),
            )),
        }
    }
}

/// Transport to the recovery-code endpoints.
///
/// Implementations return `AppError::Remote` for non-2xx statuses so the
/// orchestrator can tell transport failures from workflow failures.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    async fn call(&self, request: RemoteRequest) -> Result<RemoteResponse, AppError>;
}

/// Source of the anti-forgery token for mutating calls
pub trait TokenSource: Send + Sync {
    fn anti_forgery_token(&self) -> Option<String>;
}
