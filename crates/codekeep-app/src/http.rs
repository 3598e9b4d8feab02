//! HTTP transport for the recovery-code endpoints
//!
//! JSON bodies become [`RemoteResponse::Json`]; anything else is treated as
//! a file attachment. HTML bodies are rejected because they are almost
//! always an error page.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE};
use serde_json::Value;
use std::path::Path;

use crate::config::ConsoleConfig;
use crate::errors::{AppError, NetworkErrorCode};
use crate::runtime_bridge::{Method, RemoteChannel, RemoteRequest, RemoteResponse};
use crate::sse::SseDecoder;
use crate::views::operations::DownloadedFile;

/// Header carrying the anti-forgery token on mutating calls
pub const CSRF_HEADER: &str = "X-CSRFToken";
/// Header the download endpoint uses to flag a successful export
pub const SUCCESS_HEADER: &str = "X-Success";

/// [`RemoteChannel`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    /// No overall timeout; the notification stream stays open indefinitely
    stream_client: reqwest::Client,
    config: ConsoleConfig,
}

impl HttpRemote {
    pub fn new(config: ConsoleConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {e}")))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            stream_client,
            config,
        })
    }

    /// Open the server-sent notification stream.
    ///
    /// The stream ends when the connection closes or a chunk fails to read.
    pub async fn notifications(&self) -> Result<impl Stream<Item = String> + Send, AppError> {
        let endpoint = self.config.endpoints.notifications.clone();
        let response = self
            .stream_client
            .get(self.config.url(&endpoint))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| transport_error(&endpoint, &e))?;
        let response = ensure_success(&endpoint, response).await?;

        let mut decoder = SseDecoder::new();
        Ok(response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => decoder.push(&bytes),
                Err(err) => {
                    tracing::warn!(error = %err, "notification stream interrupted");
                    Vec::new()
                }
            })
            .flat_map(futures::stream::iter))
    }
}

#[async_trait]
impl RemoteChannel for HttpRemote {
    async fn call(&self, request: RemoteRequest) -> Result<RemoteResponse, AppError> {
        request.validate()?;
        let endpoint = request.endpoint.as_str();
        let url = self.config.url(endpoint);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if let Some(token) = &request.anti_forgery_token {
            builder = builder.header(CSRF_HEADER, token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, %url, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(endpoint, &e))?;
        let response = ensure_success(endpoint, response).await?;

        let headers = response.headers().clone();
        let content_type = header_str(&headers, CONTENT_TYPE.as_str()).unwrap_or_default();

        if content_type.contains("application/json") {
            let value = response
                .json::<Value>()
                .await
                .map_err(|e| AppError::decode(endpoint, e.to_string()))?;
            return Ok(RemoteResponse::Json(value));
        }
        if content_type.contains("text/html") {
            return Err(AppError::decode(endpoint, "unexpected HTML response"));
        }

        let disposition = header_str(&headers, CONTENT_DISPOSITION.as_str());
        if disposition.is_none() {
            tracing::warn!(%endpoint, "file response without Content-Disposition");
        }
        let success = disposition.is_some()
            && header_str(&headers, SUCCESS_HEADER).is_some_and(|value| value == "true");
        let filename = filename_from_disposition(disposition);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(endpoint, &e))?;

        Ok(RemoteResponse::File(DownloadedFile::new(
            filename,
            bytes.to_vec(),
            success,
        )))
    }
}

async fn ensure_success(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(AppError::remote(endpoint, status.as_u16(), message))
}

/// `ERROR`, then `MESSAGE`, from a JSON error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["ERROR", "MESSAGE", "error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Filename from a `Content-Disposition` value, with quotes stripped.
///
/// Only the final path component is kept; `.` and `..` fall back to the
/// default name.
fn filename_from_disposition(disposition: Option<&str>) -> String {
    disposition
        .and_then(|value| value.split_once("filename="))
        .map(|(_, name)| name.split(';').next().unwrap_or(name).replace(['"', '\''], ""))
        .and_then(|name| safe_file_name(name.trim()))
        .unwrap_or_else(|| DownloadedFile::DEFAULT_FILENAME.to_string())
}

fn safe_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?;
    let component = Path::new(last).file_name()?.to_str()?;
    if component.is_empty() || component == ".." || component == "." {
        return None;
    }
    Some(component.to_string())
}

fn transport_error(endpoint: &str, err: &reqwest::Error) -> AppError {
    let code = if err.is_timeout() {
        NetworkErrorCode::Timeout
    } else if err.is_connect() {
        NetworkErrorCode::ConnectionRefused
    } else if err.is_body() || err.is_decode() {
        NetworkErrorCode::Body
    } else {
        NetworkErrorCode::Other
    };
    tracing::debug!(%endpoint, ?code, error = %err, "transport failure");
    AppError::network(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_disposition() {
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"codes.txt\"")),
            "codes.txt"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=codes.pdf; size=10")),
            "codes.pdf"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment")),
            DownloadedFile::DEFAULT_FILENAME
        );
        assert_eq!(filename_from_disposition(None), DownloadedFile::DEFAULT_FILENAME);
    }

    #[test]
    fn test_filename_from_disposition_strips_directories() {
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"../../home/user/.bashrc\"")),
            ".bashrc"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=/etc/cron.d/x")),
            "x"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"..\\..\\codes.txt\"")),
            "codes.txt"
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"..\"")),
            DownloadedFile::DEFAULT_FILENAME
        );
        assert_eq!(
            filename_from_disposition(Some("attachment; filename=\"reports/\"")),
            DownloadedFile::DEFAULT_FILENAME
        );
    }

    #[test]
    fn test_error_message_prefers_error_key() {
        assert_eq!(
            error_message(r#"{"MESSAGE": "m", "ERROR": "e"}"#).as_deref(),
            Some("e")
        );
        assert_eq!(error_message(r#"{"MESSAGE": "m"}"#).as_deref(), Some("m"));
        assert_eq!(error_message("<html>"), None);
    }

    #[tokio::test]
    async fn test_post_without_token_never_leaves_the_process() {
        let remote = HttpRemote::new(ConsoleConfig::default()).unwrap();
        let request = RemoteRequest::post("/auth/recovery-codes/email/", serde_json::json!({}));
        assert!(matches!(
            remote.call(request).await,
            Err(AppError::MissingToken { .. })
        ));
    }
}
