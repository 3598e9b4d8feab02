//! Console configuration
//!
//! Defaults, then an optional `.toml` / `.json` file, then `CODEKEEP_*`
//! environment variables, then `validate()`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::ActionId;
use crate::errors::AppError;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "CODEKEEP_";

/// Endpoint paths, relative to `base_url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub generate_with_expiry: String,
    pub generate_without_expiry: String,
    pub regenerate: String,
    pub invalidate: String,
    pub delete_one: String,
    pub delete_all: String,
    pub email: String,
    pub download: String,
    pub verify_setup: String,
    pub viewed: String,
    pub notifications: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        let path = |tail: &str| format!("/auth/recovery-codes/{tail}/");
        Self {
            generate_with_expiry: path("generate-with-expiry"),
            generate_without_expiry: path("generate-without-expiry"),
            regenerate: path("regenerate"),
            invalidate: path("invalidate-codes"),
            delete_one: path("delete-codes"),
            delete_all: path("mark-batch-as-deleted"),
            email: path("email"),
            download: path("download-codes"),
            verify_setup: path("verify-setup"),
            viewed: path("viewed"),
            notifications: path("sse/notifications"),
        }
    }
}

impl Endpoints {
    /// Endpoint an action posts to
    pub fn for_action(&self, action: ActionId) -> &str {
        match action {
            ActionId::GenerateWithExpiry => &self.generate_with_expiry,
            ActionId::GenerateWithoutExpiry => &self.generate_without_expiry,
            ActionId::Regenerate => &self.regenerate,
            ActionId::Invalidate => &self.invalidate,
            ActionId::DeleteOne => &self.delete_one,
            ActionId::DeleteAll => &self.delete_all,
            ActionId::Email => &self.email,
            ActionId::Download => &self.download,
            ActionId::VerifySetup => &self.verify_setup,
        }
    }

    fn all(&self) -> [(&'static str, &str); 11] {
        [
            ("generate_with_expiry", self.generate_with_expiry.as_str()),
            ("generate_without_expiry", self.generate_without_expiry.as_str()),
            ("regenerate", self.regenerate.as_str()),
            ("invalidate", self.invalidate.as_str()),
            ("delete_one", self.delete_one.as_str()),
            ("delete_all", self.delete_all.as_str()),
            ("email", self.email.as_str()),
            ("download", self.download.as_str()),
            ("verify_setup", self.verify_setup.as_str()),
            ("viewed", self.viewed.as_str()),
            ("notifications", self.notifications.as_str()),
        ]
    }
}

/// Runtime settings for a console session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Server origin, e.g. `https://example.com`
    pub base_url: String,
    /// Batches kept in the history window (0 hides history)
    pub history_capacity: usize,
    pub toast_display_ms: u64,
    pub toast_stagger_ms: u64,
    /// Pending toasts kept before the oldest is dropped (0 = unbounded)
    pub max_pending_toasts: usize,
    pub highlight_ms: u64,
    /// How long the generation flag outlives a failed generation
    pub generation_grace_ms: u64,
    pub request_timeout_secs: u64,
    pub endpoints: Endpoints,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            history_capacity: 5,
            toast_display_ms: 3000,
            toast_stagger_ms: 500,
            max_pending_toasts: 32,
            highlight_ms: 6000,
            generation_grace_ms: 5000,
            request_timeout_secs: 30,
            endpoints: Endpoints::default(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a `.toml` or `.json` file
    pub fn load_from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read config file: {e}")))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| AppError::config(format!("Invalid TOML: {e}"))),
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| AppError::config(format!("Invalid JSON: {e}"))),
            _ => Err(AppError::config("Unsupported file format")),
        }
    }

    /// Merge with `CODEKEEP_*` environment variables
    pub fn merge_with_env(&mut self) -> Result<(), AppError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Merge with `CODEKEEP_*` pairs from any source
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let name = name.to_ascii_lowercase();
            match name.as_str() {
                "base_url"
                | "history_capacity"
                | "toast_display_ms"
                | "toast_stagger_ms"
                | "generation_grace_ms"
                | "request_timeout_secs" => self.set_from_string(&name, &value)?,
                _ => tracing::debug!(%key, "ignoring unknown environment override"),
            }
        }
        Ok(())
    }

    /// Set a configuration value from a string (for CLI and env parsing)
    pub fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        fn number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError> {
            value
                .trim()
                .parse()
                .map_err(|_| AppError::config(format!("Invalid number for {key}: '{value}'")))
        }

        match key.replace('-', "_").as_str() {
            "base_url" => self.base_url = value.trim_end_matches('/').to_string(),
            "history_capacity" => self.history_capacity = number(key, value)?,
            "toast_display_ms" => self.toast_display_ms = number(key, value)?,
            "toast_stagger_ms" => self.toast_stagger_ms = number(key, value)?,
            "max_pending_toasts" => self.max_pending_toasts = number(key, value)?,
            "highlight_ms" => self.highlight_ms = number(key, value)?,
            "generation_grace_ms" => self.generation_grace_ms = number(key, value)?,
            "request_timeout_secs" => self.request_timeout_secs = number(key, value)?,
            _ => {
                return Err(AppError::config(format!(
                    "Unknown configuration key: {key}"
                )))
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AppError> {
        if self.base_url.trim().is_empty() {
            return Err(AppError::config("base_url cannot be empty"));
        }
        if self.toast_display_ms == 0 {
            return Err(AppError::config("toast_display_ms cannot be 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::config("request_timeout_secs cannot be 0"));
        }
        for (name, path) in self.endpoints.all() {
            if !path.starts_with('/') {
                return Err(AppError::config(format!(
                    "endpoint {name} must start with '/' (got '{path}')"
                )));
            }
        }
        Ok(())
    }

    /// Full URL for an endpoint path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn generation_grace(&self) -> Duration {
        Duration::from_millis(self.generation_grace_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = ConsoleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history_capacity, 5);
        assert_eq!(
            config.endpoints.for_action(ActionId::DeleteAll),
            "/auth/recovery-codes/mark-batch-as-deleted/"
        );
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "base_url = \"https://codes.example\"\nhistory_capacity = 3\n\n[endpoints]\nemail = \"/custom/email/\""
        )
        .unwrap();

        let config = ConsoleConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "https://codes.example");
        assert_eq!(config.history_capacity, 3);
        assert_eq!(config.endpoints.email, "/custom/email/");
        assert_eq!(config.endpoints.download, Endpoints::default().download);
        assert_eq!(config.toast_display_ms, 3000);
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{\"generation_grace_ms\": 100}}").unwrap();
        let config = ConsoleConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.generation_grace(), Duration::from_millis(100));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        assert!(matches!(
            ConsoleConfig::load_from_file(file.path()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConsoleConfig::default();
        config
            .merge_with_vars([
                ("CODEKEEP_BASE_URL".to_string(), "https://x.test/".to_string()),
                ("CODEKEEP_HISTORY_CAPACITY".to_string(), "0".to_string()),
                ("CODEKEEP_UNKNOWN".to_string(), "1".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ])
            .unwrap();
        assert_eq!(config.base_url, "https://x.test");
        assert_eq!(config.history_capacity, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_env_number() {
        let mut config = ConsoleConfig::default();
        let result = config.merge_with_vars([(
            "CODEKEEP_TOAST_DISPLAY_MS".to_string(),
            "soon".to_string(),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_relative_endpoint() {
        let mut config = ConsoleConfig::default();
        config.endpoints.viewed = "viewed/".to_string();
        assert!(config.validate().is_err());

        let mut config = ConsoleConfig::default();
        config.toast_display_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_join() {
        let config = ConsoleConfig::default();
        assert_eq!(
            config.url("/auth/recovery-codes/email/"),
            "http://127.0.0.1:8000/auth/recovery-codes/email/"
        );
    }
}
