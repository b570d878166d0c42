//! Client configuration loaded from environment variables.
//!
//! All settings have defaults suitable for a local development backend.

use std::time::Duration;

use clubhouse_shared::constants::{DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT_SECS};
use clubhouse_shared::UserId;

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the club REST API, without trailing slash.
    /// Env: `CLUBHOUSE_API_URL`
    /// Default: `http://localhost:3000/api`
    pub api_url: String,

    /// Bearer token sent with every request. A leading `Bearer ` is
    /// stripped.
    /// Env: `CLUBHOUSE_AUTH_TOKEN`
    /// Default: none (unauthenticated).
    pub auth_token: Option<String>,

    /// Id of the signed-in user whose inbox is built.
    /// Env: `CLUBHOUSE_VIEWER_ID`
    /// Default: none; the binary refuses to start without it.
    pub viewer_id: Option<UserId>,

    /// Per-request timeout.
    /// Env: `CLUBHOUSE_HTTP_TIMEOUT_SECS`
    /// Default: 15 seconds.
    pub http_timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("viewer_id", &self.viewer_id)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            viewer_id: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("CLUBHOUSE_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                tracing::warn!("Empty CLUBHOUSE_API_URL, using default");
            } else {
                config.api_url = url.to_string();
            }
        }

        if let Some(raw) = lookup("CLUBHOUSE_AUTH_TOKEN") {
            config.auth_token = normalize_token(&raw);
        }

        if let Some(val) = lookup("CLUBHOUSE_VIEWER_ID") {
            match val.trim().parse::<i64>() {
                Ok(id) => config.viewer_id = Some(UserId(id)),
                Err(e) => {
                    tracing::warn!(value = %val, error = %e, "Invalid CLUBHOUSE_VIEWER_ID, ignoring");
                }
            }
        }

        if let Some(val) = lookup("CLUBHOUSE_HTTP_TIMEOUT_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %val, "Invalid CLUBHOUSE_HTTP_TIMEOUT_SECS, using default");
                }
            }
        }

        config
    }
}

/// Strip an optional `Bearer ` prefix; empty tokens become `None`.
fn normalize_token(raw: &str) -> Option<String> {
    let token = raw.trim_start();
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "http://localhost:3000/api");
        assert!(config.auth_token.is_none());
        assert!(config.viewer_id.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CLUBHOUSE_API_URL", "https://club.example/api/"),
            ("CLUBHOUSE_AUTH_TOKEN", "Bearer abc.def"),
            ("CLUBHOUSE_VIEWER_ID", "12"),
            ("CLUBHOUSE_HTTP_TIMEOUT_SECS", "30"),
        ]));
        assert_eq!(config.api_url, "https://club.example/api");
        assert_eq!(config.auth_token.as_deref(), Some("abc.def"));
        assert_eq!(config.viewer_id, Some(UserId(12)));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CLUBHOUSE_VIEWER_ID", "admin"),
            ("CLUBHOUSE_HTTP_TIMEOUT_SECS", "0"),
            ("CLUBHOUSE_AUTH_TOKEN", "Bearer "),
        ]));
        assert!(config.viewer_id.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(15));
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig {
            auth_token: Some("secret".into()),
            ..ClientConfig::default()
        };
        assert!(!format!("{config:?}").contains("secret"));
    }
}
