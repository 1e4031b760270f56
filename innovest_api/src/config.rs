use std::env;

use reqwest::Url;

use crate::error::{ApiError, Result};

pub const API_URL_ENV: &str = "INNOVEST_API_URL";
pub const ANON_KEY_ENV: &str = "INNOVEST_ANON_KEY";

/// Local supabase-style dev stack.
pub const DEFAULT_API_URL: &str = "http://localhost:54321";

/// Where the hosted service lives and the publishable key used to reach it.
/// The same base URL serves the table API (`/rest/v1`), the auth API
/// (`/auth/v1`) and the realtime socket (`/realtime/v1`).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    base_url: String,
    anon_key: String,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
        let base_url = sanitize_base_url(base_url.into())?;
        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(ApiError::InvalidConfig("anon key is empty".into()));
        }
        Ok(Self { base_url, anon_key })
    }

    /// Reads `INNOVEST_API_URL` (falling back to the local dev stack) and
    /// `INNOVEST_ANON_KEY` (required; the key has no sensible default).
    pub fn from_env() -> Result<Self> {
        let base_url = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let anon_key = env::var(ANON_KEY_ENV)
            .map_err(|_| ApiError::InvalidConfig(format!("{ANON_KEY_ENV} is not set")))?;
        Self::new(base_url, anon_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Websocket endpoint for change subscriptions. The key travels in the
    /// query string because the socket handshake carries no headers.
    pub fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0", self.anon_key)
    }
}

fn sanitize_base_url(mut base: String) -> Result<String> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("https://{base}");
    }
    // Remove trailing slash for consistency
    while base.ends_with('/') {
        base.pop();
    }
    // Validate once
    Url::parse(&base).map_err(|err| ApiError::InvalidConfig(format!("invalid base URL: {err}")))?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitize_defaults_to_https_and_trims_slashes() {
        let config = ServiceConfig::new("abc.innovest.dev//", "anon-key").unwrap();
        assert_eq!(config.base_url(), "https://abc.innovest.dev");
    }

    #[test]
    fn sanitize_keeps_explicit_http() {
        let config = ServiceConfig::new("http://localhost:54321/", "anon-key").unwrap();
        assert_eq!(config.base_url(), "http://localhost:54321");
    }

    #[test]
    fn rejects_empty_anon_key() {
        assert!(ServiceConfig::new("https://abc.innovest.dev", " ").is_err());
    }

    #[test]
    fn endpoint_urls() {
        let config = ServiceConfig::new("https://abc.innovest.dev", "anon-key").unwrap();
        assert_eq!(
            config.rest_url("posts"),
            "https://abc.innovest.dev/rest/v1/posts"
        );
        assert_eq!(
            config.auth_url("token?grant_type=password"),
            "https://abc.innovest.dev/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            config.realtime_url(),
            "wss://abc.innovest.dev/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );
    }
}
