//! Configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RESET_NOTICE_SECS: u64 = 3;
pub const DEFAULT_SAVED_TABLE: &str = "saved_posts";
pub const DEFAULT_DELETE_ACCOUNT_RPC: &str = "delete_user";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing configuration: env var {var} not set")]
    Missing { var: &'static str },
    #[error("placeholder service URL in {var}")]
    Placeholder { var: &'static str },
    #[error("invalid service URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

/// Connection settings for the hosted identity & storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub url: String,
    pub anon_key: String,
    pub saved_table: String,
    pub delete_account_rpc: String,
    pub session_file: Option<PathBuf>,
    pub timeouts: Timeouts,
}

impl ServiceConfig {
    /// Build typed service config from environment variables.
    ///
    /// Required:
    /// - `SUPABASE_URL` (values containing `placeholder` count as missing)
    /// - `SUPABASE_ANON_KEY`
    ///
    /// Optional:
    /// - `BLOG_SAVED_TABLE`: default `saved_posts`
    /// - `BLOG_DELETE_ACCOUNT_RPC`: default `delete_user`
    /// - `BLOG_SESSION_FILE`: persist the session as JSON at this path
    /// - `BLOG_REQUEST_TIMEOUT_SECS`: default 15
    /// - `BLOG_CONNECT_TIMEOUT_SECS`: default 10
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = parse_service_url(lookup("SUPABASE_URL").as_deref())?;
        let anon_key = non_empty(lookup("SUPABASE_ANON_KEY")).ok_or(ConfigError::Missing { var: "SUPABASE_ANON_KEY" })?;

        let saved_table = non_empty(lookup("BLOG_SAVED_TABLE")).unwrap_or_else(|| DEFAULT_SAVED_TABLE.to_owned());
        let delete_account_rpc =
            non_empty(lookup("BLOG_DELETE_ACCOUNT_RPC")).unwrap_or_else(|| DEFAULT_DELETE_ACCOUNT_RPC.to_owned());
        let session_file = non_empty(lookup("BLOG_SESSION_FILE")).map(PathBuf::from);
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("BLOG_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("BLOG_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { url, anon_key, saved_table, delete_account_rpc, session_file, timeouts })
    }
}

/// Front-end settings that do not depend on the service being reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Where confirmation and recovery emails send the user back to.
    pub site_url: String,
    /// How long the password-reset notice stays up before returning to sign-in.
    pub reset_notice: Duration,
    /// Upper bound on a single remote call made by the front-end controllers.
    pub call_timeout: Duration,
}

impl SiteConfig {
    /// Read `BLOG_SITE_URL`, `BLOG_RESET_NOTICE_SECS`, and
    /// `BLOG_REQUEST_TIMEOUT_SECS` (shared with the HTTP client).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let site_url = non_empty(lookup("BLOG_SITE_URL"))
            .unwrap_or_else(|| DEFAULT_SITE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let reset_notice = Duration::from_secs(parse_u64(lookup("BLOG_RESET_NOTICE_SECS"), DEFAULT_RESET_NOTICE_SECS));
        let call_timeout =
            Duration::from_secs(parse_u64(lookup("BLOG_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS));
        Self { site_url, reset_notice, call_timeout }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default)
}

fn parse_service_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let var = "SUPABASE_URL";
    let url = raw.map(str::trim).filter(|v| !v.is_empty()).ok_or(ConfigError::Missing { var })?;
    if url.contains("placeholder") {
        return Err(ConfigError::Placeholder { var });
    }
    let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl(format!("{url}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!("{url}: unsupported scheme")));
    }
    Ok(url.trim_end_matches('/').to_owned())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
