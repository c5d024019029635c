//! Host resolution: user-supplied address -> canonical runtime base URL.
//!
//! Pure string work, never fails. Anything that does not make a usable
//! `http(s)://host[:port][/path]` falls back to the loopback default.
//! Bare hosts get `http://` because the runtime is assumed to be local; that
//! is a trust assumption, not a transport guarantee.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434";

/// Canonical base URL of the runtime: scheme + host + port, no trailing slash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeEndpoint(String);

impl RuntimeEndpoint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `path` must start with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

impl Default for RuntimeEndpoint {
    fn default() -> Self {
        RuntimeEndpoint(DEFAULT_ENDPOINT.to_string())
    }
}

impl fmt::Display for RuntimeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn resolve_host(host: Option<&str>) -> RuntimeEndpoint {
    let Some(raw) = host.map(str::trim).filter(|h| !h.is_empty()) else {
        return RuntimeEndpoint::default();
    };

    match normalize(raw) {
        Some(endpoint) => RuntimeEndpoint(endpoint),
        None => {
            tracing::warn!(host = raw, fallback = DEFAULT_ENDPOINT, "unusable runtime host, using default");
            RuntimeEndpoint::default()
        }
    }
}

fn has_http_scheme(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn normalize(raw: &str) -> Option<String> {
    if raw.chars().any(char::is_whitespace) {
        return None;
    }

    let with_scheme = if has_http_scheme(raw) {
        raw.to_string()
    } else if raw.contains("://") {
        // some other scheme
        return None;
    } else {
        format!("http://{raw}")
    };

    let trimmed = with_scheme.trim_end_matches('/');
    let url = Url::parse(trimmed).ok()?;
    if url.host_str().map_or(true, str::is_empty) {
        return None;
    }
    if url.query().is_some() || url.fragment().is_some() || !url.username().is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
