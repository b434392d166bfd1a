//! Home Assistant Ingress base path resolution.
//!
//! Home Assistant exposes add-on web UIs under a per-install prefix such as
//! `/api/hassio_ingress/<token>/`. Routes, static assets and the browser
//! code must all agree on it, so it is resolved exactly once at startup.
//!
//! Resolution order, first usable value wins:
//!
//! 1. `ingress_entry` from the config (file or `HOMEPANTRY_INGRESS_ENTRY`)
//! 2. `SUPERVISOR_INGRESS_ENTRY`, unless it is a bare `/`
//! 3. the Supervisor API (`GET /addons/self/info`), if `SUPERVISOR_TOKEN` is set
//! 4. `/`

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

const SUPERVISOR_TIMEOUT: Duration = Duration::from_secs(5);

/// A normalized URL prefix that always starts and ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePath(String);

impl BasePath {
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Normalizes a raw prefix.
    ///
    /// Returns `None` for characters that cannot appear in a route prefix.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Some(Self::root());
        }
        let valid = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '~'));
        if !valid || trimmed.split('/').any(|s| s.is_empty() || s == "..") {
            return None;
        }
        Some(Self(format!("/{}/", trimmed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Joins a relative route onto the prefix.
    pub fn route(&self, suffix: &str) -> String {
        format!("{}{}", self.0, suffix.trim_start_matches('/'))
    }

    /// Strips the prefix from a request path.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.0.as_str())
    }
}

impl Default for BasePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for BasePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a resolved base path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasePathSource {
    Config,
    SupervisorEnv,
    SupervisorApi,
    Default,
}

impl fmt::Display for BasePathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasePathSource::Config => write!(f, "config"),
            BasePathSource::SupervisorEnv => write!(f, "SUPERVISOR_INGRESS_ENTRY"),
            BasePathSource::SupervisorApi => write!(f, "supervisor API"),
            BasePathSource::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Error)]
enum SupervisorError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("response has no ingress_entry")]
    MissingEntry,
}

#[derive(Debug, Deserialize)]
struct SupervisorResponse {
    data: Option<AddonInfo>,
}

#[derive(Debug, Deserialize)]
struct AddonInfo {
    ingress_entry: Option<String>,
}

/// Inputs for base path resolution.
#[derive(Debug, Clone, Default)]
pub struct IngressSettings {
    /// Explicitly configured prefix
    pub explicit: Option<String>,
    /// Value of `SUPERVISOR_INGRESS_ENTRY`
    pub supervisor_entry: Option<String>,
    /// Value of `SUPERVISOR_TOKEN`
    pub supervisor_token: Option<String>,
    /// Supervisor API base URL
    pub supervisor_url: String,
}

impl IngressSettings {
    /// Collects settings from the config and the Supervisor environment.
    pub fn from_config(config: &Config) -> Self {
        Self {
            explicit: config.ingress_entry.clone(),
            supervisor_entry: std::env::var("SUPERVISOR_INGRESS_ENTRY").ok(),
            supervisor_token: std::env::var("SUPERVISOR_TOKEN").ok(),
            supervisor_url: config.supervisor_url.clone(),
        }
    }

    /// Resolves the base path. Never fails; falls back to `/`.
    pub async fn resolve(&self) -> (BasePath, BasePathSource) {
        if let Some(raw) = &self.explicit {
            match BasePath::parse(raw) {
                Some(path) => return (path, BasePathSource::Config),
                None => tracing::warn!("Ignoring invalid configured ingress entry '{}'", raw),
            }
        }

        if let Some(raw) = &self.supervisor_entry {
            match BasePath::parse(raw) {
                Some(path) if !path.is_root() => return (path, BasePathSource::SupervisorEnv),
                Some(_) => tracing::debug!("SUPERVISOR_INGRESS_ENTRY is '/', asking the Supervisor"),
                None => tracing::warn!("Ignoring invalid SUPERVISOR_INGRESS_ENTRY '{}'", raw),
            }
        }

        if let Some(token) = &self.supervisor_token {
            match query_supervisor(&self.supervisor_url, token).await {
                Ok(raw) => match BasePath::parse(&raw) {
                    Some(path) => return (path, BasePathSource::SupervisorApi),
                    None => tracing::warn!("Supervisor returned invalid ingress entry '{}'", raw),
                },
                Err(e) => tracing::warn!("Could not query the Supervisor: {}", e),
            }
        }

        (BasePath::root(), BasePathSource::Default)
    }
}

async fn query_supervisor(base_url: &str, token: &str) -> Result<String, SupervisorError> {
    let client = reqwest::Client::builder()
        .timeout(SUPERVISOR_TIMEOUT)
        .no_proxy()
        .build()?;

    let url = format!("{}/addons/self/info", base_url.trim_end_matches('/'));
    let response: SupervisorResponse = client
        .get(url)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    response
        .data
        .and_then(|info| info.ingress_entry)
        .ok_or(SupervisorError::MissingEntry)
}

/// Inserts `window.HASS_API_BASE_PATH` into an HTML page, just before `</head>`.
///
/// Pages without a `</head>` get the script prepended.
pub fn inject_base_path(html: &str, base: &BasePath) -> String {
    let literal = Value::String(base.to_string()).to_string().replace('<', "\\u003c");
    let script = format!("<script>window.HASS_API_BASE_PATH = {};</script>", literal);

    match html.find("</head>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..pos]);
            out.push_str(&script);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{}{}", script, html),
    }
}
