//! Client configuration, normally read from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const ENV_API_URL: &str = "ECOWISER_API_URL";
pub const ENV_LOGIN_ROUTE: &str = "ECOWISER_LOGIN_ROUTE";
pub const ENV_SESSION_FILE: &str = "ECOWISER_SESSION_FILE";
pub const ENV_SILENT_PROBES: &str = "ECOWISER_SILENT_PROBES";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "ECOWISER_HTTP_TIMEOUT_SECS";

pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
/// Path fragment of the "fetch current user" probe used while bootstrapping.
pub const CURRENT_USER_PROBE: &str = "/users/self/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    api_url: Url,
    login_route: String,
    session_file: Option<PathBuf>,
    silent_probes: Vec<String>,
    timeout: Duration,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            session_file: None,
            silent_probes: vec![CURRENT_USER_PROBE.to_string()],
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = get(ENV_API_URL).ok_or(ConfigError::Missing(ENV_API_URL))?;
        let mut config = Self::new(&api_url)?;

        if let Some(route) = get(ENV_LOGIN_ROUTE) {
            config = config.with_login_route(route);
        }
        if let Some(path) = get(ENV_SESSION_FILE) {
            config = config.with_session_file(path);
        }
        if let Some(probes) = get(ENV_SILENT_PROBES) {
            config.silent_probes = probes
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(secs) = get(ENV_HTTP_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|e| ConfigError::Invalid {
                key: ENV_HTTP_TIMEOUT_SECS,
                reason: format!("{e}"),
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Add a path fragment whose failures must not notify the user.
    pub fn with_silent_probe(mut self, fragment: impl Into<String>) -> Self {
        self.silent_probes.push(fragment.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Base URL without a trailing slash; request paths are appended to it.
    pub fn base_url(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    pub fn session_file(&self) -> Option<&PathBuf> {
        self.session_file.as_ref()
    }

    pub fn silent_probes(&self) -> &[String] {
        &self.silent_probes
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        key: ENV_API_URL,
        reason: format!("{e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            key: ENV_API_URL,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
