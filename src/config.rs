use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_API_BASE_URL: &str = "PLANTRA_API_BASE_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "PLANTRA_HTTP_TIMEOUT_SECS";
pub const ENV_LOGIN_PATH: &str = "PLANTRA_LOGIN_PATH";
pub const ENV_SESSION_FILE: &str = "PLANTRA_SESSION_FILE";
pub const ENV_SESSION_BACKEND: &str = "PLANTRA_SESSION_BACKEND";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_SESSION_FILE: &str = "plantra-session.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid request path {0:?}")]
    InvalidPath(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    File,
    Keyring,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    pub timeout: Duration,
    pub login_path: String,
    pub session_file: PathBuf,
    pub session_backend: SessionBackend,
}

fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "empty".to_string(),
        });
    }
    // Without the trailing slash `Url::join` would replace the last segment.
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "expected an http(s) url".to_string(),
        });
    }
    Ok(url)
}

fn read_env(key: &'static str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        tracing::debug!("{key} is empty, using default");
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            session_backend: SessionBackend::File,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = read_env(ENV_API_BASE_URL).ok_or(ConfigError::Missing(ENV_API_BASE_URL))?;
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = read_env(ENV_HTTP_TIMEOUT_SECS) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    key: ENV_HTTP_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        if let Some(path) = read_env(ENV_LOGIN_PATH) {
            config = config.with_login_path(path);
        }

        if let Some(path) = read_env(ENV_SESSION_FILE) {
            config.session_file = PathBuf::from(path);
        }

        if let Some(raw) = read_env(ENV_SESSION_BACKEND) {
            config.session_backend = match raw.to_ascii_lowercase().as_str() {
                "file" => SessionBackend::File,
                "keyring" => SessionBackend::Keyring,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_SESSION_BACKEND,
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` against the base url. A leading `/` is ignored so the
    /// path never escapes the base url's own prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        let relative = path.trim().trim_start_matches('/');
        if relative.contains("://") {
            return Err(ConfigError::InvalidPath(path.to_string()));
        }
        self.base_url
            .join(relative)
            .map_err(|_| ConfigError::InvalidPath(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = ClientConfig::new("https://api.example.com/v1").unwrap();
        assert_eq!(config.base_url().as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn endpoint_ignores_leading_slash() {
        let config = ClientConfig::new("https://api.example.com/api/").unwrap();
        assert_eq!(
            config.endpoint("/events/").unwrap().as_str(),
            "https://api.example.com/api/events/"
        );
        assert_eq!(
            config.endpoint("accounts/token/refresh/").unwrap().as_str(),
            "https://api.example.com/api/accounts/token/refresh/"
        );
    }

    #[test]
    fn endpoint_rejects_absolute_urls() {
        let config = ClientConfig::new("https://api.example.com/").unwrap();
        assert!(matches!(
            config.endpoint("https://evil.example.com/steal"),
            Err(ConfigError::InvalidPath(_))
        ));
    }

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(ClientConfig::new("").is_err());
        assert!(ClientConfig::new("ftp://files.example.com/").is_err());
        assert!(ClientConfig::new("not a url").is_err());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ClientConfig::new("http://localhost:8000/")
            .unwrap()
            .with_timeout(Duration::from_secs(3))
            .with_login_path("/signin");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.login_path, "/signin");
    }

    #[test]
    fn defaults_match_dashboard() {
        let config = ClientConfig::new("http://localhost:8000/").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.session_backend, SessionBackend::File);
    }
}
