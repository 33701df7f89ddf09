//! Remote service endpoint configuration.
//!
//! The base URL resolves flag → environment → built-in default, so a shell
//! alias or a systemd unit can point the client at a staging instance
//! without rebuilding.

use std::time::Duration;

/// Compiled-in service endpoint, used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Environment variable consulted when no `--api-url` flag is given.
pub const BASE_URL_ENV: &str = "TAREAS_API_URL";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Overall per-request deadline; a dead link fails fast instead of
    /// hanging the command.
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        ApiConfig {
            base_url,
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(15),
        }
    }

    /// Flag beats environment beats the built-in default.
    pub fn resolve(flag: Option<String>) -> Self {
        let url = flag
            .or_else(|| {
                std::env::var(BASE_URL_ENV)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
            })
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        ApiConfig::new(url)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_trimmed() {
        let config = ApiConfig::new("http://tareas.hospital.local/");
        assert_eq!(config.base_url, "http://tareas.hospital.local");
        let config = ApiConfig::new("http://tareas.hospital.local//");
        assert_eq!(config.base_url, "http://tareas.hospital.local");
    }

    #[test]
    fn flag_beats_default() {
        let config = ApiConfig::resolve(Some("http://10.0.0.5:3000".to_string()));
        assert_eq!(config.base_url, "http://10.0.0.5:3000");
    }

    #[test]
    fn builder_overrides_timeout() {
        let config = ApiConfig::new(DEFAULT_BASE_URL).with_timeout(Duration::from_secs(30));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }
}
