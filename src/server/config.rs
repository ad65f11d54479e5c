use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_request")]
    pub log_request: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_request: default_log_request(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_request() -> bool {
    true
}

/// Where the browser lands after an OAuth callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Base URL of the frontend; callback pages live at
    /// `<callback_base_url>/<provider>/callback.html`
    #[serde(default = "default_callback_base_url")]
    pub callback_base_url: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            callback_base_url: default_callback_base_url(),
        }
    }
}

fn default_callback_base_url() -> String {
    "http://localhost:5173".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of origins
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> String {
    "*".to_string()
}

impl CorsConfig {
    /// Parsed origin list, `None` meaning any origin is allowed.
    pub fn origins(&self) -> Option<Vec<String>> {
        let raw = self.allowed_origins.trim();
        if raw == "*" || raw.is_empty() {
            return None;
        }
        Some(
            raw.split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_wildcard() {
        let cors = CorsConfig::default();
        assert!(cors.origins().is_none());
    }

    #[test]
    fn test_cors_origin_list() {
        let cors = CorsConfig {
            allowed_origins: "http://localhost:5173, https://example.com/ ,".to_string(),
        };
        assert_eq!(
            cors.origins().unwrap(),
            vec!["http://localhost:5173", "https://example.com"]
        );
    }
}
