use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// Where the official borang template PDFs live.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateLocation {
    Dir(PathBuf),
    Http(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub templates: TemplateLocation,
    /// Base URL under which uploaded visit images are publicly readable.
    pub storage_public_url: Option<String>,
    pub fetch_timeout: Duration,
    pub fetch_retries: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let templates = match non_empty("TEMPLATE_BASE_URL") {
            Some(url) => TemplateLocation::Http(url),
            None => TemplateLocation::Dir(PathBuf::from(non_empty("TEMPLATE_DIR").unwrap_or_else(|| "./public".into()))),
        };

        Ok(Self {
            port: parse_or("PORT", non_empty("PORT"), 8080)?,
            templates,
            storage_public_url: non_empty("STORAGE_PUBLIC_URL"),
            fetch_timeout: Duration::from_secs(parse_or("FETCH_TIMEOUT_SECS", non_empty("FETCH_TIMEOUT_SECS"), 20)?),
            fetch_retries: parse_or("FETCH_RETRIES", non_empty("FETCH_RETRIES"), 1)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::InvalidNumber { name, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.templates, TemplateLocation::Dir(PathBuf::from("./public")));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(20));
        assert_eq!(cfg.fetch_retries, 1);
        assert!(cfg.storage_public_url.is_none());
    }

    #[test]
    fn base_url_takes_precedence_over_dir() {
        let cfg = config_from(&[("TEMPLATE_DIR", "/srv/borang"), ("TEMPLATE_BASE_URL", "https://sip.example/borang")]).unwrap();
        assert_eq!(cfg.templates, TemplateLocation::Http("https://sip.example/borang".into()));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = config_from(&[("FETCH_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_eq!(err.to_string(), "FETCH_TIMEOUT_SECS must be a number, got 'soon'");
    }
}
