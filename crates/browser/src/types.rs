//! Browser launch configuration.

use serde::{Deserialize, Serialize};

/// Browser configuration for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    /// Whether to run in headless mode.
    pub headless: bool,
    /// Default viewport width.
    pub viewport_width: u32,
    /// Default viewport height.
    pub viewport_height: u32,
    /// Default navigation timeout in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            viewport_width: 1600,
            viewport_height: 1200,
            navigation_timeout_ms: 60_000,
            chrome_args: Vec::new(),
        }
    }
}

impl From<&citawatch_config::schema::BrowserConfig> for BrowserConfig {
    fn from(cfg: &citawatch_config::schema::BrowserConfig) -> Self {
        Self {
            chrome_path: cfg.chrome_path.clone(),
            headless: cfg.headless,
            viewport_width: cfg.viewport_width,
            viewport_height: cfg.viewport_height,
            navigation_timeout_ms: cfg.navigation_timeout_ms,
            chrome_args: cfg.chrome_args.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = BrowserConfig::default();
        assert!(config.headless);
        assert!(config.chrome_path.is_none());
        assert_eq!(config.navigation_timeout_ms, 60_000);
    }

    #[test]
    fn from_schema_config() {
        let schema = citawatch_config::schema::BrowserConfig {
            chrome_path: Some("/opt/chromium".into()),
            headless: false,
            ..Default::default()
        };
        let config = BrowserConfig::from(&schema);
        assert_eq!(config.chrome_path.as_deref(), Some("/opt/chromium"));
        assert!(!config.headless);
        assert_eq!(config.viewport_width, schema.viewport_width);
    }
}
