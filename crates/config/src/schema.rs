//! Config schema types (entry point, telegram destination, poll bounds,
//! browser launch options).

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Booking page the navigation starts from.
pub const DEFAULT_ENTRY_URL: &str =
    "https://www.exteriores.gob.es/Embajadas/brasilia/pt/Embajada/Paginas/CitaNacionalidadLMD.aspx";

/// Location suffix that marks arrival at the availability view.
pub const DEFAULT_TARGET_FRAGMENT: &str = "#services";

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CitawatchConfig {
    /// URL the navigation starts from.
    pub entry_url: String,
    /// URL fragment that marks the availability view.
    pub target_fragment: String,
    pub telegram: TelegramConfig,
    pub poll: PollConfig,
    pub browser: BrowserConfig,
}

impl Default for CitawatchConfig {
    fn default() -> Self {
        Self {
            entry_url: DEFAULT_ENTRY_URL.to_string(),
            target_fragment: DEFAULT_TARGET_FRAGMENT.to_string(),
            telegram: TelegramConfig::default(),
            poll: PollConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

/// Telegram destination for alerts.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather. Falls back to `TELEGRAM_BOT_TOKEN`.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
    /// Chat to alert. Falls back to `TELEGRAM_CHAT_ID`.
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            chat_id: String::new(),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Bounds for one poll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Attempts per invocation.
    pub max_attempts: u32,
    /// Lower bound of the jittered inter-attempt delay, in seconds.
    pub delay_min_secs: u64,
    /// Upper bound of the jittered inter-attempt delay, in seconds.
    pub delay_max_secs: u64,
    /// Send unreachable-target diagnostics only on the first attempt of a
    /// run, so a structurally broken flow alerts once per invocation.
    pub diagnostic_first_attempt_only: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_min_secs: 20,
            delay_max_secs: 40,
            diagnostic_first_attempt_only: true,
        }
    }
}

/// Browser launch options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path to Chrome/Chromium binary (auto-detected if not set).
    pub chrome_path: Option<String>,
    /// Whether to run in headless mode.
    pub headless: bool,
    /// Viewport width.
    pub viewport_width: u32,
    /// Viewport height.
    pub viewport_height: u32,
    /// Navigation timeout in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Additional Chrome arguments.
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

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = CitawatchConfig::default();
        assert_eq!(cfg.entry_url, DEFAULT_ENTRY_URL);
        assert_eq!(cfg.target_fragment, "#services");
        assert_eq!(cfg.poll.max_attempts, 3);
        assert!(cfg.poll.diagnostic_first_attempt_only);
        assert!(cfg.browser.headless);
    }

    #[test]
    fn deserialize_partial_toml() {
        let cfg: CitawatchConfig = toml::from_str(
            r#"
            [telegram]
            token = "123:ABC"
            chat_id = "42"

            [poll]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.telegram.token.expose_secret(), "123:ABC");
        assert_eq!(cfg.telegram.chat_id, "42");
        assert_eq!(cfg.poll.max_attempts, 5);
        // untouched sections keep defaults
        assert_eq!(cfg.poll.delay_min_secs, 20);
        assert_eq!(cfg.entry_url, DEFAULT_ENTRY_URL);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramConfig {
            token: Secret::new("super-secret".into()),
            chat_id: "42".into(),
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
