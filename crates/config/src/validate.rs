//! Configuration validation.
//!
//! Missing credentials or a bad entry URL are fatal: the process must exit
//! before any poll attempt runs.

use secrecy::ExposeSecret;

use crate::schema::CitawatchConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "telegram.chat_id"
    pub path: &'static str,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn error(&mut self, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            path,
            message: message.into(),
        });
    }

    fn warning(&mut self, path: &'static str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            path,
            message: message.into(),
        });
    }
}

/// Validate a loaded configuration.
pub fn validate(cfg: &CitawatchConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if cfg.telegram.token.expose_secret().is_empty() {
        result.error(
            "telegram.token",
            "missing bot token (set telegram.token or TELEGRAM_BOT_TOKEN)",
        );
    }
    if cfg.telegram.chat_id.is_empty() {
        result.error(
            "telegram.chat_id",
            "missing chat id (set telegram.chat_id or TELEGRAM_CHAT_ID)",
        );
    } else if cfg.telegram.chat_id.parse::<i64>().is_err() {
        result.error(
            "telegram.chat_id",
            format!("chat id must be numeric, got {:?}", cfg.telegram.chat_id),
        );
    }

    if cfg.entry_url.is_empty() {
        result.error("entry_url", "missing entry URL");
    } else if let Err(e) = url::Url::parse(&cfg.entry_url) {
        result.error("entry_url", format!("invalid entry URL: {e}"));
    }

    if !cfg.target_fragment.starts_with('#') {
        result.warning(
            "target_fragment",
            format!(
                "fragment {:?} does not start with '#'",
                cfg.target_fragment
            ),
        );
    }

    if cfg.poll.max_attempts == 0 {
        result.error("poll.max_attempts", "must be at least 1");
    }
    if cfg.poll.delay_min_secs > cfg.poll.delay_max_secs {
        result.error(
            "poll.delay_min_secs",
            format!(
                "delay_min_secs ({}) exceeds delay_max_secs ({})",
                cfg.poll.delay_min_secs, cfg.poll.delay_max_secs
            ),
        );
    }

    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {secrecy::Secret, super::*};

    fn valid_config() -> CitawatchConfig {
        let mut cfg = CitawatchConfig::default();
        cfg.telegram.token = Secret::new("123:ABC".into());
        cfg.telegram.chat_id = "-100123".into();
        cfg
    }

    #[test]
    fn valid_config_passes() {
        let result = validate(&valid_config());
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn missing_credentials_are_errors() {
        let result = validate(&CitawatchConfig::default());
        assert!(result.has_errors());
        let paths: Vec<_> = result.diagnostics.iter().map(|d| d.path).collect();
        assert!(paths.contains(&"telegram.token"));
        assert!(paths.contains(&"telegram.chat_id"));
    }

    #[test]
    fn non_numeric_chat_id_is_an_error() {
        let mut cfg = valid_config();
        cfg.telegram.chat_id = "not-a-number".into();
        assert!(validate(&cfg).has_errors());
    }

    #[test]
    fn bad_entry_url_is_an_error() {
        let mut cfg = valid_config();
        cfg.entry_url = "not a url".into();
        assert!(validate(&cfg).has_errors());
    }

    #[test]
    fn empty_entry_url_is_an_error() {
        let mut cfg = valid_config();
        cfg.entry_url = String::new();
        assert!(validate(&cfg).has_errors());
    }

    #[test]
    fn fragment_without_hash_is_a_warning() {
        let mut cfg = valid_config();
        cfg.target_fragment = "services".into();
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.severity == Severity::Warning)
        );
    }

    #[test]
    fn zero_attempts_is_an_error() {
        let mut cfg = valid_config();
        cfg.poll.max_attempts = 0;
        assert!(validate(&cfg).has_errors());
    }

    #[test]
    fn inverted_delay_bounds_are_an_error() {
        let mut cfg = valid_config();
        cfg.poll.delay_min_secs = 60;
        cfg.poll.delay_max_secs = 10;
        assert!(validate(&cfg).has_errors());
    }
}
