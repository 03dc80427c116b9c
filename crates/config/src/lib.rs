//! Configuration loading, validation, and env substitution.
//!
//! Config files: `citawatch.toml`, `citawatch.yaml`, or `citawatch.json`
//! Searched in `./` then `~/.config/citawatch/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values. Telegram
//! credentials fall back to the `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`
//! environment variables when the config file leaves them empty.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{BrowserConfig, CitawatchConfig, PollConfig, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
