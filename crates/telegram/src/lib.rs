//! Telegram delivery for watcher alerts.

pub mod notifier;

pub use notifier::TelegramNotifier;
