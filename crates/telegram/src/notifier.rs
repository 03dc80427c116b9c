//! Alert sender backed by the Telegram Bot API.

use std::{future::Future, path::Path, time::Duration};

use {
    anyhow::Result,
    async_trait::async_trait,
    citawatch_config::TelegramConfig,
    citawatch_monitor::Notify,
    secrecy::ExposeSecret,
    teloxide::{
        Bot, RequestError,
        payloads::{SendDocumentSetters, SendPhotoSetters},
        prelude::Requester,
        types::{ChatId, InputFile},
    },
    tracing::{debug, info, warn},
};

const RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends watcher alerts to one chat.
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let chat_id = ChatId(config.chat_id.parse::<i64>()?);
        Ok(Self {
            bot: Bot::new(config.token.expose_secret()),
            chat_id,
        })
    }

    async fn run_with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

#[async_trait]
impl Notify for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.run_with_retry("send message", || {
            let req = self.bot.send_message(self.chat_id, text);
            async move { req.await }
        })
        .await?;

        info!(chat_id = %self.chat_id, text_len = text.len(), "telegram alert sent");
        Ok(())
    }

    async fn send_photo(&self, photo: &Path, caption: &str) -> Result<()> {
        let bytes = tokio::fs::read(photo).await?;
        let filename = photo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "screenshot.png".to_string());

        let result = self
            .run_with_retry("send photo", || {
                let input = InputFile::memory(bytes.clone()).file_name(filename.clone());
                let req = self.bot.send_photo(self.chat_id, input).caption(caption);
                async move { req.await }
            })
            .await;

        match result {
            Ok(_) => {
                info!(chat_id = %self.chat_id, bytes = bytes.len(), "telegram photo alert sent");
                Ok(())
            },
            Err(e) if is_photo_rejected_error(&e) => {
                // Full-page captures can exceed Telegram's photo dimension
                // limits; a document upload carries the same pixels.
                debug!(error = %e, "photo rejected, retrying as document");
                self.run_with_retry("send document", || {
                    let input = InputFile::memory(bytes.clone()).file_name(filename.clone());
                    let req = self.bot.send_document(self.chat_id, input).caption(caption);
                    async move { req.await }
                })
                .await?;
                info!(chat_id = %self.chat_id, "telegram alert sent as document fallback");
                Ok(())
            },
            Err(e) => Err(e.into()),
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn is_photo_rejected_error(error: &RequestError) -> bool {
    let text = error.to_string();
    text.contains("PHOTO_INVALID_DIMENSIONS") || text.contains("PHOTO_SAVE_FILE_INVALID")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_duration_extracts_wait() {
        let err = RequestError::RetryAfter(teloxide::types::Seconds::from_seconds(42));
        assert_eq!(retry_after_duration(&err), Some(Duration::from_secs(42)));
    }

    #[test]
    fn retry_after_duration_ignores_other_errors() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert_eq!(retry_after_duration(&err), None);
    }

    #[test]
    fn photo_rejection_detection_ignores_other_errors() {
        let err = RequestError::Io(std::io::Error::other("boom"));
        assert!(!is_photo_rejected_error(&err));
    }

    #[test]
    fn notifier_rejects_non_numeric_chat_id() {
        let config = TelegramConfig {
            token: String::from("123:abc").into(),
            chat_id: "not-a-number".into(),
        };
        assert!(TelegramNotifier::new(&config).is_err());
    }

    #[test]
    fn notifier_accepts_numeric_chat_id() {
        let config = TelegramConfig {
            token: String::from("123:abc").into(),
            chat_id: "-1001234567890".into(),
        };
        assert!(TelegramNotifier::new(&config).is_ok());
    }
}
