//! Decision engine: map a classified status to side effects.
//!
//! The quiet path is the common one. `NoSlots` produces only a log line;
//! alerts are reserved for a found slot, an unreadable flow, or content the
//! classifier could not place.

use std::time::Duration;

use {
    async_trait::async_trait,
    chrono::Local,
    tempfile::TempPath,
    tracing::{info, warn},
};

use crate::{
    notify::Notify,
    types::{ReservationOutcome, Status},
};

/// Pause after the reservation click so the booking host can paint its
/// confirmation state before the screenshot.
const RESERVATION_SETTLE: Duration = Duration::from_millis(1500);

/// Operations the engine needs from the live view. Seam for tests.
#[async_trait]
pub trait ViewOps: Send + Sync {
    /// Click the element carrying the slot text. Returns whether a click
    /// happened.
    async fn click_slot(&self, text: &str) -> bool;

    /// Capture the view as PNG bytes.
    async fn capture(&self) -> anyhow::Result<Vec<u8>>;

    async fn location(&self) -> String;

    async fn settle(&self, duration: Duration);
}

/// What the engine did with one attempt.
pub struct Decision {
    /// Whether the run should stop here.
    pub terminal: bool,
    pub reservation: ReservationOutcome,
    pub screenshot: Option<TempPath>,
}

/// Applies alert policy to classified statuses.
pub struct DecisionEngine {
    diagnostic_first_attempt_only: bool,
}

impl DecisionEngine {
    pub fn new(diagnostic_first_attempt_only: bool) -> Self {
        Self {
            diagnostic_first_attempt_only,
        }
    }

    /// Handle `status` from attempt `attempt` (zero-based).
    pub async fn decide(
        &self,
        status: &Status,
        attempt: usize,
        view: &dyn ViewOps,
        notifier: &dyn Notify,
    ) -> Decision {
        match status {
            Status::NoSlots => {
                info!(attempt, "no slots available");
                Decision {
                    terminal: false,
                    reservation: ReservationOutcome::NotAttempted,
                    screenshot: None,
                }
            },
            Status::SlotFound(slot) => {
                let reservation = if view.click_slot(&slot.text).await {
                    ReservationOutcome::Clicked
                } else {
                    warn!(slot = %slot.text, "slot element could not be re-located for the click");
                    ReservationOutcome::ClickFailed
                };
                view.settle(RESERVATION_SETTLE).await;

                let screenshot = capture_to_temp(view).await;
                let caption = slot_caption(&slot.text, reservation, &view.location().await);
                deliver(notifier, &caption, screenshot.as_ref()).await;

                Decision {
                    terminal: true,
                    reservation,
                    screenshot,
                }
            },
            Status::UnreachableTarget => {
                let screenshot = if self.should_send_diagnostic(attempt) {
                    let screenshot = capture_to_temp(view).await;
                    let caption = format!(
                        "⚠️ Página de horários inacessível.\n{}\n{}",
                        timestamp(),
                        view.location().await
                    );
                    deliver(notifier, &caption, screenshot.as_ref()).await;
                    screenshot
                } else {
                    None
                };
                Decision {
                    terminal: false,
                    reservation: ReservationOutcome::NotAttempted,
                    screenshot,
                }
            },
            Status::AmbiguousContent => {
                let screenshot = capture_to_temp(view).await;
                let caption = format!(
                    "⚠️ Estado inesperado.\n{}\n{}",
                    timestamp(),
                    view.location().await
                );
                deliver(notifier, &caption, screenshot.as_ref()).await;

                Decision {
                    terminal: true,
                    reservation: ReservationOutcome::NotAttempted,
                    screenshot,
                }
            },
        }
    }

    fn should_send_diagnostic(&self, attempt: usize) -> bool {
        !self.diagnostic_first_attempt_only || attempt == 0
    }
}

/// Prefer an image, fall back to text, tolerate total delivery failure.
async fn deliver(notifier: &dyn Notify, caption: &str, screenshot: Option<&TempPath>) {
    let result = match screenshot {
        Some(path) => notifier.send_photo(path, caption).await,
        None => notifier.send_text(caption).await,
    };
    if let Err(e) = result {
        warn!(error = %e, "alert delivery failed");
    }
}

async fn capture_to_temp(view: &dyn ViewOps) -> Option<TempPath> {
    match view.capture().await {
        Ok(bytes) => match write_temp_png(&bytes) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "could not persist screenshot");
                None
            },
        },
        Err(e) => {
            warn!(error = %e, "screenshot capture failed");
            None
        },
    }
}

fn write_temp_png(bytes: &[u8]) -> std::io::Result<TempPath> {
    use std::io::Write;

    let mut file = tempfile::Builder::new()
        .prefix("citawatch-")
        .suffix(".png")
        .tempfile()?;
    file.write_all(bytes)?;
    Ok(file.into_temp_path())
}

fn slot_caption(slot_text: &str, reservation: ReservationOutcome, location: &str) -> String {
    let headline = match reservation {
        ReservationOutcome::Clicked => "✅ VAGA ENCONTRADA E CLICADA!",
        _ => "✅ VAGA ENCONTRADA (clique falhou)",
    };
    format!("{headline}\n{slot_text}\n{}\n{location}", timestamp())
}

fn timestamp() -> String {
    Local::now().format("%d/%m/%Y %H:%M").to_string()
}
