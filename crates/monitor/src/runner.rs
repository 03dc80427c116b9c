//! Wires the scheduler, navigation driver, classifier, and decision engine
//! to a live browser and a notifier.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    citawatch_browser::{
        BrowserConfig, BrowserSession, Surface, detect::detect_browser, escape_for_js_regex,
    },
    citawatch_config::CitawatchConfig,
    tracing::info,
};

use crate::{
    classify::classify,
    decide::{DecisionEngine, ViewOps},
    error::Result,
    navigate::NavigationDriver,
    notify::Notify,
    scheduler::{AttemptRunner, Disposition, PollScheduler},
    types::{AttemptResult, RunOutcome, truncate_preview},
};

/// How long to keep probing for the slot element before reporting the
/// click as failed.
const SLOT_CLICK_TIMEOUT: Duration = Duration::from_secs(5);

const PREVIEW_CHARS: usize = 200;

/// Top-level entry point for one poll run.
pub struct Watcher {
    config: CitawatchConfig,
    notifier: Arc<dyn Notify>,
}

impl Watcher {
    pub fn new(config: CitawatchConfig, notifier: Arc<dyn Notify>) -> Self {
        Self { config, notifier }
    }

    /// Run the full poll loop. Environment problems that would fail every
    /// attempt identically are reported as `FatalError` before the first
    /// attempt launches.
    pub async fn run(&self) -> RunOutcome {
        let detection = detect_browser(self.config.browser.chrome_path.as_deref());
        if !detection.found {
            return RunOutcome::FatalError(detection.install_hint);
        }

        let runner = LiveAttemptRunner {
            browser: BrowserConfig::from(&self.config.browser),
            driver: NavigationDriver::new(&self.config),
            engine: DecisionEngine::new(self.config.poll.diagnostic_first_attempt_only),
            notifier: Arc::clone(&self.notifier),
        };
        let scheduler = PollScheduler::new((&self.config.poll).into());

        scheduler.run_with(&runner).await
    }
}

/// Attempt runner backed by a real browser. Each attempt gets a fresh
/// session, closed unconditionally before the result is returned.
struct LiveAttemptRunner {
    browser: BrowserConfig,
    driver: NavigationDriver,
    engine: DecisionEngine,
    notifier: Arc<dyn Notify>,
}

#[async_trait]
impl AttemptRunner for LiveAttemptRunner {
    async fn attempt(&self, index: usize) -> std::result::Result<Disposition, crate::MonitorError> {
        let session = BrowserSession::launch(&self.browser).await?;
        let outcome = self.run_attempt(index, &session).await;
        session.close().await;
        outcome
    }
}

impl LiveAttemptRunner {
    async fn run_attempt(&self, index: usize, session: &BrowserSession) -> Result<Disposition> {
        let nav = self.driver.run(session).await?;
        let text = nav.surface.visible_text().await.unwrap_or_default();

        let status = classify(&text, nav.reached_target);

        let view = SurfaceView {
            surface: &nav.surface,
        };
        let decision = self
            .engine
            .decide(&status, index, &view, self.notifier.as_ref())
            .await;

        let result = AttemptResult {
            status,
            location: nav.location,
            text_preview: truncate_preview(&text, PREVIEW_CHARS),
            screenshot: decision.screenshot,
            reservation: decision.reservation,
        };
        info!(
            attempt = index + 1,
            status = %result.status,
            location = %result.location,
            preview = %result.text_preview,
            reservation = ?result.reservation,
            "attempt classified"
        );

        Ok(Disposition {
            terminal: decision.terminal,
        })
    }
}

/// Adapts a live surface to the decision engine's view seam.
struct SurfaceView<'a> {
    surface: &'a Surface,
}

#[async_trait]
impl ViewOps for SurfaceView<'_> {
    async fn click_slot(&self, text: &str) -> bool {
        let pattern = escape_for_js_regex(text);
        self.surface
            .click_matching_text(&pattern, SLOT_CLICK_TIMEOUT)
            .await
    }

    async fn capture(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.surface.screenshot().await?)
    }

    async fn location(&self) -> String {
        self.surface.location().await
    }

    async fn settle(&self, duration: Duration) {
        self.surface.settle(duration).await;
    }
}
