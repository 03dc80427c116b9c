//! One launched browser per poll attempt.
//!
//! The booking flow's state (cookies, navigation history) must never leak
//! between attempts, so a session is acquired at attempt start and closed
//! unconditionally at attempt end. There is no pooling or reuse.

use std::time::{Duration, Instant};

use {
    chromiumoxide::{Browser, BrowserConfig as CdpBrowserConfig},
    futures::StreamExt,
    tokio::task::JoinHandle,
    tracing::{debug, info, warn},
};

use crate::{detect, error::BrowserError, surface::Surface, types::BrowserConfig};

/// Poll interval while waiting for a spawned surface.
const SURFACE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A live browsing context scoped to a single poll attempt.
pub struct BrowserSession {
    id: String,
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a fresh headless browser.
    pub async fn launch(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let detection = detect::detect_browser(config.chrome_path.as_deref());
        let Some(executable) = detection.path else {
            return Err(BrowserError::LaunchFailed(format!(
                "Chrome/Chromium not found. {}",
                detection.install_hint
            )));
        };

        let mut builder = CdpBrowserConfig::builder();

        // chromiumoxide runs headless by default; with_head() opts out.
        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .viewport(chromiumoxide::handler::viewport::Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: true,
                has_touch: false,
            })
            .request_timeout(Duration::from_millis(config.navigation_timeout_ms))
            .chrome_executable(&executable);

        for arg in &config.chrome_args {
            builder = builder.arg(arg);
        }

        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox");

        let cdp_config = builder.build().map_err(|e| {
            BrowserError::LaunchFailed(format!("failed to build browser config: {e}"))
        })?;

        let (browser, mut handler) = Browser::launch(cdp_config).await.map_err(|e| {
            let install_hint = detect::install_instructions();
            BrowserError::LaunchFailed(format!("browser launch failed: {e}\n\n{install_hint}"))
        })?;

        let id = generate_session_id();

        // Drain CDP events for the lifetime of the session.
        let session_id = id.clone();
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!(session_id, ?event, "browser event");
            }
        });

        info!(session_id = id, executable = %executable.display(), "launched browser session");

        Ok(Self {
            id,
            browser,
            handler_task,
        })
    }

    /// Session identifier, for log correlation.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Open a URL in a new surface and wait for the initial load.
    pub async fn open(&self, url: &str) -> Result<Surface, BrowserError> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        let _ = page.wait_for_navigation().await;

        debug!(session_id = self.id, url, "opened surface");
        Ok(Surface::attach(page).await)
    }

    /// Number of surfaces currently open in this session.
    pub async fn surface_count(&self) -> usize {
        match self.browser.pages().await {
            Ok(pages) => pages.len(),
            Err(e) => {
                debug!(session_id = self.id, error = %e, "failed to list surfaces");
                0
            },
        }
    }

    /// Resolve which surface is authoritative after an activation that may
    /// have opened a new tab or navigated in place.
    ///
    /// Waits up to `grace` for a surface beyond `baseline` to appear; picks
    /// the most recently opened one if so, else sticks with `origin`. Both
    /// outcomes are legal results of the same click.
    pub async fn authoritative_surface(
        &self,
        origin: Surface,
        baseline: usize,
        grace: Duration,
    ) -> Surface {
        let deadline = Instant::now() + grace;

        while Instant::now() < deadline {
            match self.browser.pages().await {
                Ok(pages) if pages.len() > baseline => {
                    if let Some(page) = pages.into_iter().next_back() {
                        debug!(session_id = self.id, "activation spawned a new surface");
                        return Surface::attach(page).await;
                    }
                },
                Ok(_) => {},
                Err(e) => {
                    debug!(session_id = self.id, error = %e, "failed to list surfaces");
                },
            }
            tokio::time::sleep(SURFACE_POLL_INTERVAL).await;
        }

        debug!(
            session_id = self.id,
            "no new surface within grace window, staying on origin"
        );
        origin
    }

    /// Close the browser. Called unconditionally at attempt end.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(session_id = self.id, error = %e, "browser close failed");
        }
        self.handler_task.abort();
        debug!(session_id = self.id, "closed browser session");
    }
}

/// Generate a random session ID.
fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let id: u64 = rng.random();
    format!("attempt-{:016x}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, id2);
        assert!(id1.starts_with("attempt-"));
    }
}
