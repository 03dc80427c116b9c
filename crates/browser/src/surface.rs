//! A live browsing view: text, clicks, location, screenshots.
//!
//! Element probes are JS evaluations polled until a bounded deadline, so a
//! missing optional control degrades to `false` instead of an error.

use std::time::{Duration, Instant};

use {
    chromiumoxide::{
        Page,
        cdp::browser_protocol::page::{
            CaptureScreenshotFormat, EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
        },
    },
    futures::StreamExt,
    tracing::debug,
};

use crate::error::BrowserError;

/// Poll interval for element probes and location waits.
const PROBE_INTERVAL: Duration = Duration::from_millis(250);

/// A live browsing view (tab/window).
pub struct Surface {
    page: Page,
}

impl Surface {
    /// Wrap a page and start auto-accepting its JavaScript dialogs — the
    /// booking flow pops confirm() boxes at unpredictable points.
    pub(crate) async fn attach(page: Page) -> Self {
        match page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
        {
            Ok(mut dialogs) => {
                let dialog_page = page.clone();
                tokio::spawn(async move {
                    while let Some(_event) = dialogs.next().await {
                        let Ok(params) = HandleJavaScriptDialogParams::builder()
                            .accept(true)
                            .build()
                        else {
                            continue;
                        };
                        if let Err(e) = dialog_page.execute(params).await {
                            debug!(error = %e, "failed to accept dialog");
                        }
                    }
                });
            },
            Err(e) => debug!(error = %e, "dialog listener unavailable"),
        }

        Self { page }
    }

    /// Current location, empty string if unavailable.
    pub async fn location(&self) -> String {
        self.page.url().await.ok().flatten().unwrap_or_default()
    }

    /// Navigate this surface explicitly.
    pub async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed(e.to_string()))?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    /// Wait until the location contains `fragment`, up to `timeout`.
    /// Returns whether the fragment was observed.
    pub async fn wait_for_fragment(&self, fragment: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            if self.location().await.contains(fragment) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
    }

    /// Full visible text of the surface.
    pub async fn visible_text(&self) -> Result<String, BrowserError> {
        self.page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(|e| BrowserError::JsEvalFailed(e.to_string()))?
            .into_value::<String>()
            .map_err(|e| BrowserError::JsEvalFailed(format!("{e:?}")))
    }

    /// Find a clickable element whose text matches `pattern` (a JS regex,
    /// case-insensitive) and click it. Polls until `timeout`; returns
    /// whether a click happened. Probe failures degrade to `false`.
    pub async fn click_matching_text(&self, pattern: &str, timeout: Duration) -> bool {
        self.probe_click(&click_by_text_js(pattern), timeout).await
    }

    /// Find a link whose href contains `substr` and activate it.
    pub async fn click_link_by_href(&self, substr: &str, timeout: Duration) -> bool {
        self.probe_click(&click_by_href_js(substr), timeout).await
    }

    async fn probe_click(&self, js: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            match self.page.evaluate(js).await {
                Ok(result) => {
                    if result.into_value::<bool>().unwrap_or(false) {
                        return true;
                    }
                },
                Err(e) => {
                    // Transient during navigation; keep probing.
                    debug!(error = %e, "click probe evaluation failed");
                },
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(PROBE_INTERVAL).await;
        }
    }

    /// Capture a full-page PNG screenshot.
    pub async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        self.page
            .screenshot(
                chromiumoxide::page::ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| BrowserError::ScreenshotFailed(e.to_string()))
    }

    /// Let client script settle before reading the surface.
    pub async fn settle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Escape a literal string for embedding in a JS regex.
pub fn escape_for_js_regex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\^$.|?*+()[]{}/".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn click_by_text_js(pattern: &str) -> String {
    let quoted = js_string(pattern);
    format!(
        r#"(() => {{
            const needle = new RegExp({quoted}, 'i');
            const clickable = Array.from(document.querySelectorAll(
                'a, button, input[type="button"], input[type="submit"], [role="button"]'));
            const hit = clickable.find(el =>
                needle.test(el.innerText || el.value || el.getAttribute('aria-label') || ''));
            if (hit) {{ hit.click(); return true; }}
            const leaves = Array.from(document.querySelectorAll('body *'))
                .filter(el => el.childElementCount === 0 && needle.test(el.innerText || ''));
            if (leaves.length) {{ leaves[0].click(); return true; }}
            return false;
        }})()"#
    )
}

fn click_by_href_js(substr: &str) -> String {
    let quoted = js_string(substr);
    format!(
        r#"(() => {{
            const links = Array.from(document.querySelectorAll('a[href]'));
            const hit = links.find(a => (a.getAttribute('href') || '').includes({quoted}));
            if (hit) {{ hit.click(); return true; }}
            return false;
        }})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_escapes_quotes_and_backslashes() {
        assert_eq!(js_string(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn click_by_text_js_embeds_pattern_safely() {
        let js = click_by_text_js(r#"Continue\s*/\s*Continuar"#);
        assert!(js.contains("new RegExp"));
        // The backslashes survive as JSON escapes, not raw.
        assert!(js.contains(r#""Continue\\s*/\\s*Continuar""#));
    }

    #[test]
    fn click_by_href_js_embeds_substring() {
        let js = click_by_href_js("citaconsular");
        assert!(js.contains(r#"includes("citaconsular")"#));
    }

    #[test]
    fn escape_for_js_regex_neutralizes_metacharacters() {
        assert_eq!(
            escape_for_js_regex("14:30 Hueco (libre)?"),
            r"14:30 Hueco \(libre\)\?"
        );
        assert_eq!(escape_for_js_regex("plain text"), "plain text");
    }
}
