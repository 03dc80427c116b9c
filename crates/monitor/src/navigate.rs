//! Navigation driver: walk the booking flow from the entry page to the
//! availability view.
//!
//! Every step degrades rather than fails. The absence of a cookie banner or
//! a continue button is not an error; only the final "did we see the target
//! fragment" verdict matters, and even that is handed to the classifier as
//! evidence rather than thrown.

use std::time::Duration;

use {
    citawatch_browser::{BrowserSession, Surface},
    citawatch_config::CitawatchConfig,
    tracing::{debug, info, warn},
};

use crate::error::Result;

/// Case-insensitive cookie-consent button pattern (JS regex).
const COOKIE_ACCEPT_PATTERN: &str = r"^\s*(aceptar|aceitar|accept)";

/// Case-insensitive continue-button pattern (JS regex).
const CONTINUE_PATTERN: &str = r"continu(e|ar)";

/// Substring identifying the entry link into the booking host.
const ENTRY_LINK_HREF: &str = "citaconsular";

const COOKIE_TIMEOUT: Duration = Duration::from_secs(3);
const ENTRY_LINK_TIMEOUT: Duration = Duration::from_secs(30);
const SURFACE_GRACE: Duration = Duration::from_secs(4);
const CONTINUE_TIMEOUT: Duration = Duration::from_secs(10);
const TARGET_TIMEOUT: Duration = Duration::from_secs(30);
const CORRECTED_TARGET_TIMEOUT: Duration = Duration::from_secs(10);

/// Client script on the availability view rewrites the DOM after the
/// fragment shows up.
const TARGET_SETTLE: Duration = Duration::from_millis(1500);

/// How far through the flow an attempt got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStage {
    Start,
    CookieDismissed,
    EntryLinkFollowed,
    ContinueConfirmed,
    AtTarget,
    Stalled,
}

impl NavStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::CookieDismissed => "cookie_dismissed",
            Self::EntryLinkFollowed => "entry_link_followed",
            Self::ContinueConfirmed => "continue_confirmed",
            Self::AtTarget => "at_target",
            Self::Stalled => "stalled",
        }
    }
}

/// Where a navigation run ended up.
pub struct NavOutcome {
    /// The surface holding whatever content the flow produced.
    pub surface: Surface,
    /// Whether the target fragment was ever observed in the location.
    pub reached_target: bool,
    /// Location at the end of the run.
    pub location: String,
    /// Furthest stage reached.
    pub stage: NavStage,
}

/// Drives one pass through the booking flow.
pub struct NavigationDriver {
    entry_url: String,
    target_fragment: String,
}

impl NavigationDriver {
    pub fn new(config: &CitawatchConfig) -> Self {
        Self {
            entry_url: config.entry_url.clone(),
            target_fragment: config.target_fragment.clone(),
        }
    }

    /// Run the flow inside `session` and report where it ended up.
    pub async fn run(&self, session: &BrowserSession) -> Result<NavOutcome> {
        let mut stage = NavStage::Start;

        let surface = session.open(&self.entry_url).await?;
        debug!(url = %self.entry_url, "opened entry page");

        // Optional; the banner only shows on fresh profiles.
        if surface
            .click_matching_text(COOKIE_ACCEPT_PATTERN, COOKIE_TIMEOUT)
            .await
        {
            stage = NavStage::CookieDismissed;
            debug!("dismissed cookie banner");
        }

        let baseline = session.surface_count().await;
        let followed = surface
            .click_link_by_href(ENTRY_LINK_HREF, ENTRY_LINK_TIMEOUT)
            .await;

        let surface = if followed {
            stage = NavStage::EntryLinkFollowed;
            // The link can open a new tab or navigate in place.
            session
                .authoritative_surface(surface, baseline, SURFACE_GRACE)
                .await
        } else {
            warn!("entry link not found on entry page");
            surface
        };

        if surface
            .click_matching_text(CONTINUE_PATTERN, CONTINUE_TIMEOUT)
            .await
        {
            stage = NavStage::ContinueConfirmed;
            debug!("confirmed continue step");
        }

        let mut reached_target = surface
            .wait_for_fragment(&self.target_fragment, TARGET_TIMEOUT)
            .await;

        // One corrective hop: rewrite the location to carry the fragment
        // and give the view a shorter second chance.
        if !reached_target {
            let current = surface.location().await;
            if !current.is_empty() {
                let corrected = derive_target_location(&current, &self.target_fragment);
                info!(from = %current, to = %corrected, "corrective navigation");
                if let Err(e) = surface.goto(&corrected).await {
                    warn!(error = %e, "corrective navigation failed");
                }
                reached_target = surface
                    .wait_for_fragment(&self.target_fragment, CORRECTED_TARGET_TIMEOUT)
                    .await;
            }
        }

        if reached_target {
            stage = NavStage::AtTarget;
            surface.settle(TARGET_SETTLE).await;
        } else {
            warn!(furthest = stage.label(), "flow stalled before the target");
            stage = NavStage::Stalled;
        }

        let location = surface.location().await;
        info!(stage = stage.label(), %location, "navigation finished");

        Ok(NavOutcome {
            surface,
            reached_target,
            location,
            stage,
        })
    }
}

/// Replace any existing fragment on `current` with `fragment`.
fn derive_target_location(current: &str, fragment: &str) -> String {
    let base = current.split('#').next().unwrap_or(current);
    format!("{base}{fragment}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_appends_fragment() {
        assert_eq!(
            derive_target_location("https://host/widget", "#services"),
            "https://host/widget#services"
        );
    }

    #[test]
    fn derive_replaces_other_fragment() {
        assert_eq!(
            derive_target_location("https://host/widget#datetime", "#services"),
            "https://host/widget#services"
        );
    }

    #[test]
    fn derive_is_stable_when_already_on_target() {
        assert_eq!(
            derive_target_location("https://host/widget#services", "#services"),
            "https://host/widget#services"
        );
    }

    #[test]
    fn stage_labels_are_snake_case() {
        assert_eq!(NavStage::EntryLinkFollowed.label(), "entry_link_followed");
        assert_eq!(NavStage::Stalled.label(), "stalled");
    }
}
