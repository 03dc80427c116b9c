//! Managed Chrome/Chromium with CDP, one short-lived session per poll
//! attempt. The page driver for the slot watcher: load a URL, wait for
//! conditions, click elements by text or href, read visible text, capture
//! screenshots, and resolve which surface (tab) is authoritative after a
//! click that may open a new one.

pub mod detect;
pub mod error;
pub mod session;
pub mod surface;
pub mod types;

pub use {
    error::BrowserError,
    session::BrowserSession,
    surface::{Surface, escape_for_js_regex},
    types::BrowserConfig,
};
