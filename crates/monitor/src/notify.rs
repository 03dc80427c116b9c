//! Outbound notification seam.

use std::path::Path;

use async_trait::async_trait;

/// Send alerts to one destination.
///
/// Fire-and-forget from the core's perspective: callers log delivery
/// failures and move on, they never retry here.
#[async_trait]
pub trait Notify: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, text: &str) -> anyhow::Result<()>;

    /// Send an image with a caption.
    async fn send_photo(&self, photo: &Path, caption: &str) -> anyhow::Result<()>;
}
