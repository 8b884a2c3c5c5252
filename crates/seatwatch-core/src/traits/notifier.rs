//! Notification capability.

use async_trait::async_trait;
use tracing::info;

use crate::Result;

/// Delivers fire-and-forget notifications about acquisition outcomes.
///
/// Failures are the caller's to swallow: a broken channel must never stop
/// the acquisition loop.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    async fn notify(&self, title: &str, body: &str) -> Result<()>;
}

/// Notifier that only writes to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        info!(title, body, "notification");
        Ok(())
    }
}
