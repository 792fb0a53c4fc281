//! Periodic rule reload.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use super::{RuleSource, RuleStore};

/// Reload `store` from `source` every `interval`, forever.
///
/// A failed reload is logged and the previous catalog keeps serving.
pub async fn run(store: Arc<RuleStore>, source: Arc<dyn RuleSource>, interval: Duration) {
    let mut ticker = time::interval(interval);
    // Skip the first tick (fires immediately).
    ticker.tick().await;

    loop {
        ticker.tick().await;

        match store.reload(source.as_ref()).await {
            Ok(summary) => {
                tracing::debug!(active = summary.active, "scheduled rule refresh complete");
            }
            Err(e) => {
                tracing::warn!(source = %source.describe(), error = %e, "rule refresh failed, keeping current rules");
            }
        }
    }
}
