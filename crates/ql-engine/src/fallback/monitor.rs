//! Background availability probe for the chat collaborator.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use super::FallbackOrchestrator;

/// Re-check collaborator health every `interval`, forever.
pub async fn run(orchestrator: Arc<FallbackOrchestrator>, interval: Duration) {
    if !orchestrator.is_enabled() {
        return;
    }

    let mut ticker = time::interval(interval);
    loop {
        ticker.tick().await;
        let healthy = orchestrator.refresh_health().await;
        tracing::debug!(healthy, "chat health check");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackConfig;
    use crate::mock::MockChatClient;

    #[tokio::test(start_paused = true)]
    async fn probes_on_interval() {
        let chat = Arc::new(MockChatClient::unhealthy());
        let config = FallbackConfig {
            enabled: true,
            ..Default::default()
        };
        let orchestrator = Arc::new(FallbackOrchestrator::new(chat.clone(), &config));
        assert!(orchestrator.is_available().await);

        let task = tokio::spawn(run(orchestrator.clone(), Duration::from_secs(60)));
        time::sleep(Duration::from_secs(125)).await;

        // Immediate first tick plus two more.
        assert_eq!(chat.health_checks(), 3);
        assert!(!orchestrator.is_available().await);
        task.abort();
    }

    #[tokio::test]
    async fn disabled_returns_immediately() {
        run(Arc::new(FallbackOrchestrator::disabled()), Duration::from_secs(1)).await;
    }
}
