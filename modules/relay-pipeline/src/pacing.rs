use std::time::Duration;

use tracing::info;

/// Enforces the two mandatory minimum waits: after every successful publish
/// (rate-limit avoidance) and after session establishment. Values come from
/// configuration, not constants.
#[derive(Debug, Clone)]
pub struct PacingController {
    publish_cooldown: Duration,
    session_cooldown: Duration,
}

impl PacingController {
    pub fn new(publish_cooldown: Duration, session_cooldown: Duration) -> Self {
        Self {
            publish_cooldown,
            session_cooldown,
        }
    }

    pub async fn cooldown_after_publish(&self) {
        if self.publish_cooldown.is_zero() {
            return;
        }
        info!(
            secs = self.publish_cooldown.as_secs(),
            "Cooling down after publish"
        );
        tokio::time::sleep(self.publish_cooldown).await;
    }

    pub async fn cooldown_after_login(&self) {
        if self.session_cooldown.is_zero() {
            return;
        }
        info!(
            secs = self.session_cooldown.as_secs(),
            "Cooling down after login"
        );
        tokio::time::sleep(self.session_cooldown).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn publish_cooldown_waits_the_configured_minimum() {
        let pacing = PacingController::new(Duration::from_secs(5), Duration::ZERO);
        let before = Instant::now();
        pacing.cooldown_after_publish().await;
        assert!(before.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_cooldown_returns_immediately() {
        let pacing = PacingController::new(Duration::ZERO, Duration::ZERO);
        let before = Instant::now();
        pacing.cooldown_after_publish().await;
        pacing.cooldown_after_login().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
