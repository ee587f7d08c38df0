use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use timeline_common::BackoffSettings;
use tracing::debug;

/// Wall-clock waiting, injectable so tests can count pauses instead of sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// `base + U[0,1) * jitter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub jitter: Duration,
}

impl BackoffPolicy {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    /// Expects settings that passed `CrawlPlan::validate`, which rejects values
    /// `Duration` cannot hold.
    pub fn from_settings(settings: &BackoffSettings) -> Self {
        Self {
            base: Duration::from_secs_f64(settings.base_secs),
            jitter: Duration::from_secs_f64(settings.jitter_secs),
        }
    }

    /// Delay for a given draw `unit` in `[0, 1)`.
    pub fn delay_for(&self, unit: f64) -> Duration {
        self.base + self.jitter.mul_f64(unit.clamp(0.0, 1.0))
    }

    pub fn next_delay(&self) -> Duration {
        self.delay_for(rand::rng().random::<f64>())
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_settings(&BackoffSettings::default())
    }
}

#[derive(Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    /// Sleep for a freshly drawn delay.
    pub async fn pause(&self, reason: &str) {
        let delay = self.policy.next_delay();
        debug!(reason, delay_ms = delay.as_millis() as u64, "Backing off");
        self.sleeper.sleep(delay).await;
    }
}
