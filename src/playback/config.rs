// Playback sync configuration

use std::time::Duration;

use super::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncConfig {
    /// How often drift is checked while both elements play
    pub drift_interval: Duration,
    /// Drift (seconds) above which audio is snapped to video
    pub drift_threshold: f64,
    /// Bound on waiting for a swapped source to become playable
    pub ready_timeout: Duration,
    /// Audio play attempts after an autoplay rejection
    pub play_retry: RetryPolicy,
    /// Volume applied to combined streams on a quality switch
    pub combined_volume: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drift_interval: Duration::from_millis(500),
            drift_threshold: 0.2,
            ready_timeout: Duration::from_secs(5),
            play_retry: RetryPolicy::default(),
            combined_volume: 0.7,
        }
    }
}

impl SyncConfig {
    pub fn with_drift_threshold(mut self, seconds: f64) -> Self {
        self.drift_threshold = seconds;
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn with_play_retry(mut self, policy: RetryPolicy) -> Self {
        self.play_retry = policy;
        self
    }
}
