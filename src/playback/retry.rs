// Bounded play retry

use std::time::Duration;

use super::element::MediaElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            delay: Duration::from_millis(200),
        }
    }
}

/// Terminal state of a retried play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started { attempts: u32 },
    Abandoned { attempts: u32 },
    /// `still_wanted` turned false before an attempt; the element was left as is
    Cancelled { attempts: u32 },
}

/// Call `play()` until it succeeds or the policy runs out.
///
/// `still_wanted` is checked before every attempt, so a retry never starts
/// playback the caller no longer asks for. Rejections are logged, never
/// returned; the element stays paused when abandoned and the user has to
/// resume manually.
pub async fn play_with_retry<F>(element: &dyn MediaElement, policy: RetryPolicy, still_wanted: F) -> PlayOutcome
where
    F: Fn() -> bool,
{
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        if !still_wanted() {
            tracing::debug!("[Sync] Audio play no longer wanted, skipping attempt {}", attempt);
            return PlayOutcome::Cancelled { attempts: attempt - 1 };
        }
        match element.play().await {
            Ok(()) => {
                if attempt > 1 {
                    tracing::info!("[Sync] Audio play succeeded on attempt {}", attempt);
                }
                return PlayOutcome::Started { attempts: attempt };
            }
            Err(err) => {
                tracing::warn!("[Sync] Audio play attempt {} failed: {}", attempt, err);
                if attempt < attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    tracing::warn!("[Sync] Audio play abandoned after {} attempts", attempts);
    PlayOutcome::Abandoned { attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::testing::FakeElement;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_after_one_rejection() {
        let audio = FakeElement::new();
        audio.reject_next_plays(1);
        let started = Instant::now();

        let outcome = play_with_retry(&audio, RetryPolicy::default(), || true).await;

        assert_eq!(outcome, PlayOutcome::Started { attempts: 2 });
        assert!(!audio.is_paused());
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(started.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_and_stays_paused() {
        let audio = FakeElement::new();
        audio.reject_next_plays(5);

        let outcome = play_with_retry(&audio, RetryPolicy::default(), || true).await;

        assert_eq!(outcome, PlayOutcome::Abandoned { attempts: 2 });
        assert!(audio.is_paused());
        assert_eq!(audio.play_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_stops_pending_retry() {
        let audio = FakeElement::new();
        audio.reject_next_plays(1);
        let wanted = AtomicBool::new(true);

        let retry = play_with_retry(&audio, RetryPolicy::default(), || wanted.load(Ordering::SeqCst));
        let flip = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            wanted.store(false, Ordering::SeqCst);
        };
        let (outcome, ()) = tokio::join!(retry, flip);

        assert_eq!(outcome, PlayOutcome::Cancelled { attempts: 1 });
        assert_eq!(audio.play_calls(), 1);
        assert!(audio.is_paused());
    }

    #[tokio::test]
    async fn test_unwanted_play_is_never_attempted() {
        let audio = FakeElement::new();

        let outcome = play_with_retry(&audio, RetryPolicy::default(), || false).await;

        assert_eq!(outcome, PlayOutcome::Cancelled { attempts: 0 });
        assert_eq!(audio.play_calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let audio = FakeElement::new();
        let policy = RetryPolicy {
            attempts: 0,
            delay: Duration::ZERO,
        };

        assert_eq!(
            play_with_retry(&audio, policy, || true).await,
            PlayOutcome::Started { attempts: 1 }
        );
    }
}
