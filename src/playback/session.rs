// SyncSession - one live pairing of a muted video and a separate audio element
//
// A single task owns the mirroring: it reads the video's events and a drift
// ticker. Dropping the session aborts the task, which also drops any pending
// play retries. At most one session exists per engine.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};

use super::config::SyncConfig;
use super::element::{MediaElement, MediaEvent};
use super::retry::{play_with_retry, PlayOutcome};

/// Snap audio to video when they are more than `threshold` seconds apart.
///
/// Returns whether a correction was made.
pub fn correct_drift(video: &dyn MediaElement, audio: &dyn MediaElement, threshold: f64) -> bool {
    let target = video.current_time();
    let drift = (target - audio.current_time()).abs();
    if drift > threshold {
        tracing::debug!("[Sync] Drift {:.3}s, snapping audio to {:.3}", drift, target);
        audio.set_current_time(target);
        true
    } else {
        false
    }
}

pub struct SyncSession {
    task: JoinHandle<()>,
}

impl SyncSession {
    /// Seed the audio element from the video and start mirroring.
    pub fn attach(video: Arc<dyn MediaElement>, audio: Arc<dyn MediaElement>, config: SyncConfig) -> Self {
        audio.set_current_time(video.current_time());
        audio.set_volume(video.volume());
        audio.set_playback_rate(video.playback_rate());

        // Subscribe before spawning so no event between attach and the first poll is lost
        let events = video.subscribe();
        let task = tokio::spawn(mirror(video, audio, events, config));

        tracing::info!("[Sync] Session attached");
        Self { task }
    }

    /// False once the video has ended or the task was torn down
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            tracing::debug!("[Sync] Session torn down");
        }
        self.task.abort();
    }
}

async fn mirror(
    video: Arc<dyn MediaElement>,
    audio: Arc<dyn MediaElement>,
    mut events: Receiver<MediaEvent>,
    config: SyncConfig,
) {
    let mut ticker = interval(config.drift_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    let mut retries: JoinSet<PlayOutcome> = JoinSet::new();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(MediaEvent::Play) => {
                    if audio.is_paused() {
                        let audio = audio.clone();
                        let video = video.clone();
                        let policy = config.play_retry;
                        retries.spawn(async move {
                            play_with_retry(audio.as_ref(), policy, || !video.is_paused()).await
                        });
                    }
                }
                Ok(MediaEvent::Pause) => {
                    retries.abort_all();
                    if !audio.is_paused() {
                        audio.pause();
                    }
                }
                Ok(MediaEvent::Seeked) => audio.set_current_time(video.current_time()),
                Ok(MediaEvent::VolumeChange) => {
                    // The muted video's volume is not what the user hears
                    if !video.is_muted() {
                        audio.set_volume(video.volume());
                    }
                }
                Ok(MediaEvent::RateChange) => audio.set_playback_rate(video.playback_rate()),
                Ok(MediaEvent::Ended) => {
                    retries.abort_all();
                    audio.pause();
                    audio.set_current_time(0.0);
                    tracing::info!("[Sync] Video ended, session closed");
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Sync] Missed {} video events, resyncing", skipped);
                    audio.set_current_time(video.current_time());
                }
                Err(RecvError::Closed) => break,
            },
            _ = ticker.tick() => {
                if !video.is_paused() && !audio.is_paused() {
                    correct_drift(video.as_ref(), audio.as_ref(), config.drift_threshold);
                }
            },
            Some(done) = retries.join_next(), if !retries.is_empty() => {
                if let Ok(PlayOutcome::Abandoned { .. }) = done {
                    tracing::info!("[Sync] Audio left paused; resume manually");
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::retry::RetryPolicy;
    use crate::playback::testing::FakeElement;
    use std::time::Duration;
    use tokio::time::sleep;

    fn pair(video_at: f64) -> (Arc<FakeElement>, Arc<FakeElement>) {
        (Arc::new(FakeElement::playing_at(video_at)), Arc::new(FakeElement::new()))
    }

    fn attach(video: &Arc<FakeElement>, audio: &Arc<FakeElement>) -> SyncSession {
        SyncSession::attach(video.clone(), audio.clone(), SyncConfig::default())
    }

    #[test]
    fn test_drift_over_threshold_snaps() {
        let video = FakeElement::playing_at(10.0);
        let audio = FakeElement::new();
        audio.advance_to(9.7);

        assert!(correct_drift(&video, &audio, 0.2));
        assert_eq!(audio.current_time(), 10.0);
    }

    #[test]
    fn test_drift_under_threshold_is_left_alone() {
        let video = FakeElement::playing_at(10.0);
        let audio = FakeElement::new();
        audio.advance_to(9.9);

        assert!(!correct_drift(&video, &audio, 0.2));
        assert_eq!(audio.current_time(), 9.9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_seeds_audio_from_video() {
        let (video, audio) = pair(12.5);
        video.set_playback_rate(1.5);

        let _session = attach(&video, &audio);

        assert_eq!(audio.current_time(), 12.5);
        assert_eq!(audio.playback_rate(), 1.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drift_tick_corrects_while_both_play() {
        let (video, audio) = pair(10.0);
        let _session = attach(&video, &audio);
        audio.play().await.unwrap();
        audio.advance_to(9.7);

        sleep(Duration::from_millis(510)).await;

        assert_eq!(audio.current_time(), 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_drift_correction_while_paused() {
        let (video, audio) = pair(10.0);
        let _session = attach(&video, &audio);
        audio.advance_to(5.0);

        sleep(Duration::from_millis(1100)).await;

        assert_eq!(audio.current_time(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_pause_and_seek_are_mirrored() {
        let video = Arc::new(FakeElement::new());
        let audio = Arc::new(FakeElement::new());
        let _session = attach(&video, &audio);

        video.play().await.unwrap();
        sleep(Duration::from_millis(10)).await;
        assert!(!audio.is_paused());

        video.seek(30.0);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(audio.current_time(), 30.0);

        video.pause();
        sleep(Duration::from_millis(10)).await;
        assert!(audio.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_audio_play_is_retried() {
        let video = Arc::new(FakeElement::new());
        let audio = Arc::new(FakeElement::new());
        audio.reject_next_plays(1);
        let _session = attach(&video, &audio);

        video.play().await.unwrap();
        sleep(Duration::from_millis(250)).await;

        assert_eq!(audio.play_calls(), 2);
        assert!(!audio.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cancels_pending_audio_retry() {
        let video = Arc::new(FakeElement::new());
        let audio = Arc::new(FakeElement::new());
        audio.reject_next_plays(1);
        let _session = attach(&video, &audio);

        video.play().await.unwrap();
        sleep(Duration::from_millis(50)).await;
        video.pause();
        sleep(Duration::from_millis(400)).await;

        assert!(video.is_paused());
        assert!(audio.is_paused());
        assert_eq!(audio.play_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_threshold_tolerates_small_drift() {
        let (video, audio) = pair(10.0);
        let config = SyncConfig::default().with_drift_threshold(0.5);
        let _session = SyncSession::attach(video.clone(), audio.clone(), config);
        audio.play().await.unwrap();
        audio.advance_to(9.7);

        sleep(Duration::from_millis(510)).await;

        assert_eq!(audio.current_time(), 9.7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_retry_policy_is_used() {
        let video = Arc::new(FakeElement::new());
        let audio = Arc::new(FakeElement::new());
        audio.reject_next_plays(2);
        let config = SyncConfig::default().with_play_retry(RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(100),
        });
        let _session = SyncSession::attach(video.clone(), audio.clone(), config);

        video.play().await.unwrap();
        sleep(Duration::from_millis(250)).await;

        assert_eq!(audio.play_calls(), 3);
        assert!(!audio.is_paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_change_is_mirrored() {
        let video = Arc::new(FakeElement::new());
        let audio = Arc::new(FakeElement::new());
        let _session = attach(&video, &audio);

        video.set_playback_rate(1.5);
        sleep(Duration::from_millis(10)).await;

        assert_eq!(audio.playback_rate(), 1.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_volume_copied_only_when_video_unmuted() {
        let video = Arc::new(FakeElement::new());
        let audio = Arc::new(FakeElement::new());
        let _session = attach(&video, &audio);

        video.set_volume(0.4);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(audio.volume(), 0.4);

        video.set_muted(true);
        video.set_volume(0.9);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(audio.volume(), 0.4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_rewinds_audio_and_closes() {
        let (video, audio) = pair(100.0);
        let session = attach(&video, &audio);
        audio.play().await.unwrap();
        audio.advance_to(99.0);

        video.emit(MediaEvent::Ended);
        sleep(Duration::from_millis(10)).await;

        assert!(audio.is_paused());
        assert_eq!(audio.current_time(), 0.0);
        assert!(!session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_session_stops_mirroring() {
        let video = Arc::new(FakeElement::new());
        let audio = Arc::new(FakeElement::new());
        let session = attach(&video, &audio);

        drop(session);
        sleep(Duration::from_millis(10)).await;
        video.play().await.unwrap();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(audio.play_calls(), 0);
        assert!(audio.is_paused());
    }
}
