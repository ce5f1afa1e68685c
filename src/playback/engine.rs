// PlaybackSyncEngine - owns the video element, the lazily created audio
// element and the single live SyncSession between them.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tokio::time::timeout;

use super::config::SyncConfig;
use super::element::{MediaElement, MediaEvent};
use super::errors::PlaybackError;
use super::notify::{NoticeLevel, Notifier, TracingNotifier};
use super::retry::{play_with_retry, PlayOutcome};
use super::session::SyncSession;
use crate::resolver::models::FormatCatalog;

/// What to put on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// One stream with both tracks (or video without any audio track)
    Combined { url: String },
    /// Muted video plus a separately hosted audio track
    Split { video_url: String, audio_url: String },
}

impl PlaybackSource {
    /// Combined pick first, else the video-only/audio-only pair
    pub fn from_catalog(catalog: &FormatCatalog) -> Option<Self> {
        if let Some(combined) = &catalog.combined {
            return Some(Self::Combined {
                url: combined.url.clone(),
            });
        }

        match (&catalog.video_only, &catalog.audio_only) {
            (Some(video), Some(audio)) => Some(Self::Split {
                video_url: video.url.clone(),
                audio_url: audio.url.clone(),
            }),
            (Some(video), None) => Some(Self::Combined {
                url: video.url.clone(),
            }),
            _ => None,
        }
    }

    pub fn video_url(&self) -> &str {
        match self {
            Self::Combined { url } => url,
            Self::Split { video_url, .. } => video_url,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No split session
    Idle,
    /// Session live, mirroring and correcting drift
    Syncing,
    /// Session ended with the video
    TornDown,
}

type AudioFactory = Box<dyn Fn() -> Arc<dyn MediaElement> + Send + Sync>;

pub struct PlaybackSyncEngine {
    video: Arc<dyn MediaElement>,
    audio: Option<Arc<dyn MediaElement>>,
    audio_factory: AudioFactory,
    session: Option<SyncSession>,
    source: Option<PlaybackSource>,
    notifier: Arc<dyn Notifier>,
    config: SyncConfig,
}

impl PlaybackSyncEngine {
    /// `audio_factory` runs the first time a split source is selected
    pub fn new(
        video: Arc<dyn MediaElement>,
        audio_factory: impl Fn() -> Arc<dyn MediaElement> + Send + Sync + 'static,
    ) -> Self {
        Self {
            video,
            audio: None,
            audio_factory: Box::new(audio_factory),
            session: None,
            source: None,
            notifier: Arc::new(TracingNotifier),
            config: SyncConfig::default(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> SyncState {
        match &self.session {
            None => SyncState::Idle,
            Some(session) if session.is_active() => SyncState::Syncing,
            Some(_) => SyncState::TornDown,
        }
    }

    pub fn source(&self) -> Option<&PlaybackSource> {
        self.source.as_ref()
    }

    pub fn audio(&self) -> Option<&Arc<dyn MediaElement>> {
        self.audio.as_ref()
    }

    /// Audio element, if the active source is split
    fn split_audio(&self) -> Option<Arc<dyn MediaElement>> {
        match self.source {
            Some(PlaybackSource::Split { .. }) => self.audio.clone(),
            _ => None,
        }
    }

    fn audio_element(&mut self) -> Arc<dyn MediaElement> {
        if let Some(audio) = &self.audio {
            return audio.clone();
        }
        tracing::debug!("[Engine] Creating audio element");
        let audio = (self.audio_factory)();
        self.audio = Some(audio.clone());
        audio
    }

    /// Drop the previous session before a new one may exist
    fn start_session(&mut self, audio: Arc<dyn MediaElement>) {
        self.session = None;
        self.session = Some(SyncSession::attach(self.video.clone(), audio, self.config));
    }

    /// Swap to `source`, keeping position and play state.
    ///
    /// Waits up to the ready timeout for the video to report metadata or
    /// can-play. On timeout the user is warned and playback is not resumed.
    pub async fn change_quality(&mut self, source: PlaybackSource) -> Result<(), PlaybackError> {
        let position = self.video.current_time();
        let was_playing = !self.video.is_paused();
        tracing::info!(
            "[Engine] Switching source at {:.1}s (playing: {})",
            position,
            was_playing
        );

        self.notifier.loading(true);

        self.session = None;
        if let Some(audio) = &self.audio {
            audio.pause();
            audio.set_source(None);
        }

        match &source {
            PlaybackSource::Split { .. } => self.video.set_muted(true),
            PlaybackSource::Combined { .. } => {
                self.video.set_muted(false);
                self.video.set_volume(self.config.combined_volume);
            }
        }
        self.video.set_source(Some(source.video_url()));

        let split_audio = match &source {
            PlaybackSource::Split { audio_url, .. } => {
                let audio = self.audio_element();
                audio.set_source(Some(audio_url.as_str()));
                audio.set_muted(false);
                self.start_session(audio.clone());
                Some(audio)
            }
            PlaybackSource::Combined { .. } => None,
        };
        self.source = Some(source);

        let ready = self.video.subscribe();
        self.video.load();
        if let Some(audio) = &split_audio {
            audio.load();
        }

        let outcome = match timeout(self.config.ready_timeout, wait_until_ready(ready)).await {
            Ok(result) => result,
            Err(_) => Err(PlaybackError::LoadTimeout {
                after: self.config.ready_timeout,
            }),
        };
        self.notifier.loading(false);

        match outcome {
            Ok(()) => {
                self.video.set_current_time(position);
                if let Some(audio) = &split_audio {
                    audio.set_current_time(position);
                }
                if was_playing {
                    // The session mirrors the resulting Play onto the audio element
                    if let Err(err) = self.video.play().await {
                        tracing::info!("[Engine] Auto-play prevented: {}", err);
                        self.notifier
                            .notify(NoticeLevel::Info, "Tap the video to resume playback");
                    }
                }
                Ok(())
            }
            Err(err @ PlaybackError::LoadTimeout { .. }) => {
                self.notifier
                    .notify(NoticeLevel::Warning, "Video is taking a long time to load");
                Err(err)
            }
            Err(err) => {
                self.notifier.notify(NoticeLevel::Danger, "Failed to load video");
                Err(err)
            }
        }
    }

    /// Play or pause; in split mode a closed session is re-attached first
    pub async fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        if !self.video.is_paused() {
            self.video.pause();
            if let Some(audio) = &self.audio {
                if !audio.is_paused() {
                    audio.pause();
                }
            }
            return Ok(());
        }

        if let Some(audio) = self.split_audio() {
            if self.state() != SyncState::Syncing {
                self.start_session(audio);
            }
        }

        self.video.play().await.map_err(|err| {
            tracing::warn!("[Engine] Video play failed: {}", err);
            err
        })
    }

    /// Manual recovery of a split audio track left paused by rejected plays
    pub async fn resume_audio(&self) -> Option<PlayOutcome> {
        let audio = self.split_audio()?;
        Some(play_with_retry(audio.as_ref(), self.config.play_retry, || true).await)
    }

    /// Relative seek, clamped to `[0, duration]`; ignored while the duration is unknown
    pub fn seek_by(&self, delta: f64) {
        let duration = self.video.duration();
        if duration <= 0.0 {
            return;
        }
        self.seek_to((self.video.current_time() + delta).clamp(0.0, duration));
    }

    /// Seek to `percent` of the duration; ignored while the duration is unknown
    pub fn seek_to_percent(&self, percent: f64) {
        let duration = self.video.duration();
        if duration > 0.0 {
            self.seek_to(duration * percent / 100.0);
        }
    }

    fn seek_to(&self, seconds: f64) {
        self.video.set_current_time(seconds);
        if let Some(audio) = self.split_audio() {
            audio.set_current_time(seconds);
        }
    }

    /// Relative volume change, clamped to `[0, 1]`
    pub fn change_volume(&self, delta: f64) {
        let volume = (self.video.volume() + delta).clamp(0.0, 1.0);
        self.video.set_volume(volume);
        if let Some(audio) = self.split_audio() {
            audio.set_volume(volume);
        }
    }

    /// Mutes the audible element: the audio track when split, the video otherwise
    pub fn toggle_mute(&self) {
        match self.split_audio() {
            Some(audio) => audio.set_muted(!audio.is_muted()),
            None => self.video.set_muted(!self.video.is_muted()),
        }
    }

    pub fn set_playback_rate(&self, rate: f64) {
        self.video.set_playback_rate(rate);
        if let Some(audio) = self.split_audio() {
            audio.set_playback_rate(rate);
        }
    }
}

async fn wait_until_ready(mut events: Receiver<MediaEvent>) -> Result<(), PlaybackError> {
    loop {
        match events.recv().await {
            Ok(event) if event.is_ready_signal() => return Ok(()),
            Ok(MediaEvent::Error(message)) => return Err(PlaybackError::LoadFailed(message)),
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => {
                return Err(PlaybackError::LoadFailed("media element closed".to_string()))
            }
        }
    }
}
