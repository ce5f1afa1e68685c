// Media element abstraction
//
// Mirrors the subset of an HTML media element the sync engine drives.
// Property setters take `&self`: elements are shared handles with their
// own interior state, and report changes as events on a broadcast channel.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::errors::PlaybackError;

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Play,
    Pause,
    Seeked,
    Ended,
    VolumeChange,
    RateChange,
    LoadedMetadata,
    CanPlay,
    Error(String),
}

impl MediaEvent {
    /// Either readiness signal after a source swap
    pub fn is_ready_signal(&self) -> bool {
        matches!(self, Self::LoadedMetadata | Self::CanPlay)
    }
}

#[async_trait]
pub trait MediaElement: Send + Sync {
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);

    /// Total length in seconds; 0 while unknown
    fn duration(&self) -> f64;

    fn is_paused(&self) -> bool;

    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);

    fn is_muted(&self) -> bool;
    fn set_muted(&self, muted: bool);

    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&self, rate: f64);

    fn source(&self) -> Option<String>;
    /// `None` detaches the current source
    fn set_source(&self, url: Option<&str>);

    /// Start loading the current source; readiness arrives as an event
    fn load(&self);

    async fn play(&self) -> Result<(), PlaybackError>;
    fn pause(&self);

    /// Events emitted after this call
    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;
}
