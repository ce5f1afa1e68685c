// Playback module - keeps a muted video and a separate audio track in step

pub mod config;
pub mod element;
pub mod engine;
pub mod errors;
pub mod notify;
pub mod retry;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SyncConfig;
pub use element::{MediaElement, MediaEvent};
pub use engine::{PlaybackSource, PlaybackSyncEngine, SyncState};
pub use errors::PlaybackError;
pub use notify::{NoticeLevel, Notifier, TracingNotifier};
pub use retry::{play_with_retry, PlayOutcome, RetryPolicy};
pub use session::{correct_drift, SyncSession};
