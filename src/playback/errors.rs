// Error types for the playback layer

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// play() refused, usually by an autoplay policy
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// The new source did not become playable in time
    #[error("Source not ready after {}s", .after.as_secs())]
    LoadTimeout { after: Duration },

    /// The element reported an error while loading
    #[error("Failed to load source: {0}")]
    LoadFailed(String),
}
