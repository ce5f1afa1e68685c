// Error types for the resolution layer

use std::time::Duration;

/// Failure of a single source, or of a whole resolution attempt.
///
/// Public resolver operations never hand these to callers as `Err`; they are
/// folded into a [`Resolution::Failure`](super::models::Resolution) instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// One data source (the extraction tool or one mirror) failed
    #[error("{origin} unavailable: {reason}")]
    SourceUnavailable { origin: String, reason: String },

    /// A mirror answered, but not with something we could parse
    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    /// A single source exceeded its time budget
    #[error("Timeout for {origin} after {}s", .after.as_secs())]
    Timeout { origin: String, after: Duration },

    /// Every source in the chain failed
    #[error("All sources failed: {}", .attempts.join("; "))]
    AllSourcesFailed { attempts: Vec<String> },

    /// Extraction succeeded but produced no usable format
    #[error("No playable format found for {0}")]
    NoPlayableFormat(String),

    /// Input is neither a video id nor a recognised video URL
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    /// yt-dlp (module or binary) could not be found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool output could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ResolveError {
    pub fn unavailable(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Classify the stderr of a failed extraction run.
    pub fn from_tool_output(origin: &str, stderr: &str) -> Self {
        let lower = stderr.to_lowercase();
        let message = stderr.trim().to_string();

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::SourceUnavailable {
                origin: origin.to_string(),
                reason: format!("network timeout: {}", message),
            };
        }

        if lower.contains("not found")
            || lower.contains("no such file")
            || lower.contains("command not found")
            || lower.contains("no module named")
        {
            return Self::ToolNotFound(message);
        }

        if lower.contains("parse") || lower.contains("json") {
            return Self::Parse(message);
        }

        if lower.contains("unsupported url") || lower.contains("invalid url") {
            return Self::InvalidVideoId(message);
        }

        Self::unavailable(origin, message)
    }
}
