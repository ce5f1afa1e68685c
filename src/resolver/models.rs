// Common data models for stream resolution

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::errors::ResolveError;

lazy_static! {
    static ref BARE_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref URL_ID_RE: Regex = Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})"
    )
    .unwrap();
}

/// Opaque identifier of a source video
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Accept a bare id or any of the common watch/share URL shapes.
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let trimmed = input.trim();
        if BARE_ID_RE.is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        URL_ID_RE
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| ResolveError::InvalidVideoId(trimmed.to_string()))
    }

    /// Wrap an id without validation (ids are used verbatim for keys and URLs)
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    pub fn thumbnail_url(&self) -> String {
        format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw stream format as reported by a source. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    pub url: String,
    pub quality_label: Option<String>,
    pub has_video: bool,
    pub has_audio: bool,
    pub container: String,
    pub bitrate: Option<u64>,
    pub height: Option<u32>,
    pub audio_bitrate: Option<u32>,
    /// Source-specific format id (itag)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
}

impl FormatDescriptor {
    pub fn is_combined(&self) -> bool {
        self.has_video && self.has_audio
    }

    pub fn is_video_only(&self) -> bool {
        self.has_video && !self.has_audio
    }

    pub fn is_audio_only(&self) -> bool {
        !self.has_video && self.has_audio
    }

    /// `qualityLabel`, or `"{height}p"` when the label is missing
    pub fn display_quality(&self) -> String {
        match (&self.quality_label, self.height) {
            (Some(label), _) if !label.is_empty() => label.clone(),
            (_, Some(height)) => format!("{}p", height),
            _ => "unknown".to_string(),
        }
    }
}

/// A format in source order, tagged with its display quality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedFormat {
    pub quality: String,
    #[serde(flatten)]
    pub format: FormatDescriptor,
}

/// Normalized result of format selection.
///
/// `combined` and the `(video_only, audio_only)` pair are alternative playback
/// modes; at most one of them is used by a playback session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatCatalog {
    pub combined: Option<FormatDescriptor>,
    pub video_only: Option<FormatDescriptor>,
    pub audio_only: Option<FormatDescriptor>,
    pub all: Vec<AnnotatedFormat>,
}

impl FormatCatalog {
    /// True when either a combined stream or a complete split pair exists
    pub fn is_playable(&self) -> bool {
        self.combined.is_some() || (self.video_only.is_some() && self.audio_only.is_some())
    }

    pub fn requires_separate_audio(&self) -> bool {
        self.combined.is_none() && self.video_only.is_some() && self.audio_only.is_some()
    }
}

/// Title/duration/author/thumbnail from the extraction collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub title: String,
    pub duration_seconds: u64,
    pub author: String,
    pub thumbnail: Option<String>,
}

/// Channel reference used by playlists and detailed info
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRef {
    pub name: String,
    #[serde(rename = "channelID")]
    pub channel_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub title: String,
    pub start_time: f64,
    pub end_time: f64,
}

/// Everything the extractor knows about one video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub basic: BasicInfo,
    pub description: String,
    pub channel: ChannelRef,
    pub view_count: u64,
    pub like_count: u64,
    pub category: Option<String>,
    pub is_live: bool,
    pub keywords: Vec<String>,
    pub upload_date: Option<String>,
    pub chapters: Vec<Chapter>,
    pub formats: Vec<FormatDescriptor>,
}

/// Baseline stream resolution payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub video_id: VideoId,
    pub title: String,
    pub duration: u64,
    pub author: String,
    pub thumbnail: Option<String>,
    pub formats: FormatCatalog,
}

/// Direct stream entry reported by a mirror for one quality
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectStream {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    pub has_audio: bool,
}

/// Mirror-backed video info
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FastVideoInfo {
    pub video_id: VideoId,
    pub title: String,
    pub author: String,
    pub duration: u64,
    pub view_count: u64,
    pub description: String,
    pub thumbnail: String,
    /// Keyed by quality label, highest first
    #[serde(serialize_with = "serialize_pairs")]
    pub direct_stream_urls: Vec<(String, DirectStream)>,
    pub endpoint: String,
}

/// Fast info either comes from a mirror or, after fallback, from extraction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FastInfo {
    Mirror(FastVideoInfo),
    Extracted(StreamInfo),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub author: String,
    pub duration_text: Option<String>,
    /// Parsed from `duration_text`; 0 when unknown
    pub duration: u64,
    pub thumbnail: Option<String>,
    pub views: Option<String>,
    pub published_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub videos: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub short_url: String,
    pub author: ChannelRef,
    pub thumbnail: String,
    pub duration: u64,
    pub duration_text: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    pub visibility: String,
    pub total_items: usize,
    pub author: ChannelRef,
    pub thumbnail: String,
    pub views: u64,
    pub last_updated: String,
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    pub video_count: Option<u64>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPlaylists {
    pub channel_name: String,
    pub channel_id: String,
    pub playlists: Vec<PlaylistSummary>,
}

/// Best-pick analysis over the complete format list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatAnalysis {
    pub all: Vec<FormatDescriptor>,
    pub best_video_with_audio: Option<FormatDescriptor>,
    pub best_video_only: Option<FormatDescriptor>,
    pub best_audio_only: Option<FormatDescriptor>,
    pub available_qualities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedVideoInfo {
    pub video_id: VideoId,
    pub title: String,
    pub description: String,
    pub duration: u64,
    pub author: ChannelRef,
    pub views: u64,
    pub likes: u64,
    pub category: Option<String>,
    pub is_live: bool,
    pub keywords: Vec<String>,
    pub thumbnail: Option<String>,
    pub upload_date: Option<String>,
    pub formats: FormatAnalysis,
    pub chapters: Vec<Chapter>,
}

/// One remote mirror, ordered by preference (lower `priority` wins ties)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub base_url: String,
    #[serde(default)]
    pub priority: u32,
}

impl EndpointDescriptor {
    pub fn new(base_url: impl Into<String>, priority: u32) -> Self {
        Self {
            base_url: base_url.into(),
            priority,
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_check: String,
}

/// Per-endpoint health, in configured endpoint order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthReport {
    pub entries: Vec<(String, EndpointHealth)>,
}

impl HealthReport {
    pub fn get(&self, endpoint: &str) -> Option<&EndpointHealth> {
        self.entries
            .iter()
            .find(|(name, _)| name == endpoint)
            .map(|(_, health)| health)
    }
}

impl Serialize for HealthReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.entries, serializer)
    }
}

/// Serialize ordered `(key, value)` pairs as a JSON object, keeping order
fn serialize_pairs<S: Serializer, V: Serialize>(
    pairs: &[(String, V)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

/// Structured failure: what was requested and why it could not be served
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ResolutionFailure {
    pub fn for_video(video_id: &str, error: &ResolveError) -> Self {
        Self {
            error: error.to_string(),
            video_id: Some(video_id.to_string()),
            url: None,
        }
    }

    pub fn for_url(url: &str, error: &ResolveError) -> Self {
        Self {
            error: error.to_string(),
            video_id: None,
            url: Some(url.to_string()),
        }
    }
}

/// Outcome of one resolver operation; failures are data, never faults.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Success(T),
    Failure(ResolutionFailure),
}

impl<T> Resolution<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ResolutionFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

#[derive(Serialize)]
struct Flagged<'a, T: Serialize> {
    success: bool,
    #[serde(flatten)]
    inner: &'a T,
}

impl<T: Serialize> Serialize for Resolution<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success(value) => Flagged {
                success: true,
                inner: value,
            }
            .serialize(serializer),
            Self::Failure(failure) => Flagged {
                success: false,
                inner: failure,
            }
            .serialize(serializer),
        }
    }
}

/// Batch of video resolutions, split into successes and failures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResolution<T> {
    pub success: bool,
    pub videos: Vec<T>,
    pub errors: Vec<ResolutionFailure>,
}

/// Batch of playlist lookups
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlaylists {
    pub success: bool,
    pub total_requested: usize,
    pub successful: usize,
    pub failed: usize,
    pub playlists: Vec<PlaylistInfo>,
    pub errors: Vec<ResolutionFailure>,
}
