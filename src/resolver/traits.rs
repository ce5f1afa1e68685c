// Collaborator traits consumed by the resolver

use async_trait::async_trait;

use super::errors::ResolveError;
use super::models::{
    BasicInfo, ChannelPlaylists, EndpointDescriptor, FormatDescriptor, PlaylistInfo, SearchHit,
    VideoDetails,
};

/// Local extraction library (metadata + raw formats for one video URL)
#[async_trait]
pub trait ExtractionSource: Send + Sync {
    /// Name of the source (for logging)
    fn name(&self) -> &'static str;

    async fn fetch_basic_info(&self, url: &str) -> Result<BasicInfo, ResolveError>;

    async fn fetch_formats(&self, url: &str) -> Result<Vec<FormatDescriptor>, ResolveError>;

    /// Full details plus formats, for the advanced lookup
    async fn fetch_details(&self, url: &str) -> Result<VideoDetails, ResolveError>;
}

/// Keyword search provider
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchHit>, ResolveError>;
}

/// Playlist and channel listing provider
#[async_trait]
pub trait PlaylistProvider: Send + Sync {
    async fn fetch_playlist(&self, url: &str, limit: usize) -> Result<PlaylistInfo, ResolveError>;

    async fn fetch_channel_playlists(&self, url: &str) -> Result<ChannelPlaylists, ResolveError>;
}

/// GET `{endpoint}/{path}` and parse the body as JSON.
///
/// Any non-200 status or unparseable body is a failure for that endpoint only.
#[async_trait]
pub trait MirrorTransport: Send + Sync {
    async fn get_json(
        &self,
        endpoint: &EndpointDescriptor,
        path: &str,
    ) -> Result<serde_json::Value, ResolveError>;
}
