// Test doubles for the resolver collaborators

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::errors::ResolveError;
use super::models::{
    BasicInfo, ChannelPlaylists, ChannelRef, EndpointDescriptor, FormatDescriptor, PlaylistInfo,
    PlaylistSummary, SearchHit, VideoDetails,
};
use super::traits::{ExtractionSource, MirrorTransport, PlaylistProvider, SearchProvider};

pub fn format(height: u32, video: bool, audio: bool) -> FormatDescriptor {
    FormatDescriptor {
        url: format!("https://cdn.example/{}-{}-{}", height, video, audio),
        quality_label: Some(format!("{}p", height)),
        has_video: video,
        has_audio: audio,
        container: "mp4".to_string(),
        bitrate: Some(height as u64 * 1000),
        height: Some(height),
        audio_bitrate: if audio && !video { Some(128) } else { None },
        format_id: None,
        width: None,
        fps: None,
    }
}

/// Extraction source that counts format fetches
pub struct CountingSource {
    formats: Vec<FormatDescriptor>,
    failure: Option<ResolveError>,
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn with_formats(formats: Vec<FormatDescriptor>) -> Self {
        Self {
            formats,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: ResolveError) -> Self {
        Self {
            formats: Vec::new(),
            failure: Some(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), ResolveError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExtractionSource for CountingSource {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn fetch_basic_info(&self, url: &str) -> Result<BasicInfo, ResolveError> {
        self.check()?;
        Ok(BasicInfo {
            title: format!("Title of {}", url),
            duration_seconds: 212,
            author: "Someone".to_string(),
            thumbnail: None,
        })
    }

    async fn fetch_formats(&self, _url: &str) -> Result<Vec<FormatDescriptor>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.formats.clone())
    }

    async fn fetch_details(&self, url: &str) -> Result<VideoDetails, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(VideoDetails {
            basic: self.fetch_basic_info(url).await?,
            description: "About".to_string(),
            channel: ChannelRef {
                name: "Someone".to_string(),
                channel_id: "UC123".to_string(),
                url: "https://www.youtube.com/channel/UC123".to_string(),
            },
            view_count: 10,
            like_count: 2,
            category: None,
            is_live: false,
            keywords: Vec::new(),
            upload_date: None,
            chapters: Vec::new(),
            formats: self.formats.clone(),
        })
    }
}

/// Mirror transport answering per endpoint base URL; unknown endpoints fail
#[derive(Default)]
pub struct ScriptedTransport {
    responses: HashMap<String, Value>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn respond(mut self, base_url: &str, body: Value) -> Self {
        self.responses.insert(base_url.to_string(), body);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MirrorTransport for ScriptedTransport {
    async fn get_json(&self, endpoint: &EndpointDescriptor, path: &str) -> Result<Value, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(&endpoint.base_url)
            .cloned()
            .ok_or_else(|| ResolveError::unavailable(endpoint.url_for(path), "HTTP 503"))
    }
}

/// Search and playlist provider; URLs containing "missing" fail
#[derive(Default)]
pub struct StaticCatalog {
    calls: AtomicUsize,
}

impl StaticCatalog {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StaticCatalog {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((0..max_results.min(3))
            .map(|i| SearchHit {
                id: format!("id{:09}", i),
                title: format!("{} #{}", query, i),
                author: "Someone".to_string(),
                duration_text: Some("3:05".to_string()),
                duration: 185,
                thumbnail: None,
                views: None,
                published_time: None,
            })
            .collect())
    }
}

#[async_trait]
impl PlaylistProvider for StaticCatalog {
    async fn fetch_playlist(&self, url: &str, limit: usize) -> Result<PlaylistInfo, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("missing") {
            return Err(ResolveError::unavailable(url, "playlist does not exist"));
        }
        Ok(PlaylistInfo {
            id: "PL1".to_string(),
            title: "Mix".to_string(),
            description: String::new(),
            url: url.to_string(),
            visibility: "public".to_string(),
            total_items: limit.min(2),
            author: ChannelRef::default(),
            thumbnail: String::new(),
            views: 0,
            last_updated: String::new(),
            items: Vec::new(),
        })
    }

    async fn fetch_channel_playlists(&self, url: &str) -> Result<ChannelPlaylists, ResolveError> {
        if url.contains("missing") {
            return Err(ResolveError::unavailable(url, "channel does not exist"));
        }
        Ok(ChannelPlaylists {
            channel_name: "Someone".to_string(),
            channel_id: "UC123".to_string(),
            playlists: vec![PlaylistSummary {
                id: "PL1".to_string(),
                title: "Mix".to_string(),
                url: "https://www.youtube.com/playlist?list=PL1".to_string(),
                video_count: Some(2),
                thumbnail: None,
            }],
        })
    }
}
