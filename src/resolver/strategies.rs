// Resolution strategies and the ordered fallback chain
//
// Each strategy either resolves the request or says "try next"; the chain
// walks them in order. Order is data: cache -> mirror race -> extraction.

use std::sync::Arc;

use async_trait::async_trait;

use super::cache::TtlCache;
use super::catalog::FormatCatalogBuilder;
use super::errors::ResolveError;
use super::mirrors::{normalize_fast_info, stream_path};
use super::models::{AdvancedVideoInfo, FastInfo, PlaylistInfo, SearchHit, StreamInfo, VideoId};
use super::race::EndpointRaceCoordinator;
use super::traits::{ExtractionSource, MirrorTransport};

/// Strategy names, reported with each resolution
pub const CACHE_STRATEGY: &str = "cache";
pub const MIRROR_STRATEGY: &str = "mirror-race";
pub const EXTRACTION_STRATEGY: &str = "local-extraction";

/// Values stored in the shared cache, one variant per namespace
#[derive(Debug, Clone)]
pub enum CachedPayload {
    Stream(StreamInfo),
    FastInfo(FastInfo),
    Search(Vec<SearchHit>),
    Playlist(PlaylistInfo),
    Advanced(AdvancedVideoInfo),
}

/// Prefixed cache keys; all namespaces share one cache instance
pub mod keys {
    use super::VideoId;

    pub fn stream(video_id: &VideoId, quality: &str) -> String {
        format!("{}_{}", video_id, quality)
    }

    pub fn fast_info(video_id: &VideoId) -> String {
        format!("fast_info_{}", video_id)
    }

    pub fn playlist(url: &str) -> String {
        format!("playlist_{}", url)
    }

    pub fn advanced(video_id: &VideoId) -> String {
        format!("advanced_{}", video_id)
    }

    pub fn search(query: &str, max_results: usize) -> String {
        format!("search_{}_{}", max_results, query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    pub video_id: VideoId,
    pub quality: String,
}

impl ResolveRequest {
    pub fn new(video_id: VideoId, quality: impl Into<String>) -> Self {
        Self {
            video_id,
            quality: quality.into(),
        }
    }
}

#[derive(Debug)]
pub enum StrategyOutcome<T> {
    Resolved(T),
    Next(ResolveError),
    /// Nothing to offer, not counted as a failed attempt
    Skip,
}

#[async_trait]
pub trait ResolutionStrategy<T>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, request: &ResolveRequest) -> StrategyOutcome<T>;
}

/// Ordered list of strategies tried in sequence
pub struct FallbackChain<T> {
    strategies: Vec<Box<dyn ResolutionStrategy<T>>>,
}

impl<T: Send> FallbackChain<T> {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn then(mut self, strategy: impl ResolutionStrategy<T> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// First resolved value and the name of the strategy that produced it
    pub async fn run(&self, request: &ResolveRequest) -> Result<(T, &'static str), ResolveError> {
        let mut attempts = Vec::new();

        for strategy in &self.strategies {
            tracing::debug!(
                "[Resolver] Trying {} for {}",
                strategy.name(),
                request.video_id
            );

            match strategy.attempt(request).await {
                StrategyOutcome::Resolved(value) => {
                    tracing::debug!("[Resolver] {} resolved {}", strategy.name(), request.video_id);
                    return Ok((value, strategy.name()));
                }
                StrategyOutcome::Next(err) => {
                    tracing::debug!("[Resolver] {} passed: {}", strategy.name(), err);
                    attempts.push(format!("{}: {}", strategy.name(), err));
                }
                StrategyOutcome::Skip => {}
            }
        }

        Err(ResolveError::AllSourcesFailed { attempts })
    }
}

impl<T: Send> Default for FallbackChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Which cache namespace a lookup reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    Stream,
    FastInfo,
}

/// Conversion from a cached payload into a strategy's output type
pub trait FromCached: Sized {
    fn from_cached(payload: CachedPayload) -> Option<Self>;
}

impl FromCached for StreamInfo {
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Stream(info) => Some(info),
            _ => None,
        }
    }
}

impl FromCached for FastInfo {
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::FastInfo(info) => Some(info),
            CachedPayload::Stream(info) => Some(FastInfo::Extracted(info)),
            _ => None,
        }
    }
}

/// Serves a request from the shared cache, if fresh
pub struct CacheLookup {
    cache: Arc<TtlCache<CachedPayload>>,
    namespace: CacheNamespace,
}

impl CacheLookup {
    pub fn new(cache: Arc<TtlCache<CachedPayload>>, namespace: CacheNamespace) -> Self {
        Self { cache, namespace }
    }

    fn key(&self, request: &ResolveRequest) -> String {
        match self.namespace {
            CacheNamespace::Stream => keys::stream(&request.video_id, &request.quality),
            CacheNamespace::FastInfo => keys::fast_info(&request.video_id),
        }
    }
}

#[async_trait]
impl<T: FromCached + Send + 'static> ResolutionStrategy<T> for CacheLookup {
    fn name(&self) -> &'static str {
        CACHE_STRATEGY
    }

    async fn attempt(&self, request: &ResolveRequest) -> StrategyOutcome<T> {
        let key = self.key(request);
        match self.cache.get(&key).and_then(T::from_cached) {
            Some(value) => {
                tracing::info!("[Resolver] Cache hit: {}", key);
                StrategyOutcome::Resolved(value)
            }
            None => StrategyOutcome::Skip,
        }
    }
}

/// Local extraction: basic info and formats fetched concurrently, then cataloged
pub struct LocalExtraction {
    source: Arc<dyn ExtractionSource>,
}

impl LocalExtraction {
    pub fn new(source: Arc<dyn ExtractionSource>) -> Self {
        Self { source }
    }

    async fn extract(&self, video_id: &VideoId) -> Result<StreamInfo, ResolveError> {
        let url = video_id.watch_url();
        let (info, formats) = tokio::join!(
            self.source.fetch_basic_info(&url),
            self.source.fetch_formats(&url)
        );
        let (info, formats) = (info?, formats?);

        if formats.is_empty() {
            return Err(ResolveError::NoPlayableFormat(video_id.to_string()));
        }

        Ok(StreamInfo {
            video_id: video_id.clone(),
            title: info.title,
            duration: info.duration_seconds,
            author: info.author,
            thumbnail: info.thumbnail,
            formats: FormatCatalogBuilder::build(&formats),
        })
    }
}

#[async_trait]
impl ResolutionStrategy<StreamInfo> for LocalExtraction {
    fn name(&self) -> &'static str {
        EXTRACTION_STRATEGY
    }

    async fn attempt(&self, request: &ResolveRequest) -> StrategyOutcome<StreamInfo> {
        match self.extract(&request.video_id).await {
            Ok(info) => StrategyOutcome::Resolved(info),
            Err(err) => {
                tracing::warn!(
                    "[Resolver] {} failed for {}: {}",
                    self.source.name(),
                    request.video_id,
                    err
                );
                StrategyOutcome::Next(err)
            }
        }
    }
}

#[async_trait]
impl ResolutionStrategy<FastInfo> for LocalExtraction {
    fn name(&self) -> &'static str {
        EXTRACTION_STRATEGY
    }

    async fn attempt(&self, request: &ResolveRequest) -> StrategyOutcome<FastInfo> {
        tracing::info!("[Resolver] Falling back to extraction for {}", request.video_id);
        match ResolutionStrategy::<StreamInfo>::attempt(self, request).await {
            StrategyOutcome::Resolved(info) => StrategyOutcome::Resolved(FastInfo::Extracted(info)),
            StrategyOutcome::Next(err) => StrategyOutcome::Next(err),
            StrategyOutcome::Skip => StrategyOutcome::Skip,
        }
    }
}

/// Races the mirror endpoints for the video's stream document
pub struct MirrorRace {
    coordinator: Arc<EndpointRaceCoordinator>,
    transport: Arc<dyn MirrorTransport>,
}

impl MirrorRace {
    pub fn new(coordinator: Arc<EndpointRaceCoordinator>, transport: Arc<dyn MirrorTransport>) -> Self {
        Self {
            coordinator,
            transport,
        }
    }
}

#[async_trait]
impl ResolutionStrategy<FastInfo> for MirrorRace {
    fn name(&self) -> &'static str {
        MIRROR_STRATEGY
    }

    async fn attempt(&self, request: &ResolveRequest) -> StrategyOutcome<FastInfo> {
        let path = stream_path(&request.video_id);
        let transport = &self.transport;
        let outcome = self
            .coordinator
            .race(|endpoint| {
                let path = path.clone();
                async move { transport.get_json(&endpoint, &path).await }
            })
            .await;

        match outcome.into_result() {
            Ok((endpoint, value)) => {
                let info = normalize_fast_info(&request.video_id, &endpoint, &value);
                tracing::info!("[Resolver] Fast info retrieved: {}", info.title);
                StrategyOutcome::Resolved(FastInfo::Mirror(info))
            }
            Err(err) => StrategyOutcome::Next(err),
        }
    }
}
