// StreamResolver - cache-fronted resolution over extraction and mirrors
//
// Stream lookups run: cache -> local extraction.
// Fast-info lookups run: fast-info cache -> mirror race -> stream cache -> local extraction.
// Every public operation returns data; no error crosses this boundary.

use std::sync::Arc;

use futures::future::join_all;

use super::cache::{CacheStats, TtlCache};
use super::catalog::FormatCatalogBuilder;
use super::config::ResolverConfig;
use super::errors::ResolveError;
use super::extractors::{ExtractorConfig, YtDlpExtractor};
use super::mirrors::{HttpMirrorTransport, HEALTH_PATH};
use super::models::{
    AdvancedVideoInfo, BatchPlaylists, BatchResolution, ChannelPlaylists, FastInfo, HealthReport,
    PlaylistInfo, Resolution, ResolutionFailure, SearchResults, StreamInfo, VideoId,
};
use super::race::EndpointRaceCoordinator;
use super::strategies::{
    keys, CacheLookup, CacheNamespace, CachedPayload, FallbackChain, LocalExtraction, MirrorRace,
    ResolveRequest, CACHE_STRATEGY, EXTRACTION_STRATEGY, MIRROR_STRATEGY,
};
use super::traits::{ExtractionSource, MirrorTransport, PlaylistProvider, SearchProvider};

/// External collaborators the resolver delegates to
#[derive(Clone)]
pub struct Collaborators {
    pub extraction: Arc<dyn ExtractionSource>,
    pub search: Arc<dyn SearchProvider>,
    pub playlists: Arc<dyn PlaylistProvider>,
    pub transport: Arc<dyn MirrorTransport>,
}

impl Collaborators {
    /// yt-dlp for extraction, search and playlists; reqwest for the mirrors
    pub fn from_config(config: &ResolverConfig) -> Result<Self, ResolveError> {
        let extractor = Arc::new(YtDlpExtractor::new(
            ExtractorConfig::default()
                .with_mode(config.extractor_mode)
                .with_proxy(config.proxy.clone()),
        ));
        let transport = HttpMirrorTransport::new(config.endpoint_timeout(), config.proxy.as_deref())?;

        Ok(Self {
            extraction: extractor.clone(),
            search: extractor.clone(),
            playlists: extractor,
            transport: Arc::new(transport),
        })
    }
}

pub struct StreamResolver {
    config: ResolverConfig,
    cache: Arc<TtlCache<CachedPayload>>,
    coordinator: Arc<EndpointRaceCoordinator>,
    collaborators: Collaborators,
    stream_chain: FallbackChain<StreamInfo>,
    fast_info_chain: FallbackChain<FastInfo>,
}

impl StreamResolver {
    pub fn new(config: ResolverConfig, collaborators: Collaborators) -> Self {
        let cache = Arc::new(TtlCache::new(config.cache_capacity));
        let coordinator = Arc::new(EndpointRaceCoordinator::new(
            config.endpoints.clone(),
            config.endpoint_timeout(),
        ));

        let stream_chain = FallbackChain::new()
            .then(CacheLookup::new(cache.clone(), CacheNamespace::Stream))
            .then(LocalExtraction::new(collaborators.extraction.clone()));

        let fast_info_chain = FallbackChain::new()
            .then(CacheLookup::new(cache.clone(), CacheNamespace::FastInfo))
            .then(MirrorRace::new(coordinator.clone(), collaborators.transport.clone()))
            .then(CacheLookup::new(cache.clone(), CacheNamespace::Stream))
            .then(LocalExtraction::new(collaborators.extraction.clone()));

        tracing::debug!(
            "[Resolver] Stream chain: {:?}, fast-info chain: {:?}",
            stream_chain.names(),
            fast_info_chain.names()
        );

        Self {
            config,
            cache,
            coordinator,
            collaborators,
            stream_chain,
            fast_info_chain,
        }
    }

    /// Resolver wired to the real yt-dlp extractor and HTTP mirrors
    pub fn from_config(config: ResolverConfig) -> Result<Self, ResolveError> {
        let collaborators = Collaborators::from_config(&config)?;
        Ok(Self::new(config, collaborators))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &EndpointRaceCoordinator {
        &self.coordinator
    }

    /// Resolve one video into a stream catalog.
    ///
    /// `quality` only namespaces the cache entry; the catalog always carries
    /// every format plus the 720p-oriented picks.
    pub async fn resolve(&self, video_id: &str, quality: Option<&str>) -> Resolution<StreamInfo> {
        let id = match VideoId::parse(video_id) {
            Ok(id) => id,
            Err(err) => return Resolution::Failure(ResolutionFailure::for_video(video_id, &err)),
        };
        let quality = quality.unwrap_or(&self.config.default_quality);
        let request = ResolveRequest::new(id, quality);

        match self.stream_chain.run(&request).await {
            Ok((info, strategy)) => {
                if strategy != CACHE_STRATEGY {
                    self.cache.put(
                        keys::stream(&request.video_id, &request.quality),
                        CachedPayload::Stream(info.clone()),
                        self.config.ttl.stream(),
                    );
                }
                Resolution::Success(info)
            }
            Err(err) => {
                tracing::error!("[Resolver] Video stream error for {}: {}", request.video_id, err);
                Resolution::Failure(ResolutionFailure::for_video(video_id, &err))
            }
        }
    }

    /// Resolve many videos concurrently; one bad id never fails the batch
    pub async fn batch(&self, video_ids: &[String], quality: Option<&str>) -> BatchResolution<StreamInfo> {
        tracing::info!("[Resolver] Batch of {} videos", video_ids.len());
        let results = join_all(video_ids.iter().map(|id| self.resolve(id, quality))).await;

        let mut videos = Vec::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Resolution::Success(info) => videos.push(info),
                Resolution::Failure(failure) => errors.push(failure),
            }
        }

        BatchResolution {
            success: true,
            videos,
            errors,
        }
    }

    /// Mirror-backed quick lookup, falling back to the stream resolution
    pub async fn fast_info(&self, video_id: &str) -> Resolution<FastInfo> {
        let id = match VideoId::parse(video_id) {
            Ok(id) => id,
            Err(err) => return Resolution::Failure(ResolutionFailure::for_video(video_id, &err)),
        };
        let request = ResolveRequest::new(id, self.config.default_quality.clone());

        match self.fast_info_chain.run(&request).await {
            Ok((info, strategy)) => {
                match (strategy, &info) {
                    (MIRROR_STRATEGY, FastInfo::Mirror(_)) => self.cache.put(
                        keys::fast_info(&request.video_id),
                        CachedPayload::FastInfo(info.clone()),
                        self.config.ttl.fast_info(),
                    ),
                    (EXTRACTION_STRATEGY, FastInfo::Extracted(stream)) => self.cache.put(
                        keys::stream(&request.video_id, &request.quality),
                        CachedPayload::Stream(stream.clone()),
                        self.config.ttl.stream(),
                    ),
                    _ => {}
                }
                Resolution::Success(info)
            }
            Err(err) => {
                tracing::error!("[Resolver] Fast info error for {}: {}", request.video_id, err);
                Resolution::Failure(ResolutionFailure::for_video(video_id, &err))
            }
        }
    }

    pub async fn search(&self, query: &str, max_results: Option<usize>) -> Resolution<SearchResults> {
        let max_results = max_results.unwrap_or(self.config.search_limit);
        let key = keys::search(query, max_results);

        if let Some(CachedPayload::Search(videos)) = self.cache.get(&key) {
            tracing::info!("[Resolver] Search cache hit: {}", query);
            return Resolution::Success(SearchResults { videos });
        }

        match self.collaborators.search.search(query, max_results).await {
            Ok(videos) => {
                self.cache.put(
                    key,
                    CachedPayload::Search(videos.clone()),
                    self.config.ttl.search(),
                );
                Resolution::Success(SearchResults { videos })
            }
            Err(err) => {
                tracing::error!("[Resolver] Search error: {}", err);
                Resolution::Failure(ResolutionFailure {
                    error: err.to_string(),
                    video_id: None,
                    url: None,
                })
            }
        }
    }

    pub async fn playlist(&self, url: &str) -> Resolution<PlaylistInfo> {
        let key = keys::playlist(url);

        if let Some(CachedPayload::Playlist(info)) = self.cache.get(&key) {
            tracing::info!("[Resolver] Playlist cache hit: {}", url);
            return Resolution::Success(info);
        }

        match self
            .collaborators
            .playlists
            .fetch_playlist(url, self.config.playlist_limit)
            .await
        {
            Ok(info) => {
                tracing::info!("[Resolver] Playlist {} with {} items", info.title, info.items.len());
                self.cache.put(
                    key,
                    CachedPayload::Playlist(info.clone()),
                    self.config.ttl.playlist(),
                );
                Resolution::Success(info)
            }
            Err(err) => {
                tracing::error!("[Resolver] Playlist error for {}: {}", url, err);
                Resolution::Failure(ResolutionFailure::for_url(url, &err))
            }
        }
    }

    pub async fn batch_playlists(&self, urls: &[String]) -> BatchPlaylists {
        tracing::info!("[Resolver] Batch of {} playlists", urls.len());
        let results = join_all(urls.iter().map(|url| self.playlist(url))).await;

        let mut playlists = Vec::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Resolution::Success(info) => playlists.push(info),
                Resolution::Failure(failure) => errors.push(failure),
            }
        }

        BatchPlaylists {
            success: true,
            total_requested: urls.len(),
            successful: playlists.len(),
            failed: errors.len(),
            playlists,
            errors,
        }
    }

    /// Not cached
    pub async fn channel_playlists(&self, channel_url: &str) -> Resolution<ChannelPlaylists> {
        match self
            .collaborators
            .playlists
            .fetch_channel_playlists(channel_url)
            .await
        {
            Ok(channel) => Resolution::Success(channel),
            Err(err) => {
                tracing::error!("[Resolver] Channel playlists error for {}: {}", channel_url, err);
                Resolution::Failure(ResolutionFailure::for_url(channel_url, &err))
            }
        }
    }

    pub async fn advanced_info(&self, video_id: &str) -> Resolution<AdvancedVideoInfo> {
        let id = match VideoId::parse(video_id) {
            Ok(id) => id,
            Err(err) => return Resolution::Failure(ResolutionFailure::for_video(video_id, &err)),
        };
        let key = keys::advanced(&id);

        if let Some(CachedPayload::Advanced(info)) = self.cache.get(&key) {
            tracing::info!("[Resolver] Advanced cache hit: {}", id);
            return Resolution::Success(info);
        }

        let details = match self.collaborators.extraction.fetch_details(&id.watch_url()).await {
            Ok(details) => details,
            Err(err) => {
                tracing::error!("[Resolver] Advanced info error for {}: {}", id, err);
                return Resolution::Failure(ResolutionFailure::for_video(video_id, &err));
            }
        };

        let info = AdvancedVideoInfo {
            title: details.basic.title,
            description: details.description,
            duration: details.basic.duration_seconds,
            author: details.channel,
            views: details.view_count,
            likes: details.like_count,
            category: details.category,
            is_live: details.is_live,
            keywords: details.keywords,
            thumbnail: details.basic.thumbnail,
            upload_date: details.upload_date,
            formats: FormatCatalogBuilder::analyze(&details.formats),
            chapters: details.chapters,
            video_id: id,
        };

        self.cache.put(
            key,
            CachedPayload::Advanced(info.clone()),
            self.config.ttl.advanced(),
        );
        Resolution::Success(info)
    }

    pub async fn health_check(&self) -> HealthReport {
        self.coordinator
            .check_health(self.collaborators.transport.as_ref(), HEALTH_PATH)
            .await
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("[Resolver] Cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
