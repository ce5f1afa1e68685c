// Resolver configuration: defaults, optional JSON file, environment overrides

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::errors::ResolveError;
use super::extractors::ExtractorMode;
use super::models::EndpointDescriptor;

const DEFAULT_ENDPOINTS: [&str; 3] = [
    "https://siawaseok.duckdns.org",
    "https://3.net219117116.t-com.ne.jp",
    "https://219.117.116.3",
];

/// Time-to-live per cache namespace, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheTtls {
    pub stream: u64,
    pub fast_info: u64,
    pub playlist: u64,
    pub advanced: u64,
    pub search: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            stream: 300,
            fast_info: 180,
            playlist: 600,
            advanced: 300,
            search: 180,
        }
    }
}

impl CacheTtls {
    pub fn stream(&self) -> Duration {
        Duration::from_secs(self.stream)
    }

    pub fn fast_info(&self) -> Duration {
        Duration::from_secs(self.fast_info)
    }

    pub fn playlist(&self) -> Duration {
        Duration::from_secs(self.playlist)
    }

    pub fn advanced(&self) -> Duration {
        Duration::from_secs(self.advanced)
    }

    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search)
    }
}

/// Configuration for the stream resolver
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Mirror endpoints in preference order
    pub endpoints: Vec<EndpointDescriptor>,
    /// Per-endpoint request budget
    pub endpoint_timeout_secs: u64,
    pub cache_capacity: usize,
    pub ttl: CacheTtls,
    pub default_quality: String,
    pub playlist_limit: usize,
    pub search_limit: usize,
    /// SOCKS5/HTTP proxy URL for mirrors and extraction
    pub proxy: Option<String>,
    /// How the local yt-dlp fallback is invoked
    pub extractor_mode: ExtractorMode,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS
                .iter()
                .enumerate()
                .map(|(priority, url)| EndpointDescriptor::new(*url, priority as u32))
                .collect(),
            endpoint_timeout_secs: 8,
            cache_capacity: 1000,
            ttl: CacheTtls::default(),
            default_quality: "720p".to_string(),
            playlist_limit: 100,
            search_limit: 20,
            proxy: None,
            extractor_mode: ExtractorMode::Auto,
        }
    }
}

impl ResolverConfig {
    /// Defaults, then the config file (explicit path or the user config dir),
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ResolveError> {
        let candidate = path.map(Path::to_path_buf).or_else(Self::default_path);

        let mut config = match candidate {
            Some(file) if file.exists() => Self::from_file(&file)?,
            Some(file) if path.is_some() => {
                return Err(ResolveError::Parse(format!(
                    "Config file not found: {}",
                    file.display()
                )))
            }
            _ => Self::default(),
        };

        Ok(config.apply_env())
    }

    /// `<config_dir>/turbo-video/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("turbo-video").join("config.json"))
    }

    pub fn from_file(path: &Path) -> Result<Self, ResolveError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ResolveError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ResolveError> {
        serde_json::from_str(text).map_err(|e| ResolveError::Parse(format!("Invalid config: {}", e)))
    }

    fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Environment-style overrides; unparsable numbers are ignored
    fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup("TURBO_VIDEO_ENDPOINTS") {
            let endpoints = Self::parse_endpoint_list(&list);
            if !endpoints.is_empty() {
                tracing::debug!("[Config] {} endpoints from environment", endpoints.len());
                self = self.with_endpoints(endpoints);
            }
        }

        if let Some(proxy) = lookup("TURBO_VIDEO_PROXY") {
            if !proxy.trim().is_empty() {
                self = self.with_proxy(Some(proxy.trim().to_string()));
            }
        }

        if let Some(seconds) = lookup("TURBO_VIDEO_ENDPOINT_TIMEOUT").and_then(|v| v.trim().parse().ok()) {
            self = self.with_endpoint_timeout(seconds);
        }

        if let Some(capacity) = lookup("TURBO_VIDEO_CACHE_CAPACITY").and_then(|v| v.trim().parse().ok()) {
            self = self.with_cache_capacity(capacity);
        }

        self
    }

    /// Comma-separated base URLs; priority follows list order
    pub fn parse_endpoint_list(list: &str) -> Vec<EndpointDescriptor> {
        list.split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .enumerate()
            .map(|(priority, url)| EndpointDescriptor::new(url, priority as u32))
            .collect()
    }

    pub fn endpoint_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint_timeout_secs)
    }

    pub fn with_endpoints(mut self, endpoints: Vec<EndpointDescriptor>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_endpoint_timeout(mut self, seconds: u64) -> Self {
        self.endpoint_timeout_secs = seconds;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}
