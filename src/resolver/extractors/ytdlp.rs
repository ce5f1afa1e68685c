// YtDlpExtractor - metadata, formats, search and playlists via yt-dlp

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::OnceCell;

use super::config::{ExtractorConfig, ExtractorMode};
use crate::resolver::errors::ResolveError;
use crate::resolver::models::{
    BasicInfo, ChannelPlaylists, ChannelRef, Chapter, FormatDescriptor, PlaylistInfo, PlaylistItem,
    PlaylistSummary, SearchHit, VideoDetails,
};
use crate::resolver::traits::{ExtractionSource, PlaylistProvider, SearchProvider};
use crate::resolver::utils::{format_duration, parse_duration_text, run_output_with_timeout};

const ORIGIN: &str = "yt-dlp";

type Dump = Result<Value, ResolveError>;

pub struct YtDlpExtractor {
    config: ExtractorConfig,
    /// Backend chosen on first use
    backend: OnceCell<ExtractorMode>,
    /// Concurrent dumps of the same URL share one process run
    inflight: Mutex<HashMap<String, Arc<OnceCell<Dump>>>>,
}

impl YtDlpExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            backend: OnceCell::new(),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Python or CLI; Auto prefers Python when `import yt_dlp` works
    async fn backend(&self) -> ExtractorMode {
        *self
            .backend
            .get_or_init(|| async {
                match self.config.mode {
                    ExtractorMode::Auto => {
                        let probe = run_output_with_timeout(
                            &self.config.python,
                            vec!["-c".to_string(), "import yt_dlp".to_string()],
                            10,
                        )
                        .await;
                        let mode = match probe {
                            Ok(output) if output.status.success() => ExtractorMode::Python,
                            _ => ExtractorMode::Cli,
                        };
                        tracing::info!("[YtDlp] Auto mode selected: {}", mode);
                        mode
                    }
                    explicit => explicit,
                }
            })
            .await
    }

    /// Run yt-dlp with `args` and parse stdout as one JSON document
    async fn run_json(&self, args: Vec<String>) -> Result<Value, ResolveError> {
        let mut full = Vec::new();
        let program = match self.backend().await {
            ExtractorMode::Python => {
                full.push("-m".to_string());
                full.push("yt_dlp".to_string());
                self.config.python.clone()
            }
            _ => "yt-dlp".to_string(),
        };
        full.extend(self.config.common_args());
        full.extend(args);

        tracing::debug!("[YtDlp] Running: {} {}", program, full.join(" "));

        let output = run_output_with_timeout(&program, full, self.config.timeout_seconds).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!("[YtDlp] Failed: {}", stderr.trim());
            return Err(ResolveError::from_tool_output(ORIGIN, &stderr));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ResolveError::Parse(format!("Invalid JSON: {}", e)))
    }

    /// `--dump-json` for one video, shared between concurrent callers
    async fn dump(&self, url: &str) -> Dump {
        let cell = self
            .inflight
            .lock()
            .entry(url.to_string())
            .or_default()
            .clone();

        let result = cell
            .get_or_init(|| {
                self.run_json(vec![
                    "--dump-json".to_string(),
                    "--no-playlist".to_string(),
                    url.to_string(),
                ])
            })
            .await
            .clone();

        let mut inflight = self.inflight.lock();
        if inflight.get(url).map_or(false, |current| Arc::ptr_eq(current, &cell)) {
            inflight.remove(url);
        }
        result
    }

    async fn flat_playlist(&self, target: &str, limit: Option<usize>) -> Result<Value, ResolveError> {
        let mut args = vec![
            "--flat-playlist".to_string(),
            "--dump-single-json".to_string(),
        ];
        if let Some(limit) = limit {
            args.push("--playlist-end".to_string());
            args.push(limit.to_string());
        }
        args.push(target.to_string());
        self.run_json(args).await
    }
}

#[async_trait]
impl ExtractionSource for YtDlpExtractor {
    fn name(&self) -> &'static str {
        ORIGIN
    }

    async fn fetch_basic_info(&self, url: &str) -> Result<BasicInfo, ResolveError> {
        Ok(parse_basic_info(&self.dump(url).await?))
    }

    async fn fetch_formats(&self, url: &str) -> Result<Vec<FormatDescriptor>, ResolveError> {
        parse_formats(&self.dump(url).await?)
    }

    async fn fetch_details(&self, url: &str) -> Result<VideoDetails, ResolveError> {
        parse_details(&self.dump(url).await?)
    }
}

#[async_trait]
impl SearchProvider for YtDlpExtractor {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ResolveError> {
        tracing::info!("[YtDlp] Searching: {}", query);
        let target = format!("ytsearch{}:{}", max_results, query);
        Ok(parse_search(&self.flat_playlist(&target, None).await?))
    }
}

#[async_trait]
impl PlaylistProvider for YtDlpExtractor {
    async fn fetch_playlist(&self, url: &str, limit: usize) -> Result<PlaylistInfo, ResolveError> {
        tracing::info!("[YtDlp] Fetching playlist: {}", url);
        Ok(parse_playlist(url, &self.flat_playlist(url, Some(limit)).await?))
    }

    async fn fetch_channel_playlists(&self, url: &str) -> Result<ChannelPlaylists, ResolveError> {
        let target = format!("{}/playlists", url.trim_end_matches('/'));
        Ok(parse_channel_playlists(&self.flat_playlist(&target, None).await?))
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

fn count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_f64().map(|f| f as u64))
}

/// Last (largest) entry of a `thumbnails` array, or the `thumbnail` field
fn thumbnail(json: &Value) -> Option<String> {
    text(&json["thumbnail"]).or_else(|| {
        json["thumbnails"]
            .as_array()
            .and_then(|thumbs| thumbs.last())
            .and_then(|t| text(&t["url"]))
    })
}

fn channel(json: &Value) -> ChannelRef {
    ChannelRef {
        name: text(&json["channel"])
            .or_else(|| text(&json["uploader"]))
            .unwrap_or_else(|| "Unknown".to_string()),
        channel_id: text(&json["channel_id"]).unwrap_or_default(),
        url: text(&json["channel_url"])
            .or_else(|| text(&json["uploader_url"]))
            .unwrap_or_default(),
    }
}

fn parse_basic_info(json: &Value) -> BasicInfo {
    BasicInfo {
        title: text(&json["title"]).unwrap_or_else(|| "Unknown".to_string()),
        duration_seconds: count(&json["duration"]).unwrap_or(0),
        author: channel(json).name,
        thumbnail: thumbnail(json),
    }
}

fn parse_formats(json: &Value) -> Result<Vec<FormatDescriptor>, ResolveError> {
    let formats = json["formats"]
        .as_array()
        .ok_or_else(|| ResolveError::Parse("No formats array in JSON".to_string()))?;

    Ok(formats.iter().filter_map(parse_format).collect())
}

/// One yt-dlp format; storyboards and formats without a URL are dropped
fn parse_format(f: &Value) -> Option<FormatDescriptor> {
    let url = text(&f["url"])?;
    let has_video = f["vcodec"].as_str().map_or(false, |v| v != "none");
    let has_audio = f["acodec"].as_str().map_or(false, |a| a != "none");
    if !has_video && !has_audio {
        return None;
    }

    let height = count(&f["height"]).map(|h| h as u32);
    // format_note is "720p" for video, "medium" etc. for audio
    let quality_label = text(&f["format_note"])
        .filter(|note| note.ends_with('p') && note[..note.len() - 1].parse::<u32>().is_ok())
        .or_else(|| height.filter(|_| has_video).map(|h| format!("{}p", h)));

    Some(FormatDescriptor {
        url,
        quality_label,
        has_video,
        has_audio,
        container: text(&f["ext"]).unwrap_or_default(),
        bitrate: f["tbr"].as_f64().map(|kbps| (kbps * 1000.0) as u64),
        height: height.filter(|_| has_video),
        audio_bitrate: f["abr"].as_f64().map(|kbps| kbps as u32),
        format_id: text(&f["format_id"]),
        width: count(&f["width"]).map(|w| w as u32),
        fps: f["fps"].as_f64().map(|fps| fps as f32),
    })
}

fn parse_details(json: &Value) -> Result<VideoDetails, ResolveError> {
    let chapters = json["chapters"]
        .as_array()
        .map(|chapters| {
            chapters
                .iter()
                .map(|c| Chapter {
                    title: text(&c["title"]).unwrap_or_default(),
                    start_time: c["start_time"].as_f64().unwrap_or(0.0),
                    end_time: c["end_time"].as_f64().unwrap_or(0.0),
                })
                .collect()
        })
        .unwrap_or_default();

    let keywords = json["tags"]
        .as_array()
        .map(|tags| tags.iter().filter_map(text).collect())
        .unwrap_or_default();

    Ok(VideoDetails {
        basic: parse_basic_info(json),
        description: text(&json["description"]).unwrap_or_default(),
        channel: channel(json),
        view_count: count(&json["view_count"]).unwrap_or(0),
        like_count: count(&json["like_count"]).unwrap_or(0),
        category: json["categories"].get(0).and_then(text),
        is_live: json["is_live"].as_bool().unwrap_or(false),
        keywords,
        upload_date: text(&json["upload_date"]),
        chapters,
        formats: parse_formats(json)?,
    })
}

fn entries(json: &Value) -> impl Iterator<Item = &Value> {
    json["entries"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|entry| entry["id"].is_string())
}

fn parse_search(json: &Value) -> Vec<SearchHit> {
    entries(json)
        .map(|entry| {
            let duration_text = text(&entry["duration_string"])
                .or_else(|| count(&entry["duration"]).map(format_duration));
            SearchHit {
                id: text(&entry["id"]).unwrap_or_default(),
                title: text(&entry["title"]).unwrap_or_default(),
                author: channel(entry).name,
                duration: parse_duration_text(duration_text.as_deref()),
                duration_text,
                thumbnail: thumbnail(entry),
                views: count(&entry["view_count"]).map(|views| format!("{} views", views)),
                published_time: text(&entry["upload_date"]),
            }
        })
        .collect()
}

fn parse_playlist(url: &str, json: &Value) -> PlaylistInfo {
    let items: Vec<PlaylistItem> = entries(json)
        .enumerate()
        .map(|(i, entry)| {
            let id = text(&entry["id"]).unwrap_or_default();
            let duration = count(&entry["duration"]).unwrap_or(0);
            PlaylistItem {
                url: format!("https://www.youtube.com/watch?v={}", id),
                short_url: format!("https://youtu.be/{}", id),
                title: text(&entry["title"]).unwrap_or_default(),
                author: channel(entry),
                thumbnail: thumbnail(entry).unwrap_or_default(),
                duration,
                duration_text: format_duration(duration),
                index: i + 1,
                id,
            }
        })
        .collect();

    PlaylistInfo {
        id: text(&json["id"]).unwrap_or_default(),
        title: text(&json["title"]).unwrap_or_else(|| "Unknown".to_string()),
        description: text(&json["description"]).unwrap_or_default(),
        url: text(&json["webpage_url"]).unwrap_or_else(|| url.to_string()),
        visibility: text(&json["availability"]).unwrap_or_else(|| "public".to_string()),
        total_items: count(&json["playlist_count"])
            .map(|n| n as usize)
            .unwrap_or(items.len()),
        author: channel(json),
        thumbnail: thumbnail(json).unwrap_or_default(),
        views: count(&json["view_count"]).unwrap_or(0),
        last_updated: text(&json["modified_date"]).unwrap_or_default(),
        items,
    }
}

fn parse_channel_playlists(json: &Value) -> ChannelPlaylists {
    let owner = channel(json);
    ChannelPlaylists {
        channel_name: text(&json["channel"])
            .or_else(|| text(&json["uploader"]))
            .or_else(|| text(&json["title"]))
            .unwrap_or(owner.name),
        channel_id: text(&json["channel_id"]).unwrap_or_default(),
        playlists: entries(json)
            .map(|entry| {
                let id = text(&entry["id"]).unwrap_or_default();
                PlaylistSummary {
                    url: text(&entry["url"])
                        .unwrap_or_else(|| format!("https://www.youtube.com/playlist?list={}", id)),
                    title: text(&entry["title"]).unwrap_or_default(),
                    video_count: count(&entry["playlist_count"]),
                    thumbnail: thumbnail(entry),
                    id,
                }
            })
            .collect(),
    }
}
