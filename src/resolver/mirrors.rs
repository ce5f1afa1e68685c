// Remote mirror endpoints: HTTP transport and response normalization

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::errors::ResolveError;
use super::models::{DirectStream, EndpointDescriptor, FastVideoInfo, VideoId};
use super::traits::MirrorTransport;

/// Qualities a mirror may report direct URLs for, highest first
const MIRROR_QUALITIES: [&str; 5] = ["1080p", "720p", "480p", "360p", "240p"];

/// Path of the per-video stream document on a mirror
pub fn stream_path(video_id: &VideoId) -> String {
    format!("api/stream/{}/type2", video_id)
}

/// Path probed by the health check
pub const HEALTH_PATH: &str = "api/trend";

/// `MirrorTransport` over reqwest
pub struct HttpMirrorTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpMirrorTransport {
    pub fn new(request_timeout: Duration, proxy: Option<&str>) -> Result<Self, ResolveError> {
        let mut builder = reqwest::Client::builder().timeout(request_timeout);

        if let Some(proxy_url) = proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| ResolveError::Parse(format!("Invalid proxy URL {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ResolveError::unavailable("http-client", e.to_string()))?;
        Ok(Self {
            client,
            request_timeout,
        })
    }
}

#[async_trait]
impl MirrorTransport for HttpMirrorTransport {
    async fn get_json(&self, endpoint: &EndpointDescriptor, path: &str) -> Result<Value, ResolveError> {
        let url = endpoint.url_for(path);
        tracing::debug!("[Mirror] GET {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                ResolveError::Timeout {
                    origin: endpoint.base_url.clone(),
                    after: self.request_timeout,
                }
            } else {
                ResolveError::unavailable(&endpoint.base_url, e.to_string())
            }
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ResolveError::unavailable(
                &endpoint.base_url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ResolveError::unavailable(&endpoint.base_url, e.to_string()))?;

        serde_json::from_str(&body)
            .map_err(|e| ResolveError::malformed(&endpoint.base_url, format!("JSON parse error: {}", e)))
    }
}

/// Normalize a mirror's stream document
pub fn normalize_fast_info(video_id: &VideoId, endpoint: &EndpointDescriptor, data: &Value) -> FastVideoInfo {
    let title = data["title"]
        .as_str()
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Video {}", video_id));

    let author = data["uploader"]
        .as_str()
        .or_else(|| data["author"].as_str())
        .filter(|a| !a.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let view_count = as_count(&data["view_count"])
        .or_else(|| as_count(&data["viewCount"]))
        .unwrap_or(0);

    FastVideoInfo {
        video_id: video_id.clone(),
        title,
        author,
        duration: as_count(&data["duration"]).unwrap_or(0),
        view_count,
        description: data["description"].as_str().unwrap_or("").to_string(),
        thumbnail: video_id.thumbnail_url(),
        direct_stream_urls: extract_stream_urls(data),
        endpoint: endpoint.base_url.clone(),
    }
}

/// Per-quality direct URLs: a string is a combined stream, an object a split pair
pub fn extract_stream_urls(data: &Value) -> Vec<(String, DirectStream)> {
    MIRROR_QUALITIES
        .iter()
        .filter_map(|quality| {
            let stream = match &data[*quality] {
                Value::String(url) => DirectStream {
                    url: Some(url.clone()),
                    video: None,
                    audio: None,
                    has_audio: true,
                },
                Value::Object(pair) => {
                    let audio = pair
                        .get("audio")
                        .and_then(|a| a["url"].as_str())
                        .map(str::to_string);
                    DirectStream {
                        url: None,
                        video: pair
                            .get("video")
                            .and_then(|v| v["url"].as_str())
                            .map(str::to_string),
                        has_audio: pair.get("audio").map_or(false, |a| !a.is_null()),
                        audio,
                    }
                }
                _ => return None,
            };
            Some((quality.to_string(), stream))
        })
        .collect()
}

/// Numbers may arrive as integers, floats or numeric strings
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0) as u64),
        _ => None,
    }
}
