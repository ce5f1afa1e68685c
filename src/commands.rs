// CLI commands - one JSON document per invocation on stdout

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use crate::resolver::{ResolveError, StreamResolver};

#[derive(Parser)]
#[command(name = "turbo-video")]
#[command(about = "Resolve videos into playable stream catalogs")]
pub struct Cli {
    /// Config file (defaults to <config dir>/turbo-video/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Stream catalog for one video
    Stream {
        video_id: String,
        quality: Option<String>,
    },
    /// Stream catalogs for comma-separated video ids
    Batch {
        video_ids: String,
        quality: Option<String>,
    },
    /// Keyword search
    Search { query: String, max: Option<usize> },
    /// Quick lookup through the mirror endpoints
    FastInfo { video_id: String },
    /// Probe every mirror endpoint
    HealthCheck,
    /// Playlist metadata and items
    Playlist { url: String },
    /// Full details with format analysis
    AdvancedInfo { video_id: String },
    /// Comma-separated playlist URLs
    BatchPlaylists { urls: String },
    /// Playlists of a channel
    ChannelPlaylists { url: String },
}

/// JSON document plus whether the command succeeded
#[derive(Debug)]
pub struct Report {
    pub document: Value,
    pub success: bool,
}

impl Report {
    fn new<T: Serialize>(value: &T, success: bool) -> Result<Self, ResolveError> {
        let document = serde_json::to_value(value)
            .map_err(|e| ResolveError::Parse(format!("Failed to serialize output: {}", e)))?;
        Ok(Self { document, success })
    }

    /// Document for errors raised outside the resolver
    pub fn error(err: &dyn std::fmt::Display) -> Self {
        Self {
            document: json!({ "success": false, "error": err.to_string() }),
            success: false,
        }
    }
}

/// Run one command against the resolver
pub async fn handle_command(resolver: &StreamResolver, command: Commands) -> Result<Report, ResolveError> {
    match command {
        Commands::Stream { video_id, quality } => {
            let result = resolver.resolve(&video_id, quality.as_deref()).await;
            Report::new(&result, result.is_success())
        }
        Commands::Batch { video_ids, quality } => {
            let ids = split_list(&video_ids);
            let result = resolver.batch(&ids, quality.as_deref()).await;
            Report::new(&result, result.success)
        }
        Commands::Search { query, max } => {
            let result = resolver.search(&query, max).await;
            Report::new(&result, result.is_success())
        }
        Commands::FastInfo { video_id } => {
            let result = resolver.fast_info(&video_id).await;
            Report::new(&result, result.is_success())
        }
        Commands::HealthCheck => Report::new(&resolver.health_check().await, true),
        Commands::Playlist { url } => {
            let result = resolver.playlist(&url).await;
            Report::new(&result, result.is_success())
        }
        Commands::AdvancedInfo { video_id } => {
            let result = resolver.advanced_info(&video_id).await;
            Report::new(&result, result.is_success())
        }
        Commands::BatchPlaylists { urls } => {
            let result = resolver.batch_playlists(&split_list(&urls)).await;
            Report::new(&result, result.success)
        }
        Commands::ChannelPlaylists { url } => {
            let result = resolver.channel_playlists(&url).await;
            Report::new(&result, result.is_success())
        }
    }
}

/// "a, b,,c" -> ["a", "b", "c"]
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
