// Local extraction collaborator backed by yt-dlp
//
// Two ways to run it:
// - Python module (`python3 -m yt_dlp`) - better at YouTube bot checks
// - Native binary (`yt-dlp`) - no Python needed

mod config;
mod ytdlp;

pub use config::{ExtractorConfig, ExtractorMode};
pub use ytdlp::YtDlpExtractor;
