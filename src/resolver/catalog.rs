// FormatCatalogBuilder - unified format selection logic
//
// Turns the raw format list of a source into a playable catalog:
// - combined (video+audio) pick, preferring 720p
// - split video-only/audio-only pair when no combined stream qualifies
// - the full list in source order with display qualities

use std::cmp::Reverse;

use super::models::{AnnotatedFormat, FormatAnalysis, FormatCatalog, FormatDescriptor};

const TARGET_LABEL: &str = "720p";
const TARGET_HEIGHT: u32 = 720;
const MIN_COMBINED_HEIGHT: u32 = 480;

/// Format selector with best-pick rules. Pure and deterministic.
pub struct FormatCatalogBuilder;

impl FormatCatalogBuilder {
    /// Build a catalog from raw formats. Empty input yields an all-empty
    /// catalog, which callers treat as "no playable format".
    pub fn build(formats: &[FormatDescriptor]) -> FormatCatalog {
        let combined: Vec<&FormatDescriptor> = formats.iter().filter(|f| f.is_combined()).collect();
        let video_only: Vec<&FormatDescriptor> =
            formats.iter().filter(|f| f.is_video_only()).collect();
        let audio_only: Vec<&FormatDescriptor> =
            formats.iter().filter(|f| f.is_audio_only()).collect();

        let combined_pick = Self::pick_combined(&combined);

        let (video_pick, audio_pick) = if combined_pick.is_none() {
            let video = Self::pick_video_only(&video_only);
            let audio = video.and_then(|_| Self::pick_best_audio(&audio_only));
            (video, audio)
        } else {
            (None, None)
        };

        FormatCatalog {
            combined: combined_pick.cloned(),
            video_only: video_pick.cloned(),
            audio_only: audio_pick.cloned(),
            all: formats
                .iter()
                .map(|f| AnnotatedFormat {
                    quality: f.display_quality(),
                    format: f.clone(),
                })
                .collect(),
        }
    }

    /// Detailed best-pick analysis used by the advanced info lookup
    pub fn analyze(formats: &[FormatDescriptor]) -> FormatAnalysis {
        let best_video_with_audio = formats
            .iter()
            .find(|f| f.is_combined() && Self::has_label(f, "720p"))
            .or_else(|| {
                formats
                    .iter()
                    .find(|f| f.is_combined() && f.height.map_or(false, |h| h >= 480))
            });

        let best_video_only = formats
            .iter()
            .find(|f| f.is_video_only() && Self::has_label(f, "1080p"))
            .or_else(|| {
                formats
                    .iter()
                    .find(|f| f.is_video_only() && f.height.map_or(false, |h| h >= 720))
            });

        let audio: Vec<&FormatDescriptor> = formats.iter().filter(|f| f.is_audio_only()).collect();

        let mut available_qualities: Vec<String> = Vec::new();
        for label in formats.iter().filter_map(|f| f.quality_label.as_ref()) {
            if !available_qualities.contains(label) {
                available_qualities.push(label.clone());
            }
        }

        FormatAnalysis {
            all: formats.to_vec(),
            best_video_with_audio: best_video_with_audio.cloned(),
            best_video_only: best_video_only.cloned(),
            best_audio_only: Self::pick_best_audio(&audio).cloned(),
            available_qualities,
        }
    }

    /// Exact 720p label, then exact 720 height, then tallest >= 480p
    fn pick_combined<'a>(formats: &[&'a FormatDescriptor]) -> Option<&'a FormatDescriptor> {
        if let Some(exact) = formats.iter().find(|f| Self::has_label(f, TARGET_LABEL)) {
            return Some(*exact);
        }

        if let Some(by_height) = formats.iter().find(|f| f.height == Some(TARGET_HEIGHT)) {
            return Some(*by_height);
        }

        formats
            .iter()
            .filter(|f| f.height.map_or(false, |h| h >= MIN_COMBINED_HEIGHT))
            // min_by_key keeps the first of equal keys
            .min_by_key(|f| Reverse(f.height.unwrap_or(0)))
            .copied()
    }

    /// 720p video-only stream, else the tallest one available
    fn pick_video_only<'a>(formats: &[&'a FormatDescriptor]) -> Option<&'a FormatDescriptor> {
        let exact = formats
            .iter()
            .filter(|f| f.height == Some(TARGET_HEIGHT) || Self::has_label(f, TARGET_LABEL))
            .min_by_key(|f| Reverse(f.height.unwrap_or(0)))
            .copied();

        if let Some(exact) = exact {
            return Some(exact);
        }

        formats
            .iter()
            .min_by_key(|f| Reverse(f.height.unwrap_or(0)))
            .copied()
    }

    /// Highest audio bitrate, first occurrence on ties
    fn pick_best_audio<'a>(formats: &[&'a FormatDescriptor]) -> Option<&'a FormatDescriptor> {
        formats
            .iter()
            .min_by_key(|f| Reverse(f.audio_bitrate.unwrap_or(0)))
            .copied()
    }

    fn has_label(format: &FormatDescriptor, label: &str) -> bool {
        format.quality_label.as_deref() == Some(label)
    }
}
