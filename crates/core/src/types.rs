use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Narration transcription with per-word timing, as returned by the
/// speech-to-text engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    #[serde(default)]
    pub words: Vec<WordStamp>,
    #[serde(default)]
    pub language: Option<String>,
}

/// One recognized word with its start/end offsets in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordStamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// A caption-sized slice of the narration with its time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

impl TimedSegment {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            duration: end - start,
        }
    }
}

/// A fixed-width time bucket holding the captions spoken inside it and,
/// once the asset stage has run, the clip shown behind them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub prompt_text: String,
    pub captions: Vec<TimedSegment>,
    pub video_path: Option<PathBuf>,
}

/// A time range paired with the clip to show during it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInterval {
    pub start: f64,
    pub end: f64,
    pub asset: Option<PathBuf>,
}
