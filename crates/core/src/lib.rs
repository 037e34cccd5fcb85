//! Shortreel Core Library
//!
//! Turns a text topic into a narrated, captioned vertical short video:
//! script generation and narration via hosted AI services, word-level
//! caption timing, scene bucketing, background footage sourcing, and
//! ffmpeg composition.

pub mod cache;
pub mod captions;
pub mod error;
pub mod format;
#[cfg(feature = "local-whisper")]
pub mod local_whisper;
pub mod provider;
pub mod render;
pub mod scenes;
pub mod script;
pub mod speech;
pub mod timeline;
pub mod transcribe;
pub mod types;
pub mod visuals;
pub mod workdir;

// Re-export commonly used items at crate root
pub use captions::{AlignedCaptions, UnmappedPolicy, align_captions, chunk_transcript};
pub use error::{Result, ShortreelError};
pub use format::{format_srt_time, format_timestamp, render_srt, write_srt};
#[cfg(feature = "local-whisper")]
pub use local_whisper::{ensure_model, transcribe_local};
pub use provider::{Provider, ProviderConfig};
pub use render::{FRAME_HEIGHT, FRAME_RATE, FRAME_WIDTH, Renderer, plan_segments};
pub use scenes::group_scenes;
pub use script::{ScriptGenerator, load_script, save_script};
pub use speech::{SpeechConfig, SpeechSynthesizer, wav_duration};
pub use timeline::{
    ResolvedTimeline, fill_gaps, intervals_from_scenes, merge_adjacent, resolve_timeline,
};
pub use transcribe::{SttConfig, Transcriber, load_transcription, save_transcription};
pub use types::{AssetInterval, Scene, TimedSegment, Transcription, WordStamp};
pub use visuals::{AssetSource, FluxImageSource, PexelsVideoSource, fetch_scene_asset};
pub use workdir::WorkDir;
