use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShortreelError {
    #[error("Language model reply was unusable: {reason}")]
    CompletionFailed { reason: String },

    #[error("Speech synthesis failed: {reason}")]
    SpeechFailed { reason: String },

    #[error("Transcription failed for {audio_path:?}: {reason}")]
    TranscriptFailed { audio_path: PathBuf, reason: String },

    #[error("No timestamp found for caption chunk #{index}: {chunk:?}")]
    UnmappedChunk { index: usize, chunk: String },

    #[error("Asset generation failed for {query:?}: {reason}")]
    AssetFailed { query: String, reason: String },

    #[error("No scene produced a usable video asset")]
    NoUsableAssets,

    #[error("Render step '{step}' failed: {reason}")]
    RenderFailed { step: &'static str, reason: String },

    #[error("Model download failed from {url}: {reason}")]
    ModelDownloadFailed { url: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },
}

pub type Result<T> = std::result::Result<T, ShortreelError>;
