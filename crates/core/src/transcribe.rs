use std::path::Path;

use reqwest::{Client, multipart};
use tokio::fs;

use crate::{
    error::{Result, ShortreelError},
    types::Transcription,
};

/// Hosted speech-to-text settings.
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub api_url: String,
    pub model: String,
    pub env_var: &'static str,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/audio/transcriptions".to_string(),
            model: "whisper-large-v3-turbo".to_string(),
            env_var: "GROQ_API_KEY",
        }
    }
}

/// Speech-to-text client returning word-level timestamps.
pub struct Transcriber {
    config: SttConfig,
    api_key: String,
    client: Client,
}

impl Transcriber {
    /// Build a transcriber, validating its API key.
    pub fn new(config: SttConfig) -> Result<Self> {
        let api_key =
            std::env::var(config.env_var).map_err(|_| ShortreelError::MissingApiKey {
                env_var: config.env_var.to_string(),
            })?;
        Ok(Self {
            config,
            api_key,
            client: Client::new(),
        })
    }

    /// Transcribe a narration WAV with per-word timestamps.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<Transcription> {
        let bytes = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ShortreelError::TranscriptFailed {
                audio_path: audio_path.to_path_buf(),
                reason: format!("API returned {}: {}", status, body),
            });
        }

        let transcription: Transcription = response.json().await?;
        if transcription.words.is_empty() {
            return Err(ShortreelError::TranscriptFailed {
                audio_path: audio_path.to_path_buf(),
                reason: "no word timestamps in transcription".to_string(),
            });
        }

        Ok(transcription)
    }
}

/// Load a transcription from a cached file
pub async fn load_transcription(path: &Path) -> Result<Transcription> {
    let json_content = fs::read_to_string(path).await?;
    let transcription: Transcription = serde_json::from_str(&json_content)?;
    Ok(transcription)
}

/// Save a transcription to a file
pub async fn save_transcription(transcription: &Transcription, path: &Path) -> Result<()> {
    let pretty_json = serde_json::to_string_pretty(transcription)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
