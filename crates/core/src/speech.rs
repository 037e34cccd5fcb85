use std::path::Path;

use reqwest::Client;
use tokio::fs;

use crate::error::{Result, ShortreelError};

/// Voice settings for narration synthesis.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub api_url: String,
    pub model: String,
    pub voice: String,
    pub speed: f64,
    pub env_var: &'static str,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/audio/speech".to_string(),
            model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            speed: 1.0,
            env_var: "OPENAI_API_KEY",
        }
    }
}

/// Hosted text-to-speech client producing WAV narration.
pub struct SpeechSynthesizer {
    config: SpeechConfig,
    api_key: String,
    client: Client,
}

impl SpeechSynthesizer {
    /// Build a synthesizer, validating its API key.
    pub fn new(config: SpeechConfig) -> Result<Self> {
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

    pub fn voice(&self) -> &str {
        &self.config.voice
    }

    /// Synthesize narration into a WAV file and return its duration in seconds.
    pub async fn synthesize(&self, text: &str, output_path: &Path) -> Result<f64> {
        // The engine reads newlines as hard pauses; flatten them first.
        let input = text.replace('\n', " ");

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.config.model,
                "voice": self.config.voice,
                "input": input,
                "response_format": "wav",
                "speed": self.config.speed,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ShortreelError::SpeechFailed {
                reason: format!("API returned {}: {}", status, body),
            });
        }

        let bytes = response.bytes().await?;
        fs::write(output_path, &bytes).await?;

        wav_duration(output_path)
    }
}

/// Duration of a WAV file in seconds.
pub fn wav_duration(path: &Path) -> Result<f64> {
    let reader = hound::WavReader::open(path).map_err(|e| ShortreelError::SpeechFailed {
        reason: format!("unreadable narration WAV {}: {}", path.display(), e),
    })?;
    let sample_rate = reader.spec().sample_rate;
    Ok(reader.duration() as f64 / sample_rate as f64)
}
