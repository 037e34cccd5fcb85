//! Local transcription backend. Runs whisper on the CPU instead of calling
//! the hosted engine; word timing is derived by splitting each recognized
//! segment evenly across its words.

use std::path::{Path, PathBuf};

use tokio::{fs, process::Command};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::{
    cache::get_model_dir,
    error::{Result, ShortreelError},
    types::{Transcription, WordStamp},
};

pub const MODEL_NAME: &str = "ggml-base.en-q5_1.bin";

pub async fn ensure_model(cache_dir: &Path) -> Result<PathBuf> {
    let download_url = format!(
        "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/{}",
        MODEL_NAME
    );
    let model_dir = get_model_dir(cache_dir);

    if !model_dir.exists() {
        fs::create_dir_all(&model_dir).await?;
    }

    let model_path = model_dir.join(MODEL_NAME);
    if !model_path.exists() {
        let output = Command::new("curl")
            .arg("-L")
            .arg(&download_url)
            .arg("-o")
            .arg(&model_path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ShortreelError::ModelDownloadFailed {
                url: download_url.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }
    }

    Ok(model_path)
}

/// Resample narration to the 16 kHz mono WAV whisper expects.
async fn prepare_wav(audio_path: &Path) -> Result<PathBuf> {
    let resampled = audio_path.with_extension("16k.wav");
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(audio_path)
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg(&resampled)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ShortreelError::TranscriptFailed {
            audio_path: audio_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(resampled)
}

/// Transcribe narration with a local whisper model.
pub async fn transcribe_local(audio_path: &Path, model_path: &Path) -> Result<Transcription> {
    let wav_path = prepare_wav(audio_path).await?;

    let transcript_failed = |reason: String| ShortreelError::TranscriptFailed {
        audio_path: audio_path.to_path_buf(),
        reason,
    };

    let mut reader =
        hound::WavReader::open(&wav_path).map_err(|e| transcript_failed(e.to_string()))?;
    let samples: Vec<f32> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()
        .map_err(|e| transcript_failed(e.to_string()))?
        .into_iter()
        .map(|s| s as f32 / i16::MAX as f32)
        .collect();

    let ctx_params = WhisperContextParameters {
        use_gpu: false,
        flash_attn: false,
        ..Default::default()
    };
    let model_path_str = model_path.to_string_lossy();
    let ctx = WhisperContext::new_with_params(&model_path_str, ctx_params)
        .map_err(|e| transcript_failed(format!("failed to load model: {}", e)))?;

    let params = FullParams::new(SamplingStrategy::Greedy { best_of: 5 });

    let mut state = ctx
        .create_state()
        .map_err(|e| transcript_failed(format!("failed to create state: {}", e)))?;
    state
        .full(params, &samples)
        .map_err(|e| transcript_failed(format!("failed to run model: {}", e)))?;

    let mut text = String::new();
    let mut words: Vec<WordStamp> = Vec::new();

    for segment in state.as_iter() {
        let seg_text = match segment.to_str() {
            Ok(s) => s,
            Err(_) => continue,
        };
        let seg_start = segment.start_timestamp() as f64 / 100.0;
        let seg_end = segment.end_timestamp() as f64 / 100.0;
        words.extend(split_words_evenly(seg_text, seg_start, seg_end));

        if !text.is_empty() && !seg_text.starts_with(' ') {
            text.push(' ');
        }
        text.push_str(seg_text);
    }

    let language_index = state.full_lang_id_from_state();
    let language = whisper_rs::get_lang_str(language_index);

    Ok(Transcription {
        text: text.trim().to_string(),
        words,
        language: language.map(str::to_string),
    })
}

/// Spread a segment's time window evenly across its words.
fn split_words_evenly(text: &str, start: f64, end: f64) -> Vec<WordStamp> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let step = (end - start) / words.len() as f64;
    words
        .iter()
        .enumerate()
        .map(|(i, word)| WordStamp {
            word: word.to_string(),
            start: start + i as f64 * step,
            end: start + (i + 1) as f64 * step,
        })
        .collect()
}
