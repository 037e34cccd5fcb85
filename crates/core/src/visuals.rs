//! Background footage for scenes: generated stills animated with a slow
//! zoom, or portrait stock video.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tokio::{fs, process::Command};
use uuid::Uuid;

use crate::{
    error::{Result, ShortreelError},
    render::{FRAME_HEIGHT, FRAME_RATE, FRAME_WIDTH},
    script::ScriptGenerator,
    types::Scene,
};

/// A provider of background clips.
#[async_trait]
pub trait AssetSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce a clip for the query, stored under `out_dir`, sized for a
    /// scene of `duration` seconds.
    async fn fetch_clip(&self, query: &str, duration: f64, out_dir: &Path) -> Result<PathBuf>;
}

/// Fetch one clip for a scene, trying each suggested query until one works.
pub async fn fetch_scene_asset(
    generator: &ScriptGenerator,
    source: &dyn AssetSource,
    scene: &Scene,
    clips_dir: &Path,
) -> Result<PathBuf> {
    let queries = generator.search_queries(&scene.prompt_text).await?;
    let mut last_reason = String::new();
    for query in &queries {
        match source.fetch_clip(query, scene.duration, clips_dir).await {
            Ok(path) => return Ok(path),
            Err(e) => last_reason = e.to_string(),
        }
    }
    Err(ShortreelError::AssetFailed {
        query: queries.join(", "),
        reason: last_reason,
    })
}

const FLUX_API_URL: &str = "https://api.together.xyz/v1/images/generations";
const FLUX_MODEL: &str = "black-forest-labs/FLUX.1-schnell-Free";

/// Generates a portrait still per query and animates it into a clip.
pub struct FluxImageSource {
    api_key: String,
    client: Client,
}

impl FluxImageSource {
    /// Build the source, validating its API key.
    pub fn new() -> Result<Self> {
        let api_key = std::env::var("TOGETHER_API_KEY").map_err(|_| {
            ShortreelError::MissingApiKey {
                env_var: "TOGETHER_API_KEY".to_string(),
            }
        })?;
        Ok(Self {
            api_key,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl AssetSource for FluxImageSource {
    fn name(&self) -> &'static str {
        "flux"
    }

    async fn fetch_clip(&self, query: &str, duration: f64, out_dir: &Path) -> Result<PathBuf> {
        let asset_failed = |reason: String| ShortreelError::AssetFailed {
            query: query.to_string(),
            reason,
        };

        let response = self
            .client
            .post(FLUX_API_URL)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": FLUX_MODEL,
                "prompt": query,
                "width": 1008,
                "height": 1792,
                "steps": 4,
                "n": 1,
                "response_format": "b64_json",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(asset_failed(format!("API returned {}: {}", status, body)));
        }

        let payload = response.json::<serde_json::Value>().await?;
        let encoded = payload["data"][0]["b64_json"]
            .as_str()
            .ok_or_else(|| asset_failed(format!("no image data in reply: {:?}", payload)))?;
        let image_bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| asset_failed(format!("undecodable image payload: {}", e)))?;

        let image_path = out_dir.join(format!("{}.png", Uuid::new_v4()));
        fs::write(&image_path, &image_bytes).await?;

        let clip_path = out_dir.join(format!("{}.mp4", Uuid::new_v4()));
        animate_still(&image_path, &clip_path, duration).await?;
        fs::remove_file(&image_path).await?;

        Ok(clip_path)
    }
}

/// Slow centered zoom over the still, one output frame per tick of `d`.
fn ken_burns_filter(duration: f64) -> String {
    let frames = (duration * FRAME_RATE as f64).ceil() as u32;
    format!(
        "zoompan=z='min(zoom+0.001,1.2)':d={frames}:\
         x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':\
         s={FRAME_WIDTH}x{FRAME_HEIGHT}:fps={FRAME_RATE}"
    )
}

/// Animate a still image into a clip with a slow zoom.
pub async fn animate_still(image_path: &Path, clip_path: &Path, duration: f64) -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(image_path)
        .arg("-vf")
        .arg(ken_burns_filter(duration))
        .arg("-c:v")
        .arg("libx264")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg(clip_path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ShortreelError::RenderFailed {
            step: "animate still",
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

const PEXELS_API_URL: &str = "https://api.pexels.com/videos/search";

/// Searches portrait stock footage and downloads the best file.
pub struct PexelsVideoSource {
    api_key: String,
    client: Client,
}

impl PexelsVideoSource {
    /// Build the source, validating its API key.
    pub fn new() -> Result<Self> {
        let api_key = std::env::var("PEXELS_API_KEY").map_err(|_| {
            ShortreelError::MissingApiKey {
                env_var: "PEXELS_API_KEY".to_string(),
            }
        })?;
        Ok(Self {
            api_key,
            client: Client::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PexelsSearchReply {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    width: Option<u32>,
    height: Option<u32>,
    link: String,
}

/// Prefer an exact frame-sized file, then the smallest portrait file that
/// still covers the frame height, then the tallest portrait file.
fn pick_video_file(video: &PexelsVideo) -> Option<&PexelsVideoFile> {
    let portrait =
        |f: &&PexelsVideoFile| matches!((f.width, f.height), (Some(w), Some(h)) if h > w);

    video
        .video_files
        .iter()
        .find(|f| f.width == Some(FRAME_WIDTH) && f.height == Some(FRAME_HEIGHT))
        .or_else(|| {
            video
                .video_files
                .iter()
                .filter(portrait)
                .filter(|f| f.height.unwrap_or(0) >= FRAME_HEIGHT)
                .min_by_key(|f| f.height.unwrap_or(u32::MAX))
        })
        .or_else(|| {
            video
                .video_files
                .iter()
                .filter(portrait)
                .max_by_key(|f| f.height.unwrap_or(0))
        })
}

#[async_trait]
impl AssetSource for PexelsVideoSource {
    fn name(&self) -> &'static str {
        "pexels"
    }

    async fn fetch_clip(&self, query: &str, duration: f64, out_dir: &Path) -> Result<PathBuf> {
        let asset_failed = |reason: String| ShortreelError::AssetFailed {
            query: query.to_string(),
            reason,
        };

        let response = self
            .client
            .get(PEXELS_API_URL)
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query),
                ("orientation", "portrait"),
                ("per_page", "10"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(asset_failed(format!("API returned {}: {}", status, body)));
        }

        let reply: PexelsSearchReply = response.json().await?;
        let file = reply
            .videos
            .iter()
            .filter(|v| v.duration >= duration)
            .find_map(pick_video_file)
            .or_else(|| reply.videos.iter().find_map(pick_video_file))
            .ok_or_else(|| asset_failed("no portrait footage found".to_string()))?;

        let download = self.client.get(&file.link).send().await?;
        if !download.status().is_success() {
            return Err(asset_failed(format!(
                "download returned {}",
                download.status()
            )));
        }
        let bytes = download.bytes().await?;

        let clip_path = out_dir.join(format!("{}.mp4", Uuid::new_v4()));
        fs::write(&clip_path, &bytes).await?;

        Ok(clip_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_filter_covers_the_scene_duration() {
        let filter = ken_burns_filter(4.0);
        assert!(filter.contains("d=120"));
        assert!(filter.contains("s=1080x1920"));
        assert!(filter.contains("min(zoom+0.001,1.2)"));
    }

    #[test]
    fn picks_the_exact_frame_sized_file_first() {
        let reply: PexelsSearchReply = serde_json::from_str(
            r#"{"videos": [{
                "duration": 12,
                "video_files": [
                    {"width": 720, "height": 1280, "link": "https://v.example/sd"},
                    {"width": 1080, "height": 1920, "link": "https://v.example/hd"},
                    {"width": 2160, "height": 3840, "link": "https://v.example/uhd"}
                ]
            }]}"#,
        )
        .unwrap();
        let file = pick_video_file(&reply.videos[0]).unwrap();
        assert_eq!(file.link, "https://v.example/hd");
    }

    #[test]
    fn falls_back_to_the_smallest_covering_portrait_file() {
        let video: PexelsVideo = serde_json::from_str(
            r#"{"duration": 8, "video_files": [
                {"width": 2160, "height": 3840, "link": "https://v.example/uhd"},
                {"width": 1440, "height": 2560, "link": "https://v.example/qhd"},
                {"width": 1920, "height": 1080, "link": "https://v.example/landscape"}
            ]}"#,
        )
        .unwrap();
        let file = pick_video_file(&video).unwrap();
        assert_eq!(file.link, "https://v.example/qhd");
    }

    #[test]
    fn ignores_landscape_only_videos() {
        let video: PexelsVideo = serde_json::from_str(
            r#"{"duration": 8, "video_files": [
                {"width": 1920, "height": 1080, "link": "https://v.example/landscape"}
            ]}"#,
        )
        .unwrap();
        assert!(pick_video_file(&video).is_none());
    }

    #[test]
    fn tolerates_files_without_dimensions() {
        let video: PexelsVideo = serde_json::from_str(
            r#"{"duration": 8, "video_files": [
                {"link": "https://v.example/unknown"},
                {"width": 1080, "height": 1920, "link": "https://v.example/hd"}
            ]}"#,
        )
        .unwrap();
        let file = pick_video_file(&video).unwrap();
        assert_eq!(file.link, "https://v.example/hd");
    }
}
