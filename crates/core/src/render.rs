//! ffmpeg composition: normalizes scene clips to the output geometry, fills
//! uncovered spans with black, concatenates, burns captions, and muxes the
//! narration.

use std::path::{Path, PathBuf};

use tokio::{fs, process::Command};

use crate::{
    error::{Result, ShortreelError},
    format::write_srt,
    types::{AssetInterval, TimedSegment},
};

pub const FRAME_WIDTH: u32 = 1080;
pub const FRAME_HEIGHT: u32 = 1920;
pub const FRAME_RATE: u32 = 30;

/// Spans shorter than this are not worth a filler segment.
const MIN_GAP_SECS: f64 = 0.05;

const CAPTION_STYLE: &str = "FontName=DejaVu Sans,FontSize=16,Bold=1,\
PrimaryColour=&H00FFFFFF,OutlineColour=&H00000000,Outline=2,Shadow=0,\
Alignment=2,MarginV=90";

/// What a planned render segment shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentSource {
    Clip(PathBuf),
    Filler,
}

/// One entry of the render plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSegment {
    pub duration: f64,
    pub source: SegmentSource,
}

/// Lay the resolved timeline over the narration span.
///
/// The plan covers `[0, narration_end]` without holes: spans before the
/// first clip, between clips, and after the last clip become black filler
/// so captions and audio stay in sync.
pub fn plan_segments(timeline: &[AssetInterval], narration_end: f64) -> Vec<RenderSegment> {
    let mut plan = Vec::new();
    let mut clock = 0.0f64;

    for interval in timeline {
        let Some(asset) = &interval.asset else {
            continue;
        };
        if interval.start - clock > MIN_GAP_SECS {
            plan.push(RenderSegment {
                duration: interval.start - clock,
                source: SegmentSource::Filler,
            });
            clock = interval.start;
        }
        if interval.end - clock > MIN_GAP_SECS {
            plan.push(RenderSegment {
                duration: interval.end - clock,
                source: SegmentSource::Clip(asset.clone()),
            });
            clock = interval.end;
        }
    }

    if narration_end - clock > MIN_GAP_SECS {
        plan.push(RenderSegment {
            duration: narration_end - clock,
            source: SegmentSource::Filler,
        });
    }

    plan
}

/// ffmpeg-backed compositor for the final vertical video.
pub struct Renderer {
    segments_dir: PathBuf,
}

impl Renderer {
    pub fn new(segments_dir: PathBuf) -> Self {
        Self { segments_dir }
    }

    /// Composite the timeline, captions, and narration into `output_path`.
    pub async fn render(
        &self,
        timeline: &[AssetInterval],
        captions: &[TimedSegment],
        narration: &Path,
        narration_end: f64,
        srt_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        let plan = plan_segments(timeline, narration_end);

        let mut segment_paths = Vec::with_capacity(plan.len());
        for (i, segment) in plan.iter().enumerate() {
            let path = self.segments_dir.join(format!("segment_{:03}.mp4", i));
            match &segment.source {
                SegmentSource::Clip(clip) => {
                    normalize_clip(clip, &path, segment.duration).await?
                }
                SegmentSource::Filler => filler_clip(&path, segment.duration).await?,
            }
            segment_paths.push(path);
        }

        let concat_list = self.segments_dir.join("concat.txt");
        let concat_path = self.segments_dir.join("concat.mp4");
        concat_segments(&segment_paths, &concat_list, &concat_path).await?;

        write_srt(captions, srt_path).await?;
        finalize(&concat_path, narration, srt_path, output_path).await
    }
}

/// Normalize a clip to the frame geometry and exact duration, looping it if
/// it runs short.
async fn normalize_clip(clip: &Path, out: &Path, duration: f64) -> Result<()> {
    let filter = format!(
        "scale={FRAME_WIDTH}:{FRAME_HEIGHT}:force_original_aspect_ratio=increase,\
         crop={FRAME_WIDTH}:{FRAME_HEIGHT},fps={FRAME_RATE}"
    );
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-stream_loop")
        .arg("-1")
        .arg("-i")
        .arg(clip)
        .arg("-t")
        .arg(format!("{:.3}", duration))
        .arg("-vf")
        .arg(&filter)
        .arg("-an")
        .arg("-c:v")
        .arg("libx264")
        .arg("-preset")
        .arg("fast")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg(out)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ShortreelError::RenderFailed {
            step: "normalize clip",
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Solid black stand-in for spans no clip covers.
async fn filler_clip(out: &Path, duration: f64) -> Result<()> {
    let source = format!("color=c=black:s={FRAME_WIDTH}x{FRAME_HEIGHT}:r={FRAME_RATE}");
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg(&source)
        .arg("-t")
        .arg(format!("{:.3}", duration))
        .arg("-c:v")
        .arg("libx264")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg(out)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ShortreelError::RenderFailed {
            step: "filler clip",
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

/// Join normalized segments with the concat demuxer.
async fn concat_segments(segments: &[PathBuf], list_path: &Path, out: &Path) -> Result<()> {
    let mut listing = String::new();
    for segment in segments {
        let absolute = fs::canonicalize(segment).await?;
        listing.push_str(&format!("file '{}'\n", absolute.display()));
    }
    fs::write(list_path, &listing).await?;

    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-f")
        .arg("concat")
        .arg("-safe")
        .arg("0")
        .arg("-i")
        .arg(list_path)
        .arg("-c")
        .arg("copy")
        .arg(out)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ShortreelError::RenderFailed {
            step: "concat",
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

// The path is quoted for the filtergraph parser; quotes inside it are escaped.
fn subtitles_filter(srt_path: &Path) -> String {
    let escaped = srt_path.to_string_lossy().replace('\'', r"\'");
    format!(
        "subtitles=filename='{}':force_style='{}'",
        escaped, CAPTION_STYLE
    )
}

/// Burn captions and mux the narration in one encoding pass.
async fn finalize(video: &Path, narration: &Path, srt: &Path, out: &Path) -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(video)
        .arg("-i")
        .arg(narration)
        .arg("-vf")
        .arg(subtitles_filter(srt))
        .arg("-map")
        .arg("0:v:0")
        .arg("-map")
        .arg("1:a:0")
        .arg("-c:v")
        .arg("libx264")
        .arg("-preset")
        .arg("fast")
        .arg("-pix_fmt")
        .arg("yuv420p")
        .arg("-c:a")
        .arg("aac")
        .arg("-shortest")
        .arg("-movflags")
        .arg("+faststart")
        .arg(out)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ShortreelError::RenderFailed {
            step: "finalize",
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(start: f64, end: f64, path: &str) -> AssetInterval {
        AssetInterval {
            start,
            end,
            asset: Some(PathBuf::from(path)),
        }
    }

    #[test]
    fn exact_coverage_needs_no_filler() {
        let plan = plan_segments(&[clip(0.0, 6.0, "a.mp4"), clip(6.0, 10.0, "b.mp4")], 10.0);
        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|s| matches!(s.source, SegmentSource::Clip(_))));
        let total: f64 = plan.iter().map(|s| s.duration).sum();
        assert!((total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn uncovered_head_becomes_filler() {
        let plan = plan_segments(&[clip(2.0, 10.0, "x.mp4")], 10.0);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].source, SegmentSource::Filler);
        assert!((plan[0].duration - 2.0).abs() < 1e-9);
        assert_eq!(plan[1].source, SegmentSource::Clip(PathBuf::from("x.mp4")));
    }

    #[test]
    fn narration_tail_is_padded() {
        let plan = plan_segments(&[clip(0.0, 9.2, "x.mp4")], 10.0);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[1].source, SegmentSource::Filler);
        assert!((plan[1].duration - 0.8).abs() < 1e-9);
    }

    #[test]
    fn tiny_gaps_are_ignored() {
        let plan = plan_segments(&[clip(0.0, 9.99, "x.mp4")], 10.0);
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn empty_timeline_renders_as_filler() {
        let plan = plan_segments(&[], 8.0);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].source, SegmentSource::Filler);
        assert!((plan[0].duration - 8.0).abs() < 1e-9);
    }

    #[test]
    fn plan_always_covers_the_narration_span() {
        let plan = plan_segments(
            &[clip(1.5, 4.0, "a.mp4"), clip(4.0, 7.25, "b.mp4")],
            9.0,
        );
        let total: f64 = plan.iter().map(|s| s.duration).sum();
        assert!((total - 9.0).abs() < 1e-9);
    }

    #[test]
    fn subtitle_filter_quotes_the_path() {
        let filter = subtitles_filter(Path::new("/tmp/work/captions.srt"));
        assert!(filter.starts_with("subtitles=filename='/tmp/work/captions.srt'"));
        assert!(filter.contains("force_style="));
        assert!(filter.contains("Alignment=2"));
    }

    #[test]
    fn subtitle_filter_escapes_quotes_in_the_path() {
        let filter = subtitles_filter(Path::new("/tmp/it's here/captions.srt"));
        assert!(filter.contains(r"it\'s here"));
    }
}
