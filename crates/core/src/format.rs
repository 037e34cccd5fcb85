use std::path::Path;

use crate::{error::Result, types::TimedSegment};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}

/// Render caption segments as an SRT document
pub fn render_srt(segments: &[TimedSegment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(seg.start),
            format_srt_time(seg.end)
        ));
        out.push_str(seg.text.trim());
        out.push_str("\n\n");
    }
    out
}

/// Write caption segments to an SRT file
pub async fn write_srt(segments: &[TimedSegment], path: &Path) -> Result<()> {
    tokio::fs::write(path, render_srt(segments)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.4), "01:05");
        assert_eq!(format_timestamp(600.0), "10:00");
    }

    #[test]
    fn formats_srt_timestamps_with_millis() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(1.5), "00:00:01,500");
        assert_eq!(format_srt_time(3661.25), "01:01:01,250");
    }

    #[test]
    fn renders_numbered_srt_entries() {
        let segments = vec![
            TimedSegment::new("hello there", 0.0, 1.2),
            TimedSegment::new("general kenobi", 1.2, 2.75),
        ];
        let srt = render_srt(&segments);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,200\nhello there\n\n\
             2\n00:00:01,200 --> 00:00:02,750\ngeneral kenobi\n\n"
        );
    }
}
