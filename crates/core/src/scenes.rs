//! Buckets granular caption segments into fixed-width scenes so each window
//! can carry one visual asset.

use crate::types::{Scene, TimedSegment};

/// Group ordered caption segments into fixed-width scenes covering
/// `[0, last_segment.end]`.
///
/// A segment belongs to the bucket whose half-open window `[b, b + width)`
/// contains its start; a start exactly on a boundary opens the next bucket.
/// Windows where nothing starts produce no scene. The final scene's end is
/// clamped to the last segment's end, so it may be narrower than `width`.
pub fn group_scenes(segments: &[TimedSegment], width: f64) -> Vec<Scene> {
    let Some(last) = segments.last() else {
        return Vec::new();
    };
    if width <= 0.0 {
        return Vec::new();
    }

    let mut scenes = Vec::new();
    let mut bucket_start = 0.0f64;
    while bucket_start < last.end {
        let bucket_end = bucket_start + width;
        let captions: Vec<TimedSegment> = segments
            .iter()
            .filter(|s| s.start >= bucket_start && s.start < bucket_end)
            .cloned()
            .collect();
        if !captions.is_empty() {
            let end = bucket_end.min(last.end);
            let prompt_text = captions
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            scenes.push(Scene {
                start: bucket_start,
                end,
                duration: end - bucket_start,
                prompt_text,
                captions,
                video_path: None,
            });
        }
        bucket_start = bucket_end;
    }
    scenes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, start: f64, end: f64) -> TimedSegment {
        TimedSegment::new(text, start, end)
    }

    #[test]
    fn groups_segments_into_five_second_buckets() {
        let segments = vec![seg("a", 0.0, 2.0), seg("b", 2.0, 5.0), seg("c", 6.0, 9.0)];
        let scenes = group_scenes(&segments, 5.0);
        assert_eq!(scenes.len(), 2);

        assert_eq!((scenes[0].start, scenes[0].end), (0.0, 5.0));
        assert_eq!(scenes[0].prompt_text, "a b");
        assert_eq!(scenes[0].captions.len(), 2);

        // Final bucket is clamped to the last segment's end.
        assert_eq!((scenes[1].start, scenes[1].end), (5.0, 9.0));
        assert_eq!(scenes[1].duration, 4.0);
        assert_eq!(scenes[1].prompt_text, "c");
    }

    #[test]
    fn boundary_start_opens_the_next_bucket() {
        let segments = vec![seg("a", 0.0, 4.0), seg("b", 5.0, 8.0)];
        let scenes = group_scenes(&segments, 5.0);
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].captions.len(), 1);
        assert_eq!(scenes[1].start, 5.0);
        assert_eq!(scenes[1].captions[0].text, "b");
    }

    #[test]
    fn empty_windows_are_omitted() {
        let segments = vec![seg("a", 0.0, 1.0), seg("b", 11.0, 12.0)];
        let scenes = group_scenes(&segments, 5.0);
        assert_eq!(scenes.len(), 2);
        assert_eq!((scenes[0].start, scenes[0].end), (0.0, 5.0));
        assert_eq!((scenes[1].start, scenes[1].end), (10.0, 12.0));
    }

    #[test]
    fn empty_input_yields_no_scenes() {
        assert!(group_scenes(&[], 5.0).is_empty());
    }

    #[test]
    fn every_segment_lands_in_exactly_one_scene() {
        let segments: Vec<TimedSegment> = (0..12)
            .map(|i| seg(&format!("s{i}"), i as f64 * 1.7, i as f64 * 1.7 + 1.5))
            .collect();
        let scenes = group_scenes(&segments, 4.0);

        let mut seen = 0usize;
        for window in scenes.windows(2) {
            assert!(window[0].end <= window[1].start + 1e-9);
        }
        for scene in &scenes {
            assert!((scene.end - scene.start - scene.duration).abs() < 1e-9);
            seen += scene.captions.len();
        }
        assert_eq!(seen, segments.len());
    }
}
