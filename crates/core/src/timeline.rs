//! Resolves the per-scene asset timeline: forward-fills scenes that have no
//! clip from the most recent one that does, then merges adjacent ranges
//! showing the same clip.

use std::path::PathBuf;

use crate::types::{AssetInterval, Scene};

/// Timeline after gap-filling, with fill accounting.
#[derive(Debug)]
pub struct ResolvedTimeline {
    pub intervals: Vec<AssetInterval>,
    /// Intervals that inherited the previous interval's asset.
    pub filled: usize,
    /// Intervals with no asset and nothing earlier to inherit from.
    pub unresolved: usize,
}

/// One interval per scene, carrying the scene's clip if it has one.
pub fn intervals_from_scenes(scenes: &[Scene]) -> Vec<AssetInterval> {
    scenes
        .iter()
        .map(|s| AssetInterval {
            start: s.start,
            end: s.end,
            asset: s.video_path.clone(),
        })
        .collect()
}

/// Forward-fill missing assets from the most recent resolved one.
///
/// Builds a new sequence; the input is left untouched. Intervals before the
/// first resolved asset stay empty and are counted `unresolved`, so an
/// all-empty input passes through unchanged.
pub fn fill_gaps(intervals: &[AssetInterval]) -> ResolvedTimeline {
    let mut filled = 0usize;
    let mut unresolved = 0usize;
    let mut last_seen: Option<&PathBuf> = None;
    let mut out = Vec::with_capacity(intervals.len());

    for interval in intervals {
        let asset = match &interval.asset {
            Some(asset) => {
                last_seen = Some(asset);
                Some(asset.clone())
            }
            None => match last_seen {
                Some(asset) => {
                    filled += 1;
                    Some(asset.clone())
                }
                None => {
                    unresolved += 1;
                    None
                }
            },
        };
        out.push(AssetInterval {
            start: interval.start,
            end: interval.end,
            asset,
        });
    }

    ResolvedTimeline {
        intervals: out,
        filled,
        unresolved,
    }
}

/// Merge adjacent intervals resolved to the same asset by widening the
/// running interval. Intervals still missing an asset are dropped; the
/// renderer covers their range with filler footage.
pub fn merge_adjacent(intervals: &[AssetInterval]) -> Vec<AssetInterval> {
    let mut out: Vec<AssetInterval> = Vec::new();
    for interval in intervals {
        let Some(asset) = &interval.asset else {
            continue;
        };
        match out.last_mut() {
            Some(last) if last.asset.as_deref() == Some(asset.as_path()) => {
                last.end = interval.end;
            }
            _ => out.push(interval.clone()),
        }
    }
    out
}

/// Fill then merge in one step.
///
/// An all-empty input comes back unchanged and unmerged, every interval
/// counted unresolved; the caller decides whether that is fatal.
pub fn resolve_timeline(intervals: &[AssetInterval]) -> ResolvedTimeline {
    let filled = fill_gaps(intervals);
    if filled.unresolved == intervals.len() {
        return filled;
    }
    ResolvedTimeline {
        intervals: merge_adjacent(&filled.intervals),
        filled: filled.filled,
        unresolved: filled.unresolved,
    }
}
