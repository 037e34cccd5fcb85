//! Aligns caption-sized chunks of the narration text with the word-level
//! timestamps reported by the transcription engine.

use crate::{
    error::{Result, ShortreelError},
    types::{TimedSegment, Transcription, WordStamp},
};

/// What to do with a chunk whose cursor position has no matching word span.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnmappedPolicy {
    /// Skip the chunk and count it in the result.
    #[default]
    Drop,
    /// Use the nearest known timestamp, clamped so segments stay ordered.
    Nearest,
    /// Abort the whole mapping with an error.
    Fail,
}

/// Mapper output: ordered caption segments plus how many chunks were dropped.
#[derive(Debug)]
pub struct AlignedCaptions {
    pub segments: Vec<TimedSegment>,
    pub dropped: usize,
}

/// Half-open character span of one word (trailing space included) and the
/// time at which the word ends.
struct WordSpan {
    start: usize,
    end: usize,
    end_time: f64,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn build_span_table(words: &[WordStamp]) -> Vec<WordSpan> {
    let mut spans = Vec::with_capacity(words.len());
    let mut offset = 0usize;
    for word in words {
        let trimmed = word.word.trim();
        if trimmed.is_empty() {
            continue;
        }
        let end = offset + char_len(trimmed) + 1;
        spans.push(WordSpan {
            start: offset,
            end,
            end_time: word.end,
        });
        offset = end;
    }
    spans
}

// The cursor after a chunk sits one past the chunk's trailing space, so the
// matching span is the one that ends exactly there or strictly contains it.
fn lookup_end_time(spans: &[WordSpan], cursor: usize) -> Option<f64> {
    spans
        .iter()
        .find(|s| s.start < cursor && cursor <= s.end)
        .map(|s| s.end_time)
}

fn nearest_end_time(spans: &[WordSpan], cursor: usize) -> Option<f64> {
    spans
        .iter()
        .min_by_key(|s| {
            if cursor < s.start {
                s.start - cursor
            } else if cursor > s.end {
                cursor - s.end
            } else {
                0
            }
        })
        .map(|s| s.end_time)
}

/// Split a transcript into word-grouped chunks of at most `max_chars`
/// characters. A leftover tail shorter than half the limit is absorbed into
/// the current chunk instead of being emitted as a stub.
pub fn chunk_transcript(text: &str, max_chars: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < words.len() {
        let word = words[i];
        let fits = current.is_empty() || char_len(&current) + 1 + char_len(word) <= max_chars;
        if fits {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            i += 1;
            continue;
        }

        let tail: usize =
            words[i..].iter().map(|w| char_len(w)).sum::<usize>() + (words.len() - i - 1);
        if tail < max_chars.div_ceil(2) {
            for w in &words[i..] {
                current.push(' ');
                current.push_str(w);
            }
            i = words.len();
            continue;
        }

        chunks.push(std::mem::take(&mut current));
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Map a transcription's word timings onto caption-sized chunks of its text.
///
/// Chunk boundaries are located in the word-span table by a running character
/// cursor; each matched span's end time closes the chunk, and the next chunk
/// opens where the previous one closed (the first opens at 0).
pub fn align_captions(
    transcription: &Transcription,
    max_chars: usize,
    policy: UnmappedPolicy,
) -> Result<AlignedCaptions> {
    let spans = build_span_table(&transcription.words);
    let chunks = chunk_transcript(&transcription.text, max_chars);

    let mut segments = Vec::with_capacity(chunks.len());
    let mut dropped = 0usize;
    let mut cursor = 0usize;
    let mut prev_end = 0.0f64;

    for (index, chunk) in chunks.into_iter().enumerate() {
        cursor += char_len(&chunk) + 1;
        let end = match lookup_end_time(&spans, cursor) {
            Some(t) => t,
            None => match policy {
                UnmappedPolicy::Drop => {
                    dropped += 1;
                    continue;
                }
                UnmappedPolicy::Nearest => {
                    let Some(t) = nearest_end_time(&spans, cursor) else {
                        return Err(ShortreelError::UnmappedChunk { index, chunk });
                    };
                    t
                }
                UnmappedPolicy::Fail => {
                    return Err(ShortreelError::UnmappedChunk { index, chunk });
                }
            },
        };
        let end = end.max(prev_end);
        segments.push(TimedSegment::new(chunk, prev_end, end));
        prev_end = end;
    }

    Ok(AlignedCaptions { segments, dropped })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(word: &str, end: f64) -> WordStamp {
        WordStamp {
            word: word.to_string(),
            start: end - 0.3,
            end,
        }
    }

    fn transcription(text: &str, words: Vec<WordStamp>) -> Transcription {
        Transcription {
            text: text.to_string(),
            words,
            language: Some("en".to_string()),
        }
    }

    #[test]
    fn chunks_stay_under_the_limit() {
        let chunks = chunk_transcript("one two three four", 9);
        assert_eq!(chunks, vec!["one two", "three four"]);
    }

    #[test]
    fn short_tail_is_absorbed_into_the_current_chunk() {
        // "c" alone would be a 1-char stub, under half of 7.
        let chunks = chunk_transcript("aaaa bb c", 7);
        assert_eq!(chunks, vec!["aaaa bb c"]);
    }

    #[test]
    fn long_tail_is_emitted_on_its_own() {
        let chunks = chunk_transcript("alpha beta gamma delta", 10);
        assert_eq!(chunks, vec!["alpha beta", "gamma", "delta"]);
    }

    #[test]
    fn oversized_single_word_is_kept_whole() {
        let chunks = chunk_transcript("incomprehensibilities", 10);
        assert_eq!(chunks, vec!["incomprehensibilities"]);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_transcript("", 15).is_empty());
        assert!(chunk_transcript("   ", 15).is_empty());
    }

    #[test]
    fn chunks_chain_start_to_end() {
        let t = transcription(
            "alpha beta gamma delta",
            vec![
                stamp("alpha", 0.5),
                stamp("beta", 1.0),
                stamp("gamma", 1.5),
                stamp("delta", 2.0),
            ],
        );
        let aligned = align_captions(&t, 10, UnmappedPolicy::Drop).unwrap();
        assert_eq!(aligned.dropped, 0);
        let segs = &aligned.segments;
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].text, "alpha beta");
        assert_eq!((segs[0].start, segs[0].end), (0.0, 1.0));
        assert_eq!((segs[1].start, segs[1].end), (1.0, 1.5));
        assert_eq!((segs[2].start, segs[2].end), (1.5, 2.0));
        assert!((segs[2].duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn final_chunk_maps_to_the_last_word() {
        let t = transcription("hello world", vec![stamp("hello", 0.4), stamp("world", 0.9)]);
        let aligned = align_captions(&t, 20, UnmappedPolicy::Drop).unwrap();
        assert_eq!(aligned.segments.len(), 1);
        assert_eq!(aligned.segments[0].end, 0.9);
    }

    #[test]
    fn drop_policy_skips_and_counts_unmapped_chunks() {
        // Word list stops early, so later chunks have no span to land in.
        let t = transcription(
            "alpha beta gamma delta",
            vec![stamp("alpha", 0.5), stamp("beta", 1.0)],
        );
        let aligned = align_captions(&t, 10, UnmappedPolicy::Drop).unwrap();
        assert_eq!(aligned.dropped, 2);
        assert_eq!(aligned.segments.len(), 1);
        assert_eq!(aligned.segments[0].text, "alpha beta");
    }

    #[test]
    fn nearest_policy_reuses_the_closest_stamp() {
        let t = transcription(
            "alpha beta gamma delta",
            vec![stamp("alpha", 0.5), stamp("beta", 1.0)],
        );
        let aligned = align_captions(&t, 10, UnmappedPolicy::Nearest).unwrap();
        assert_eq!(aligned.dropped, 0);
        assert_eq!(aligned.segments.len(), 3);
        // Unmapped chunks fall back to the last known stamp and keep order.
        assert_eq!(aligned.segments[1].end, 1.0);
        assert_eq!(aligned.segments[2].end, 1.0);
        assert!(aligned.segments[2].start <= aligned.segments[2].end);
    }

    #[test]
    fn fail_policy_aborts_on_the_first_unmapped_chunk() {
        let t = transcription(
            "alpha beta gamma delta",
            vec![stamp("alpha", 0.5), stamp("beta", 1.0)],
        );
        let err = align_captions(&t, 10, UnmappedPolicy::Fail).unwrap_err();
        assert!(matches!(err, ShortreelError::UnmappedChunk { index: 1, .. }));
    }

    #[test]
    fn rejoined_chunks_reconstruct_the_transcript() {
        let text = "the quick brown fox jumps over the lazy dog near the river bank";
        let words: Vec<WordStamp> = text
            .split_whitespace()
            .enumerate()
            .map(|(i, w)| stamp(w, (i + 1) as f64 * 0.4))
            .collect();
        let t = transcription(text, words);
        let aligned = align_captions(&t, 15, UnmappedPolicy::Drop).unwrap();
        assert_eq!(aligned.dropped, 0);
        let rebuilt = aligned
            .segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rebuilt, text);
    }
}
