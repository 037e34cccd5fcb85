use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

/// Get the cache directory for a given topic
pub fn get_cache_dir(topic: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    topic.hash(&mut hasher);
    let topic_hash = hasher.finish();

    get_root_cache_dir().join(topic_hash.to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("shortreel")
}

#[cfg(feature = "local-whisper")]
pub fn get_model_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join("models")
}

/// Get the path for the cached narration script
pub fn get_script_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("script.txt")
}

/// Get the path for the cached narration audio
pub fn get_audio_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("voiceover.wav")
}

/// Get the path for the cached transcription
pub fn get_transcript_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("transcript.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_topic_maps_to_the_same_directory() {
        assert_eq!(get_cache_dir("roman aqueducts"), get_cache_dir("roman aqueducts"));
    }

    #[test]
    fn different_topics_map_to_different_directories() {
        assert_ne!(get_cache_dir("roman aqueducts"), get_cache_dir("deep sea fish"));
    }

    #[test]
    fn artifact_paths_live_under_the_cache_dir() {
        let dir = get_cache_dir("volcano facts");
        assert_eq!(get_script_path(&dir), dir.join("script.txt"));
        assert_eq!(get_audio_path(&dir), dir.join("voiceover.wav"));
        assert_eq!(get_transcript_path(&dir), dir.join("transcript.json"));
        assert!(dir.starts_with(get_root_cache_dir()));
    }
}
