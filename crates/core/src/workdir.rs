use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::Result;

/// Scratch directory for one pipeline run.
///
/// Created fresh (wiping any leftover from a previous run) and removed again
/// when dropped, unless the caller asked to keep it.
#[derive(Debug)]
pub struct WorkDir {
    root: PathBuf,
    keep: bool,
}

impl WorkDir {
    /// Create `<parent>/work` with its clip and segment subdirectories.
    pub async fn create(parent: &Path, keep: bool) -> Result<Self> {
        let root = parent.join("work");
        if root.exists() {
            fs::remove_dir_all(&root).await?;
        }
        fs::create_dir_all(root.join("clips")).await?;
        fs::create_dir_all(root.join("segments")).await?;
        Ok(Self { root, keep })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Directory for fetched or generated scene clips
    pub fn clips_dir(&self) -> PathBuf {
        self.root.join("clips")
    }

    /// Directory for normalized render segments
    pub fn segments_dir(&self) -> PathBuf {
        self.root.join("segments")
    }

    pub fn srt_path(&self) -> PathBuf {
        self.root.join("captions.srt")
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_clip_and_segment_directories() {
        let parent = tempfile::tempdir().unwrap();
        let work = WorkDir::create(parent.path(), false).await.unwrap();
        assert!(work.clips_dir().is_dir());
        assert!(work.segments_dir().is_dir());
    }

    #[tokio::test]
    async fn removes_itself_on_drop() {
        let parent = tempfile::tempdir().unwrap();
        let root = {
            let work = WorkDir::create(parent.path(), false).await.unwrap();
            work.path().to_path_buf()
        };
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn keeps_the_directory_when_asked() {
        let parent = tempfile::tempdir().unwrap();
        let root = {
            let work = WorkDir::create(parent.path(), true).await.unwrap();
            work.path().to_path_buf()
        };
        assert!(root.exists());
    }

    #[tokio::test]
    async fn wipes_leftovers_from_a_previous_run() {
        let parent = tempfile::tempdir().unwrap();
        let stale = parent.path().join("work").join("clips");
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("old.mp4"), b"stale").unwrap();

        let work = WorkDir::create(parent.path(), true).await.unwrap();
        assert!(!work.clips_dir().join("old.mp4").exists());
    }
}
