use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::Result;

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("animeref")
}

/// Get the cache directory for a given video id
pub fn get_video_cache_dir(root: &Path, video_id: &str) -> PathBuf {
    root.join(video_id)
}

/// Get the path for a cached transcript (language aware)
pub fn get_transcript_path(cache_dir: &Path, language: Option<&str>) -> PathBuf {
    cache_dir.join(format!("transcript_{}.txt", language.unwrap_or("default")))
}

/// Get the path for a cached description
pub fn get_description_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("description.txt")
}

/// Read a cached text file; a missing file is a cache miss.
pub async fn read_cached(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn write_cached(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cache_round_trip() {
        let root = tempfile::tempdir().unwrap();
        let dir = get_video_cache_dir(root.path(), "qUkxvTi06ww");
        let path = get_transcript_path(&dir, Some("en"));

        assert_eq!(read_cached(&path).await.unwrap(), None);
        write_cached(&path, "hello\n").await.unwrap();
        assert_eq!(read_cached(&path).await.unwrap().as_deref(), Some("hello\n"));
        assert!(path.ends_with("qUkxvTi06ww/transcript_en.txt"));
    }
}
