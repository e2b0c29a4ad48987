//! Registry of produced CSV files, persisted as `{"files": [...]}`.
//!
//! The file is read, changed in memory and rewritten as a whole. There is no
//! locking: two processes registering at the same time can lose an entry.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRegistry {
    pub files: Vec<String>,
}

impl CsvRegistry {
    /// Load the registry; a missing file is an empty registry.
    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await? {
            return Ok(Self::default());
        }
        let json_content = fs::read_to_string(path).await?;
        let registry: CsvRegistry = serde_json::from_str(&json_content)?;
        Ok(registry)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let pretty_json = serde_json::to_string_pretty(self)?;
        fs::write(path, &pretty_json).await?;
        Ok(())
    }

    /// Append `filename` unless already present. Returns true when added.
    pub fn register(&mut self, filename: &str) -> bool {
        if self.contains(filename) {
            return false;
        }
        self.files.push(filename.to_string());
        true
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.iter().any(|f| f == filename)
    }
}

/// Read-modify-write `filename` into the registry at `path`.
///
/// The file is only rewritten when the entry is new. Returns true when added.
pub async fn register_file(path: &Path, filename: &str) -> Result<bool> {
    let mut registry = CsvRegistry::load(path).await?;
    if !registry.register(filename) {
        return Ok(false);
    }
    registry.save(path).await?;
    info!(filename, registry = %path.display(), "registered csv file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = CsvRegistry::load(&dir.path().join("csv_config.json"))
            .await
            .unwrap();
        assert!(registry.files.is_empty());
    }

    #[tokio::test]
    async fn registering_twice_keeps_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csv_config.json");

        assert!(register_file(&path, "a.csv").await.unwrap());
        assert!(!register_file(&path, "a.csv").await.unwrap());

        let registry = CsvRegistry::load(&path).await.unwrap();
        assert_eq!(registry.files, vec!["a.csv"]);
    }

    #[tokio::test]
    async fn distinct_files_keep_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csv_config.json");

        register_file(&path, "b.csv").await.unwrap();
        register_file(&path, "a.csv").await.unwrap();

        let registry = CsvRegistry::load(&path).await.unwrap();
        assert_eq!(registry.files, vec!["b.csv", "a.csv"]);
    }

    #[tokio::test]
    async fn saved_document_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("csv_config.json");

        register_file(&path, "x.csv").await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"files\": [\n    \"x.csv\"\n  ]\n}");
    }

    #[tokio::test]
    async fn malformed_registry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("csv_config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(CsvRegistry::load(&path).await.is_err());
        assert!(register_file(&path, "a.csv").await.is_err());
    }
}
