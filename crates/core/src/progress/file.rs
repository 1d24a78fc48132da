use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{CategoryProgress, ProgressError, ProgressStore};

/// Checkpoints stored as one pretty-printed JSON file per category, next to
/// the snapshot files in the data directory.
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, category: &str) -> PathBuf {
        self.dir.join(format!("progress_{category}.json"))
    }

    fn ensure_dir(&self) -> Result<(), ProgressError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }
}

impl ProgressStore for FileProgressStore {
    fn save(&self, progress: &CategoryProgress) -> Result<(), ProgressError> {
        self.ensure_dir()?;
        let path = self.path_for(&progress.category);
        let json = serde_json::to_string_pretty(progress)?;
        fs::write(&path, json)?;
        debug!(
            category = %progress.category,
            processed = progress.processed_count,
            total = progress.total_count,
            "saved progress checkpoint"
        );
        Ok(())
    }

    fn load(&self, category: &str) -> Result<Option<CategoryProgress>, ProgressError> {
        let path = self.path_for(category);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn clear(&self, category: &str) -> Result<(), ProgressError> {
        let path = self.path_for(category);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

impl FileProgressStore {
    /// Directory the checkpoints live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
