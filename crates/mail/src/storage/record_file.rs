//! JSON record files for the downstream pipeline

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::models::{MessageId, NormalizedRecord};

/// Writes normalized records as `mail_<id>.json`
///
/// Directory structure:
/// ```text
/// incoming/
///   mail_18c2f0a1b2c3d4e5.json
///   mail_18c2f0a9ffe01234.json
/// ```
pub struct RecordWriter {
    root: PathBuf,
}

impl RecordWriter {
    /// Create a writer for the given directory
    ///
    /// The directory is created lazily by [`RecordWriter::persist`].
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Target directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the file path for a message id
    pub fn record_path(&self, id: &MessageId) -> PathBuf {
        self.root.join(format!("mail_{}.json", id))
    }

    /// Write a record, replacing any earlier file for the same id
    ///
    /// Output is pretty-printed UTF-8 with non-ASCII text left unescaped.
    pub fn persist(&self, record: &NormalizedRecord) -> Result<PathBuf> {
        config::ensure_dir(&self.root)?;

        let path = self.record_path(&record.id);
        let content = serde_json::to_string_pretty(record).context("Failed to serialize record")?;

        // Write atomically (write to temp, then rename)
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write record: {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to move record into place: {}", path.display()))?;

        debug!("Wrote record {} to {}", record.id, path.display());
        Ok(path)
    }
}
