//! Artifact file naming (screenshots, HTML dumps, CSV exports).
//!
//! Names look like `{prefix}_{test_name}_{YYYYmmdd_HHMMSS}.{ext}`, with every
//! character outside `[A-Za-z0-9-]` in the test name replaced by `_`.

use crate::result::ScannerResult;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Timestamp layout used in artifact names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Builds artifact paths under one directory
#[derive(Debug, Clone)]
pub struct ArtifactNamer {
    dir: PathBuf,
    prefix: String,
}

impl ArtifactNamer {
    /// Create a namer writing under `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "screenshot".to_string(),
        }
    }

    /// Set the file prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Output directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for `test_name` stamped with the current local time
    #[must_use]
    pub fn path(&self, test_name: &str, ext: &str) -> PathBuf {
        self.path_at(test_name, ext, Local::now().naive_local())
    }

    /// Path for `test_name` stamped with `at`
    #[must_use]
    pub fn path_at(&self, test_name: &str, ext: &str, at: NaiveDateTime) -> PathBuf {
        let file = format!(
            "{}_{}_{}.{}",
            self.prefix,
            sanitize(test_name),
            at.format(TIMESTAMP_FORMAT),
            ext.trim_start_matches('.')
        );
        self.dir.join(file)
    }

    /// Write `bytes` to a fresh artifact path, creating the directory
    pub async fn write(&self, test_name: &str, ext: &str, bytes: &[u8]) -> ScannerResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path(test_name, ext);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "artifact written");
        Ok(path)
    }
}

/// Replace anything outside `[A-Za-z0-9-]` with `_`
#[must_use]
pub fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}
