// Persisted signature state — the durable "last notified review" value.
//
// A single plain-text UTF-8 file holding the most recent signature. Absence
// of the file is the expected first-run state, not an error. Writes go
// through a sibling temp file and a rename so a crash mid-write can't leave
// a half-written value behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File-backed store for the last-notified review signature.
///
/// The store exclusively owns the on-disk value: it is read once at the
/// start of a run and overwritten at most once, after classification.
pub struct SignatureStore {
    path: PathBuf,
}

impl SignatureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the previously persisted signature, trimmed of surrounding
    /// whitespace. A missing file yields the empty string (first run).
    pub fn load(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents.trim().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to read signature file: {}", self.path.display())
            }),
        }
    }

    /// Durably overwrite the stored signature.
    ///
    /// Writes the whole value to `<path>.tmp`, then renames over the target.
    /// The rename is atomic on the same filesystem, so a reader never sees
    /// a value that differs from both the old and new one.
    pub fn save(&self, signature: &str) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, signature)
            .with_context(|| format!("Failed to write signature file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| {
            format!("Failed to replace signature file: {}", self.path.display())
        })?;
        Ok(())
    }

    /// Remove the stored signature. The next run classifies as first-run.
    /// Removing an already-absent file is fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to remove signature file: {}", self.path.display())
            }),
        }
    }
}
