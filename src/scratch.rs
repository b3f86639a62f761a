//! Scratch directory for transient video files.
//!
//! The embedding layer (an upload dashboard, a batch driver) parks input and
//! output videos here while a run is in flight. `ScratchDir` owns the
//! directory as an explicit resource: files live exactly as long as the value
//! does, and the whole tree is removed on drop. This replaces any
//! process-wide cleanup hook with scoped acquisition and release.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp root.
    pub fn new() -> Result<Self> {
        let dir = TempDir::with_prefix("posemark-").context("create scratch directory")?;
        log::debug!("scratch directory at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for an uploaded input video. The file name is flattened so a
    /// hostile upload name cannot escape the directory.
    pub fn input_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(sanitize_file_name(name))
    }

    /// Path for the annotated output derived from an input name.
    pub fn output_path(&self, name: &str) -> PathBuf {
        let safe = sanitize_file_name(name);
        self.dir.path().join(format!("landmarked_{}", safe))
    }
}

/// Strip path components and anything exotic from an upload file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['.', '_']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_is_removed_on_drop() {
        let scratch = ScratchDir::new().unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::write(scratch.input_path("clip.mp4"), b"data").unwrap();
        assert!(path.exists());
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn upload_names_cannot_escape_the_directory() {
        let scratch = ScratchDir::new().unwrap();
        let path = scratch.input_path("../../etc/passwd");
        assert!(path.starts_with(scratch.path()));
        assert!(!path.to_string_lossy().contains(".."));
    }

    #[test]
    fn output_name_is_derived_from_input() {
        let scratch = ScratchDir::new().unwrap();
        let path = scratch.output_path("Dance1.mp4");
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("landmarked_Dance1"));
    }

    #[test]
    fn degenerate_names_fall_back() {
        assert_eq!(sanitize_file_name("..."), "upload");
        assert_eq!(sanitize_file_name("a b.mp4"), "a_b.mp4");
    }
}
