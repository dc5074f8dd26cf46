use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::layout;

/// Where harvested artifacts end up.
pub trait Sink {
    fn create_dir(&self, dir: &Path) -> Result<()>;

    fn write_text(&self, dir: &Path, stem: &str, ext: &str, content: &str) -> Result<()> {
        self.write_binary(dir, stem, ext, content.as_bytes())
    }

    fn write_binary(&self, dir: &Path, stem: &str, ext: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes artifacts to the local filesystem.
///
/// Each file is written to a temporary sibling and renamed into place, so an
/// interrupted run never leaves a truncated artifact behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl Sink for FsSink {
    fn create_dir(&self, dir: &Path) -> Result<()> {
        fs_err::create_dir_all(dir)?;
        Ok(())
    }

    fn write_binary(&self, dir: &Path, stem: &str, ext: &str, bytes: &[u8]) -> Result<()> {
        self.create_dir(dir)?;
        let path = dir.join(layout::file_name(stem, ext));
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Couldn't create temporary file in {}", dir.display()))?;
        tmp.write_all(bytes)
            .with_context(|| format!("Couldn't write {}", path.display()))?;
        tmp.persist(&path)
            .with_context(|| format!("Couldn't persist {}", path.display()))?;
        Ok(())
    }
}
