use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::SnapshotMode;

/// Point-in-time listing of the files below a collection directory.
///
/// Directories are keyed relative to the snapshot root. A snapshot is never
/// updated after capture.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    root: PathBuf,
    dirs: HashMap<PathBuf, HashSet<String>>,
}

impl Snapshot {
    /// Walks `root` recursively. A missing root yields an empty snapshot.
    pub fn capture(root: &Path) -> Result<Self> {
        let mut snapshot = Self {
            root: root.to_path_buf(),
            dirs: HashMap::new(),
        };
        let mut pending = vec![PathBuf::new()];
        while let Some(rel) = pending.pop() {
            let entries = match fs_err::read_dir(root.join(&rel)) {
                Ok(entries) => entries,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let mut files = HashSet::new();
            for entry in entries {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type()?.is_dir() {
                    pending.push(rel.join(&name));
                } else {
                    files.insert(name);
                }
            }
            snapshot.dirs.insert(rel, files);
        }
        Ok(snapshot)
    }

    pub fn contains(&self, dir: &Path, name: &str) -> bool {
        self.files_in(dir).map_or(false, |files| files.contains(name))
    }

    /// Whether some snapshotted directory holds both `anchor` and `name`.
    pub fn has_sibling(&self, anchor: &str, name: &str) -> bool {
        self.dirs
            .values()
            .any(|files| files.contains(anchor) && files.contains(name))
    }

    pub fn len(&self) -> usize {
        self.dirs.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn files_in(&self, dir: &Path) -> Option<&HashSet<String>> {
        let rel = dir.strip_prefix(&self.root).unwrap_or(dir);
        self.dirs.get(rel)
    }
}

/// Answers "is this artifact already on disk" for one collection run.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    snapshot: Snapshot,
    mode: SnapshotMode,
    written: HashSet<(PathBuf, String)>,
}

impl ArtifactCache {
    pub fn new(snapshot: Snapshot, mode: SnapshotMode) -> Self {
        Self {
            snapshot,
            mode,
            written: HashSet::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn contains(&self, dir: &Path, name: &str) -> bool {
        self.snapshot.contains(dir, name) || self.was_written(dir, name)
    }

    /// Looks for `name` next to `anchor`, `anchor` being expected in `dir`.
    pub fn has_sibling(&self, dir: &Path, anchor: &str, name: &str) -> bool {
        self.snapshot.has_sibling(anchor, name) || self.was_written(dir, name)
    }

    pub fn record_write(&mut self, dir: &Path, name: String) {
        if self.mode == SnapshotMode::RefreshOnWrite {
            self.written.insert((dir.to_path_buf(), name));
        }
    }

    fn was_written(&self, dir: &Path, name: &str) -> bool {
        self.mode == SnapshotMode::RefreshOnWrite
            && self.written.contains(&(dir.to_path_buf(), name.to_string()))
    }
}
