//! Unique paths for staged body files.
//!
//! Paths are `<base_dir>/<uuid v4>`. Nothing is created on disk here; callers
//! own whatever they write to the returned path.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Return a fresh path under `base_dir`.
///
/// Safe to call from any number of loops at once: the 122 random bits of a
/// v4 UUID are the only coordination between them.
pub fn allocate(base_dir: &Path) -> PathBuf {
    base_dir.join(Uuid::new_v4().to_string())
}

/// Allocator bound to the configured response body directory.
#[derive(Debug, Clone)]
pub struct TempPathAllocator {
    base_dir: PathBuf,
}

impl TempPathAllocator {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn allocate(&self) -> PathBuf {
        allocate(&self.base_dir)
    }
}
