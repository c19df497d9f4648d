use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::errors::{HarnessError, Result};

/// Per-run scratch directory.
///
/// Every fixture, capture and diff file gets a fresh numbered name, so two
/// tests (or two harness processes) never share a path. The directory is
/// removed when the `Scratch` is dropped.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
    counter: usize,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("golden-harness-")
            .tempdir()
            .map_err(|e| HarnessError::io("cannot create scratch directory", e))?;
        Ok(Self { dir, counter: 0 })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns an unused path such as `0003-capture.txt`.
    pub fn file(&mut self, name: &str) -> PathBuf {
        self.counter += 1;
        self.dir.path().join(format!("{:04}-{}", self.counter, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_removed_on_drop() {
        let mut scratch = Scratch::new().unwrap();
        let a = scratch.file("capture.txt");
        let b = scratch.file("capture.txt");
        assert_ne!(a, b);
        assert!(a.starts_with(scratch.path()));

        std::fs::write(&a, "x").unwrap();
        let dir = scratch.path().to_path_buf();
        drop(scratch);
        assert!(!dir.exists());
    }
}
