use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{HarnessError, Result};
use crate::suite::SuiteDecl;

fn is_suite_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

/// Recursively finds suite files under `root`, sorted for a deterministic
/// run order.
pub fn discover_suite_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root.as_ref()) {
        let entry = entry.map_err(|e| {
            let context = format!("cannot walk {}", root.as_ref().display());
            match e.into_io_error() {
                Some(io) => HarnessError::io(context, io),
                None => HarnessError::config(format!("{context}: filesystem loop")),
            }
        })?;
        if !entry.file_type().is_file() || !is_suite_file(entry.path()) {
            continue;
        }
        files.push(entry.path().to_path_buf());
    }
    files.sort();
    Ok(files)
}

/// Expands a mix of files and directories into suite files. Files named
/// explicitly are kept whatever their extension.
pub fn collect_suite_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(discover_suite_files(path)?);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(HarnessError::MissingFixture { path: path.clone() });
        }
    }
    Ok(files)
}

pub fn load_suite(path: &Path) -> Result<SuiteDecl> {
    let content = fs::read_to_string(path)
        .map_err(|e| HarnessError::io(format!("cannot read {}", path.display()), e))?;
    serde_yaml::from_str(&content).map_err(|source| HarnessError::SuiteParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_suites(paths: &[PathBuf]) -> Result<Vec<SuiteDecl>> {
    paths.iter().map(|path| load_suite(path)).collect()
}
