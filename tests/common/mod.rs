//! Shared setup for the integration tests: a throwaway tree holding suite
//! files, inputs, golden files and stand-in tools written as shell scripts.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use golden_harness::config::{ColorMode, HarnessConfig, ToolPaths};
use tempfile::TempDir;

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// A tree with stand-in tools at the default relative locations. The
    /// `metadata` tool keeps a copy of its fixture in `seen-fixture`.
    pub fn new() -> Self {
        let ws = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        ws.tool("parsetext", r#"echo "[$1] parsed"; sed 's/^/tag: /' "$1""#);
        ws.tool("events", r#"sed 's/^/event: /' "$1""#);
        ws.tool("xmlreader", r#"echo "<$1>"; cat "$1""#);
        ws.tool(
            "metadata",
            r#"cp "$2" "$(dirname "$0")/seen-fixture"; echo "format $1""#,
        );
        ws
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn tool(&self, name: &str, body: &str) -> PathBuf {
        let path = self.file(name, &format!("#!/bin/sh\n{body}\n"));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            root: self.root().to_path_buf(),
            data_dir: Some(PathBuf::from("data")),
            tools: ToolPaths {
                metadata: PathBuf::from("metadata"),
                ..ToolPaths::default()
            },
            color: ColorMode::Never,
            ..HarnessConfig::default()
        }
    }

    /// Writes `config.yaml` describing this tree, for the CLI tests.
    pub fn config_file(&self) -> PathBuf {
        let yaml = serde_yaml::to_string(&self.config()).unwrap();
        self.file("config.yaml", &yaml)
    }
}

pub fn has_program(name: &str) -> bool {
    std::process::Command::new(name)
        .arg("--version")
        .output()
        .is_ok()
}
