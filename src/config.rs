//! Harness configuration.
//!
//! Mirrors how the test runner configures itself: a plain struct with a
//! `Default` impl, optionally loaded from YAML and then overridden by CLI
//! flags. Relative paths are resolved against [`HarnessConfig::root`].

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use termcolor::ColorChoice;

use crate::errors::{HarnessError, Result};

/// Environment variable that carries the data search path to tools.
pub const DATA_DIRS_VAR: &str = "XDG_DATA_DIRS";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(&self) -> ColorChoice {
        match self {
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// Locations of the tools under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub metadata: PathBuf,
    pub events: PathBuf,
    pub xmlreader: PathBuf,
    pub parsetext: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            metadata: PathBuf::from("../src/apps/metadata/metadata"),
            events: PathBuf::from("events"),
            xmlreader: PathBuf::from("xmlreader"),
            parsetext: PathBuf::from("parsetext"),
        }
    }
}

impl ToolPaths {
    fn resolved(&self, root: &Path) -> Self {
        Self {
            metadata: root.join(&self.metadata),
            events: root.join(&self.events),
            xmlreader: root.join(&self.xmlreader),
            parsetext: root.join(&self.parsetext),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base directory for test, result, archive member and tool paths.
    pub root: PathBuf,
    /// Bundled runtime data; defaults to `<root>/../data`.
    pub data_dir: Option<PathBuf>,
    pub system_data_dirs: Vec<PathBuf>,
    pub tools: ToolPaths,
    /// External diff viewer, e.g. `meld` or `diff -u`. Invoked with the
    /// expected and actual scratch files appended.
    pub diff_program: Option<String>,
    pub color: ColorMode,
    pub verbose: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            data_dir: None,
            system_data_dirs: vec![
                PathBuf::from("/usr/local/share/"),
                PathBuf::from("/usr/share/"),
            ],
            tools: ToolPaths::default(),
            diff_program: None,
            color: ColorMode::Auto,
            verbose: false,
        }
    }
}

impl HarnessConfig {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| HarnessError::io(format!("cannot read config {}", path.display()), e))?;
        serde_yaml::from_str(&content).map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => self.root.join(dir),
            None => self.root.join("../data"),
        }
    }

    pub fn tool_paths(&self) -> ToolPaths {
        self.tools.resolved(&self.root)
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Value for [`DATA_DIRS_VAR`]: bundled data first, then system dirs.
    pub fn data_search_path(&self) -> OsString {
        let mut value = OsString::from(self.data_dir());
        for dir in &self.system_data_dirs {
            value.push(":");
            value.push(dir);
        }
        value
    }

    /// Splits [`HarnessConfig::diff_program`] into program and leading args.
    pub fn diff_command(&self) -> Option<Vec<String>> {
        let words: Vec<String> = self
            .diff_program
            .as_deref()?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        (!words.is_empty()).then_some(words)
    }
}
