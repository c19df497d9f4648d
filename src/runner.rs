use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::config::{HarnessConfig, DATA_DIRS_VAR};
use crate::dispatch::ToolInvocation;
use crate::errors::{HarnessError, Result};

/// Runs a tool under test against one fixture with stdout captured to a file.
///
/// The exit status is handed back for logging only; whether a test passes is
/// decided purely on the captured text.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    data_dirs: OsString,
}

impl CommandRunner {
    pub fn new(data_dirs: impl Into<OsString>) -> Self {
        Self {
            data_dirs: data_dirs.into(),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.data_search_path())
    }

    pub fn data_dirs(&self) -> &OsString {
        &self.data_dirs
    }

    pub fn run(
        &self,
        invocation: &ToolInvocation,
        fixture: &Path,
        capture: &Path,
    ) -> Result<ExitStatus> {
        let out = File::create(capture)
            .map_err(|e| HarnessError::io(format!("cannot create {}", capture.display()), e))?;
        Command::new(&invocation.program)
            .args(invocation.args(fixture))
            .env(DATA_DIRS_VAR, &self.data_dirs)
            .stdin(Stdio::null())
            .stdout(out)
            .status()
            .map_err(|e| {
                HarnessError::tool(
                    invocation.program.display().to_string(),
                    format!("cannot be started: {e}"),
                )
            })
    }
}
