//! Command-line arguments and subcommands, declared with clap's derive API.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ColorMode;

#[derive(Debug, Parser)]
#[command(
    name = "golden-harness",
    version,
    about = "Checks the text output of command-line tools against golden files."
)]
pub struct HarnessArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every suite found in the given files and directories.
    Run {
        #[command(flatten)]
        suites: SuitePaths,
        #[command(flatten)]
        options: RunOptions,
    },
    /// List suites, groups and test counts without running anything.
    List {
        #[command(flatten)]
        suites: SuitePaths,
        #[command(flatten)]
        options: ConfigOptions,
    },
    /// Validate suite declarations: kinds, replacements and archive fields.
    Check {
        #[command(flatten)]
        suites: SuitePaths,
        #[command(flatten)]
        options: ConfigOptions,
    },
}

#[derive(Debug, Args)]
pub struct SuitePaths {
    /// Suite files, or directories searched for *.yaml / *.yml.
    #[arg(default_value = "tests")]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConfigOptions {
    /// Only consider the suite with this name.
    #[arg(long, value_name = "SUITE")]
    pub only: Option<String>,

    /// YAML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base directory for test, result and tool paths.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunOptions {
    #[command(flatten)]
    pub common: ConfigOptions,

    /// Name printed in the summary banner; defaults to the first suite file's stem.
    #[arg(long)]
    pub name: Option<String>,

    /// Bundled runtime data directory passed to tools first in XDG_DATA_DIRS.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// External diff viewer invoked with the expected and actual files.
    #[arg(long, value_name = "PROGRAM")]
    pub diff_program: Option<String>,

    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// Write a JSON report of every executed test.
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,

    /// Log command lines, exit statuses and scratch paths.
    #[arg(short, long)]
    pub verbose: bool,
}
