//! The golden-harness command-line interface.
//!
//! Exit codes: `0` when every test passed, `1` when any test failed, and `2`
//! when the run was aborted by a configuration, fixture or tool error.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use crate::cli::args::{Command, ConfigOptions, HarnessArgs, RunOptions, SuitePaths};
use crate::config::HarnessConfig;
use crate::discovery::{collect_suite_files, load_suites};
use crate::errors::{print_error, HarnessError, Result};
use crate::harness::TestSuite;
use crate::suite::{Suite, SuiteDecl};

pub mod args;

pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ABORTED: i32 = 2;

/// The main entry point for the CLI.
pub fn run() {
    let args = HarnessArgs::parse();

    let result = match args.command {
        Command::Run { suites, options } => run_suites(&suites, &options),
        Command::List { suites, options } => list_suites(&suites, &options),
        Command::Check { suites, options } => check_suites(&suites, &options),
    };

    match result {
        Ok(()) => {}
        Err(HarnessError::TestsFailed { .. }) => process::exit(EXIT_FAILED),
        Err(e) => {
            print_error(e);
            process::exit(EXIT_ABORTED);
        }
    }
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

fn run_suites(suites: &SuitePaths, options: &RunOptions) -> Result<()> {
    let mut config = load_config(&options.common)?;
    if let Some(dir) = &options.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(program) = &options.diff_program {
        config.diff_program = Some(program.clone());
    }
    if let Some(color) = options.color {
        config.color = color;
    }
    config.verbose |= options.verbose;

    let files = collect_suite_files(&suites.paths)?;
    let decls = load_suites(&files)?;
    let name = options
        .name
        .clone()
        .unwrap_or_else(|| default_run_name(&files));

    let mut suite = TestSuite::new(name, config)?.with_run_only(options.common.only.clone());
    suite.run_all(&decls)?;
    if let Some(path) = &options.report_json {
        suite.write_report(path)?;
    }
    suite.summary().map(|_| ())
}

fn list_suites(suites: &SuitePaths, options: &ConfigOptions) -> Result<()> {
    let decls = load_selected(suites, options)?;
    for decl in &decls {
        let tests: usize = decl.groups.iter().map(|g| g.tests.len()).sum();
        println!("{} ({} groups, {} tests)", decl.name, decl.groups.len(), tests);
        for group in &decl.groups {
            let compress = group
                .compress
                .as_deref()
                .map(|c| format!(", {c}"))
                .unwrap_or_default();
            println!(
                "  {} [{}{}] {} tests",
                group.name,
                group.kind,
                compress,
                group.tests.len()
            );
        }
    }
    Ok(())
}

fn check_suites(suites: &SuitePaths, options: &ConfigOptions) -> Result<()> {
    let config = load_config(options)?;
    let decls = load_selected(suites, options)?;
    let mut invalid = 0;
    for decl in &decls {
        match Suite::from_decl(decl, &config) {
            Ok(suite) => println!(
                "ok: {} ({} groups, {} tests)",
                suite.name,
                suite.groups.len(),
                suite.test_count()
            ),
            Err(e) => {
                invalid += 1;
                println!("invalid: {}", decl.name);
                print_error(e);
            }
        }
    }
    if invalid > 0 {
        return Err(HarnessError::config(format!(
            "{invalid} suite declaration(s) are invalid"
        )));
    }
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn load_config(options: &ConfigOptions) -> Result<HarnessConfig> {
    let mut config = match &options.config {
        Some(path) => HarnessConfig::from_yaml_file(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(root) = &options.root {
        config.root = root.clone();
    }
    Ok(config)
}

fn load_selected(suites: &SuitePaths, options: &ConfigOptions) -> Result<Vec<SuiteDecl>> {
    let files = collect_suite_files(&suites.paths)?;
    let mut decls = load_suites(&files)?;
    if let Some(only) = &options.only {
        decls.retain(|d| &d.name == only);
    }
    Ok(decls)
}

fn default_run_name(files: &[PathBuf]) -> String {
    files
        .first()
        .and_then(|f| f.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "golden-harness".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_name_comes_from_the_first_suite_file() {
        let files = vec![PathBuf::from("tests/accent.yaml"), PathBuf::from("b.yaml")];
        assert_eq!(default_run_name(&files), "accent");
        assert_eq!(default_run_name(&[]), "golden-harness");
    }

    #[test]
    fn arguments_parse_into_run_options() {
        let args = HarnessArgs::try_parse_from([
            "golden-harness",
            "run",
            "suites/",
            "--only",
            "Accents",
            "--diff-program",
            "meld",
            "--color",
            "never",
            "-v",
        ])
        .unwrap();
        let Command::Run { suites, options } = args.command else {
            panic!("expected the run subcommand");
        };
        assert_eq!(suites.paths, vec![PathBuf::from("suites/")]);
        assert_eq!(options.common.only.as_deref(), Some("Accents"));
        assert_eq!(options.diff_program.as_deref(), Some("meld"));
        assert_eq!(options.color, Some(crate::config::ColorMode::Never));
        assert!(options.verbose);
    }
}
