//! Suite orchestration.
//!
//! A [`TestSuite`] runs one or more suite declarations in declaration order,
//! strictly one test at a time:
//!
//! 1. **Validation**: the declaration becomes an immutable [`Suite`]; any
//!    configuration error aborts before a single tool is started
//! 2. **Fixture**: the test input is used as-is, zipped, or compressed
//! 3. **Execution**: the group's tool runs with stdout captured
//! 4. **Comparison**: golden and captured lines are normalized and compared
//! 5. **Reporting**: a progress line, plus a diff when the result warrants one
//!
//! Mismatches are counted; every other error propagates and aborts the run.
//!
//! ```rust,no_run
//! use golden_harness::config::HarnessConfig;
//! use golden_harness::discovery::load_suite;
//! use golden_harness::harness::TestSuite;
//!
//! let config = HarnessConfig::default();
//! let decl = load_suite("tests/accent.yaml".as_ref()).unwrap();
//! let mut suite = TestSuite::new("accent", config).unwrap();
//! suite.run(&decl).unwrap();
//! if suite.summary().is_err() {
//!     std::process::exit(1);
//! }
//! ```

use std::fs::File;
use std::path::Path;

use chrono::Datelike;
use serde::Serialize;
use termcolor::{StandardStream, WriteColor};

use crate::compare::{compare_files, Verdict};
use crate::config::HarnessConfig;
use crate::dispatch::ToolInvocation;
use crate::errors::{HarnessError, Result};
use crate::fixture::FixtureSpec;
use crate::report::Reporter;
use crate::runner::CommandRunner;
use crate::scratch::Scratch;
use crate::suite::{Group, Polarity, Suite, SuiteDecl, Test};

/// Running pass/fail counts. `passed + failed` always equals the number of
/// tests executed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    fn record(&mut self, passed: bool) {
        if passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// One executed test, as written to the JSON report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    pub suite: String,
    pub group: String,
    pub test: String,
    pub polarity: Polarity,
    pub passed: bool,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    name: &'a str,
    tally: Tally,
    tests: &'a [TestRecord],
}

pub struct TestSuite<W: WriteColor> {
    name: String,
    run_only: Option<String>,
    tally: Tally,
    records: Vec<TestRecord>,
    config: HarnessConfig,
    runner: CommandRunner,
    reporter: Reporter<W>,
    scratch: Scratch,
    year: i32,
}

impl TestSuite<StandardStream> {
    /// A suite that reports to stdout, coloured per the config.
    pub fn new(name: impl Into<String>, config: HarnessConfig) -> Result<Self> {
        let reporter = Reporter::stdout(&config);
        Self::with_reporter(name, config, reporter)
    }
}

impl<W: WriteColor> TestSuite<W> {
    pub fn with_reporter(
        name: impl Into<String>,
        config: HarnessConfig,
        reporter: Reporter<W>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            run_only: None,
            tally: Tally::default(),
            records: Vec::new(),
            runner: CommandRunner::from_config(&config),
            config,
            reporter,
            scratch: Scratch::new()?,
            year: chrono::Local::now().year(),
        })
    }

    /// Restricts [`TestSuite::run`] to the declaration with this name.
    pub fn with_run_only(mut self, run_only: Option<String>) -> Self {
        self.run_only = run_only;
        self
    }

    /// Overrides the year substituted for `<DATETIME>`.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Runs every group and test of `decl`, unless a run filter excludes it.
    pub fn run(&mut self, decl: &SuiteDecl) -> Result<()> {
        self.run_all(std::slice::from_ref(decl))
    }

    /// Validates every selected declaration, then runs them in order. A
    /// malformed declaration anywhere in `decls` aborts before any tool runs.
    pub fn run_all(&mut self, decls: &[SuiteDecl]) -> Result<()> {
        let suites = decls
            .iter()
            .filter(|decl| self.is_selected(decl))
            .map(|decl| Suite::from_decl(decl, &self.config))
            .collect::<Result<Vec<_>>>()?;
        if suites.is_empty() {
            return Ok(());
        }

        self.reporter.note(format!(
            "scratch directory {}",
            self.scratch.path().display()
        ))?;
        for suite in &suites {
            for group in &suite.groups {
                self.run_group(suite, group)?;
            }
        }
        Ok(())
    }

    fn is_selected(&self, decl: &SuiteDecl) -> bool {
        self.run_only.as_ref().map_or(true, |only| &decl.name == only)
    }

    fn run_group(&mut self, suite: &Suite, group: &Group) -> Result<()> {
        self.reporter.banner(&suite.name, &group.name)?;
        let invocation = group.kind.invocation(&self.config.tool_paths());
        for test in &group.tests {
            self.reporter.checking(&test.display, &invocation.description)?;
            let verdict = self.run_test(test, &invocation)?;

            self.tally.record(verdict.passed);
            self.records.push(TestRecord {
                suite: suite.name.clone(),
                group: group.name.clone(),
                test: test.name.clone(),
                polarity: verdict.polarity,
                passed: verdict.passed,
                exit_code: verdict.exit_code,
            });
            self.reporter.result(verdict.passed, verdict.polarity)?;
            if verdict.wants_diff() {
                self.reporter.diff(&verdict, &mut self.scratch)?;
            }
        }
        Ok(())
    }

    fn run_test(
        &mut self,
        test: &Test,
        invocation: &ToolInvocation,
    ) -> Result<Verdict> {
        require_file(&test.expected)?;
        if !matches!(test.fixture, FixtureSpec::Archive(_)) {
            require_file(&test.input)?;
        }

        let fixture = test.fixture.build(&test.input, &mut self.scratch)?;
        let capture = self.scratch.file("capture.txt");
        self.reporter.note(invocation.display(&fixture))?;
        let status = self.runner.run(invocation, &fixture, &capture)?;
        if !status.success() {
            self.reporter.note(format!("tool exited with {status}"))?;
        }

        let verdict = compare_files(
            &test.expected,
            &capture,
            &fixture,
            &test.replacements,
            test.polarity,
            self.year,
        )?;
        Ok(verdict.with_exit_code(status.code()))
    }

    /// Writes the per-test records collected so far as JSON.
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| HarnessError::io(format!("cannot create {}", path.display()), e))?;
        let report = RunReport {
            name: &self.name,
            tally: self.tally,
            tests: &self.records,
        };
        serde_json::to_writer_pretty(file, &report)?;
        Ok(())
    }

    /// Prints the totals and consumes the suite. Fails when any test failed.
    pub fn summary(mut self) -> Result<Tally> {
        self.reporter.summary(&self.name, &self.tally)?;
        if self.tally.has_failures() {
            return Err(HarnessError::TestsFailed {
                failed: self.tally.failed,
            });
        }
        Ok(self.tally)
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(HarnessError::MissingFixture {
            path: path.to_path_buf(),
        })
    }
}
