//! User-facing progress output.
//!
//! The reporter owns the colour stream and the optional external diff viewer.
//! Output follows the same shape for every run:
//!
//! ```text
//! testing Accents :: English (General American) ...
//! ... checking accent/english/consonants.ipa as parsetext tags ... passed [expect-pass]
//! ```
//!
//! followed by a diff block for anything surprising and a summary banner.

use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorSpec, StandardStream, WriteColor};

use crate::compare::Verdict;
use crate::config::HarnessConfig;
use crate::errors::{HarnessError, Result};
use crate::harness::Tally;
use crate::scratch::Scratch;
use crate::suite::Polarity;

/// Lines of unchanged context around each diff hunk.
const DIFF_CONTEXT: usize = 3;
/// `Changeset` keeps an `expected * actual` table. Past this many cells the
/// diff falls back to removing every expected line and adding every actual one.
pub const MAX_DIFF_CELLS: usize = 4_000_000;
const RULE_WIDTH: usize = 75;

pub struct Reporter<W: WriteColor> {
    out: W,
    diff_program: Option<Vec<String>>,
    verbose: bool,
}

impl Reporter<StandardStream> {
    pub fn stdout(config: &HarnessConfig) -> Self {
        Self::new(
            StandardStream::stdout(config.color.choice()),
            config.diff_command(),
            config.verbose,
        )
    }
}

impl<W: WriteColor> Reporter<W> {
    pub fn new(out: W, diff_program: Option<Vec<String>>, verbose: bool) -> Self {
        Self {
            out,
            diff_program,
            verbose,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn banner(&mut self, suite: &str, group: &str) -> Result<()> {
        self.colored(ColorSpec::new().set_bold(true), |out| {
            writeln!(out, "testing {suite} :: {group} ...")
        })
    }

    pub fn checking(&mut self, display: &str, description: &str) -> Result<()> {
        write_out(write!(self.out, "... checking {display} {description} ... "))?;
        write_out(self.out.flush())
    }

    pub fn result(&mut self, passed: bool, polarity: Polarity) -> Result<()> {
        let (word, color) = if passed {
            ("passed", Color::Green)
        } else {
            ("failed", Color::Red)
        };
        self.colored(ColorSpec::new().set_fg(Some(color)), |out| write!(out, "{word}"))?;
        write_out(writeln!(self.out, " [{polarity}]"))
    }

    /// Logs a detail line when verbose output is enabled.
    pub fn note(&mut self, message: impl AsRef<str>) -> Result<()> {
        if !self.verbose {
            return Ok(());
        }
        let message = message.as_ref();
        self.colored(ColorSpec::new().set_dimmed(true), |out| {
            writeln!(out, "    note: {message}")
        })
    }

    /// Shows the difference between expected and actual lines, either inline
    /// or through the configured external viewer.
    pub fn diff(&mut self, verdict: &Verdict, scratch: &mut Scratch) -> Result<()> {
        match self.diff_program.clone() {
            Some(program) => self.external_diff(&program, verdict, scratch),
            None => self.inline_diff(&verdict.expected, &verdict.actual),
        }
    }

    pub fn inline_diff(&mut self, expected: &[String], actual: &[String]) -> Result<()> {
        write_out(writeln!(self.out, "    {}", ">".repeat(RULE_WIDTH)))?;
        for line in unified_diff(expected, actual, DIFF_CONTEXT) {
            let mut spec = ColorSpec::new();
            match line.chars().next() {
                Some('+') if !line.starts_with("+++") => spec.set_fg(Some(Color::Green)),
                Some('-') if !line.starts_with("---") => spec.set_fg(Some(Color::Red)),
                Some('@') => spec.set_fg(Some(Color::Cyan)),
                _ => &mut spec,
            };
            write_out(write!(self.out, "    | "))?;
            self.colored(&spec, |out| writeln!(out, "{line}"))?;
        }
        write_out(writeln!(self.out, "    {}", "<".repeat(RULE_WIDTH)))
    }

    fn external_diff(
        &mut self,
        program: &[String],
        verdict: &Verdict,
        scratch: &mut Scratch,
    ) -> Result<()> {
        let expected = scratch.file("expected");
        let got = scratch.file("got");
        write_lines(&expected, &verdict.expected)?;
        write_lines(&got, &verdict.actual)?;
        write_out(self.out.flush())?;

        let (name, args) = program
            .split_first()
            .ok_or_else(|| HarnessError::config("diff program is empty"))?;
        let status = Command::new(name)
            .args(args)
            .arg(&expected)
            .arg(&got)
            .status()
            .map_err(|e| HarnessError::tool(name.clone(), format!("cannot be started: {e}")))?;
        self.note(format!("{name} exited with {status}"))
    }

    pub fn summary(&mut self, name: &str, tally: &Tally) -> Result<()> {
        self.colored(ColorSpec::new().set_bold(true), |out| {
            writeln!(out, "========== summary of the {name} test results ==========")
        })?;
        write_out(writeln!(self.out, "  {:>4} passed", tally.passed))?;
        write_out(writeln!(self.out, "  {:>4} failed", tally.failed))?;
        write_out(writeln!(self.out, "  {:>4} total", tally.total()))?;
        write_out(writeln!(self.out))?;
        write_out(self.out.flush())
    }

    fn colored(
        &mut self,
        spec: &ColorSpec,
        f: impl FnOnce(&mut W) -> io::Result<()>,
    ) -> Result<()> {
        write_out(self.out.set_color(spec))?;
        let written = f(&mut self.out);
        let reset = self.out.reset();
        write_out(written)?;
        write_out(reset)
    }
}

fn write_out<T>(result: io::Result<T>) -> Result<T> {
    result.map_err(|e| HarnessError::io("cannot write harness output", e))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    std::fs::write(path, lines.join("\n"))
        .map_err(|e| HarnessError::io(format!("cannot write {}", path.display()), e))
}

// =============================================================================
// UNIFIED DIFF
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Same,
    Removed,
    Added,
}

impl Tag {
    fn prefix(&self) -> char {
        match self {
            Tag::Same => ' ',
            Tag::Removed => '-',
            Tag::Added => '+',
        }
    }
}

fn line_ops<'a>(expected: &'a [String], actual: &'a [String]) -> Vec<(Tag, String)> {
    if expected.is_empty() {
        return actual.iter().map(|l| (Tag::Added, l.clone())).collect();
    }
    if actual.is_empty() || expected.len().saturating_mul(actual.len()) > MAX_DIFF_CELLS {
        return expected
            .iter()
            .map(|l| (Tag::Removed, l.clone()))
            .chain(actual.iter().map(|l| (Tag::Added, l.clone())))
            .collect();
    }
    let changeset = Changeset::new(&expected.join("\n"), &actual.join("\n"), "\n");
    let mut ops = Vec::new();
    for diff in changeset.diffs {
        let (tag, chunk) = match diff {
            Difference::Same(chunk) => (Tag::Same, chunk),
            Difference::Rem(chunk) => (Tag::Removed, chunk),
            Difference::Add(chunk) => (Tag::Added, chunk),
        };
        ops.extend(chunk.split('\n').map(|line| (tag, line.to_string())));
    }
    ops
}

fn hunk_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

/// Builds `--- expected` / `+++ got` unified diff lines with `context`
/// unchanged lines around each change. Empty when the inputs are equal.
pub fn unified_diff(expected: &[String], actual: &[String], context: usize) -> Vec<String> {
    if expected == actual {
        return Vec::new();
    }
    let ops = line_ops(expected, actual);

    // Position in (expected, actual) just before each op.
    let mut positions = Vec::with_capacity(ops.len());
    let (mut old, mut new) = (0, 0);
    for (tag, _) in &ops {
        positions.push((old, new));
        match tag {
            Tag::Same => {
                old += 1;
                new += 1;
            }
            Tag::Removed => old += 1,
            Tag::Added => new += 1,
        }
    }

    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for (i, _) in ops.iter().enumerate().filter(|(_, (t, _))| *t != Tag::Same) {
        let start = i.saturating_sub(context);
        let end = (i + context + 1).min(ops.len());
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => hunks.push((start, end)),
        }
    }

    let mut lines = vec!["--- expected".to_string(), "+++ got".to_string()];
    for (start, end) in hunks {
        let slice = &ops[start..end];
        let old_len = slice.iter().filter(|(t, _)| *t != Tag::Added).count();
        let new_len = slice.iter().filter(|(t, _)| *t != Tag::Removed).count();
        let (old_start, new_start) = positions[start];
        lines.push(format!(
            "@@ -{} +{} @@",
            hunk_range(old_start, old_len),
            hunk_range(new_start, new_len)
        ));
        lines.extend(slice.iter().map(|(tag, line)| format!("{}{}", tag.prefix(), line)));
    }
    lines
}
