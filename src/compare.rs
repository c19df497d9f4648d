//! Golden-file comparison.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::errors::{HarnessError, Result};
use crate::normalize::{normalize_actual, normalize_expected, Replacements};
use crate::suite::Polarity;

/// Outcome of comparing one test's output against its golden file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub passed: bool,
    pub polarity: Polarity,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
    /// Exit code of the tool under test. Informational only.
    pub exit_code: Option<i32>,
}

impl Verdict {
    pub fn new(polarity: Polarity, expected: Vec<String>, actual: Vec<String>) -> Self {
        let equal = expected == actual;
        let passed = match polarity {
            Polarity::Pass => equal,
            Polarity::Fail => !equal,
        };
        Self {
            passed,
            polarity,
            expected,
            actual,
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// A diff is shown for every failure and for every expect-fail test, so
    /// that an expected difference stays visible.
    pub fn wants_diff(&self) -> bool {
        !self.passed || self.polarity == Polarity::Fail
    }
}

/// Compares already-read golden and captured text.
pub fn compare_text(
    expected: &str,
    actual: &str,
    fixture: &Path,
    replacements: &Replacements,
    polarity: Polarity,
    year: i32,
) -> Verdict {
    Verdict::new(
        polarity,
        normalize_expected(expected, year, replacements),
        normalize_actual(actual, fixture, replacements),
    )
}

/// Reads the golden file and the capture file, then compares them.
pub fn compare_files(
    expected: &Path,
    capture: &Path,
    fixture: &Path,
    replacements: &Replacements,
    polarity: Polarity,
    year: i32,
) -> Result<Verdict> {
    let expected_text = read_text(expected)?;
    let actual_text = read_text(capture)?;
    Ok(compare_text(
        &expected_text,
        &actual_text,
        fixture,
        replacements,
        polarity,
        year,
    ))
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => HarnessError::MissingFixture {
            path: path.to_path_buf(),
        },
        _ => HarnessError::io(format!("cannot read {}", path.display()), e),
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn verdict(expected: &str, actual: &str, polarity: Polarity) -> Verdict {
        compare_text(
            expected,
            actual,
            Path::new("/scratch/in.txt"),
            &Replacements::new(),
            polarity,
            2024,
        )
    }

    #[test]
    fn identical_output_passes() {
        let v = verdict("ab\ncd\n", "ab\ncd\n", Polarity::Pass);
        assert!(v.passed);
        assert!(!v.wants_diff());
    }

    #[test]
    fn trailing_blank_line_is_ignored() {
        assert!(verdict("ab", "ab\n\n", Polarity::Pass).passed);
    }

    #[test]
    fn placeholders_resolve_in_golden_file() {
        let repl: Replacements = [("accent", "en-US")].into_iter().collect();
        let v = compare_text(
            "@accent@ test\n",
            "en-US test\n",
            Path::new("in"),
            &repl,
            Polarity::Pass,
            2024,
        );
        assert!(v.passed);
        assert_eq!(v.expected, vec!["en-US test"]);
    }

    #[test]
    fn expect_fail_inverts_and_always_wants_a_diff() {
        let differing = verdict("a", "b", Polarity::Fail);
        assert!(differing.passed);
        assert!(differing.wants_diff());

        let matching = verdict("a", "a", Polarity::Fail);
        assert!(!matching.passed);
        assert!(matching.wants_diff());
    }

    #[test]
    fn missing_golden_file_is_a_missing_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("capture");
        fs::write(&capture, "x").unwrap();
        let err = compare_files(
            &dir.path().join("absent.golden"),
            &capture,
            Path::new("in"),
            &Replacements::new(),
            Polarity::Pass,
            2024,
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::MissingFixture { .. }));
    }

    proptest! {
        #[test]
        fn polarity_decides_on_equality(
            expected in proptest::collection::vec("[a-z]{1,4}", 0..5),
            actual in proptest::collection::vec("[a-z]{1,4}", 0..5),
        ) {
            let equal = expected == actual;
            let pass = Verdict::new(Polarity::Pass, expected.clone(), actual.clone());
            let fail = Verdict::new(Polarity::Fail, expected, actual);
            prop_assert_eq!(pass.passed, equal);
            prop_assert_eq!(fail.passed, !equal);
        }
    }
}
