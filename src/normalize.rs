//! Line normalization.
//!
//! Golden files and captured tool output are both reduced to a sequence of
//! non-empty lines before they are compared. Golden lines get the
//! `<DATETIME>` placeholder and `@key@` substitutions; captured lines get the
//! fixture path redacted so that output does not depend on where the scratch
//! fixture happened to live.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

/// Placeholder in golden files that stands for the current year.
pub const DATETIME_PLACEHOLDER: &str = "<DATETIME>";

/// Fully resolved `@key@` substitutions for one test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Replacements(BTreeMap<String, String>);

impl Replacements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitutes every `@key@` occurrence in `line`.
    pub fn apply(&self, line: &str) -> String {
        let mut out = line.to_string();
        for (key, value) in &self.0 {
            let placeholder = format!("@{key}@");
            if out.contains(&placeholder) {
                out = out.replace(&placeholder, value);
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Replacements {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Splits on `\n` and drops empty lines.
pub fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').filter(|line| !line.is_empty())
}

/// Normalizes golden-file text. Lines left empty by a substitution are
/// dropped as well.
pub fn normalize_expected(text: &str, year: i32, replacements: &Replacements) -> Vec<String> {
    let year = format!("{year:04}");
    non_empty_lines(text)
        .map(|line| replacements.apply(&line.replace(DATETIME_PLACEHOLDER, &year)))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Normalizes captured tool output produced from `fixture`.
pub fn normalize_actual(text: &str, fixture: &Path, replacements: &Replacements) -> Vec<String> {
    let fixture = fixture.to_string_lossy();
    non_empty_lines(text)
        .map(|line| replacements.apply(&redact_fixture_path(line, &fixture)))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Removes the fixture path where tools echo it back: after a `<` or `[`
/// anywhere on the line, and as a bare prefix of the line.
pub fn redact_fixture_path(line: &str, fixture: &str) -> String {
    if fixture.is_empty() {
        return line.to_string();
    }
    let line = line
        .replace(&format!("<{fixture}"), "<")
        .replace(&format!("[{fixture}"), "[");
    match line.strip_prefix(fixture) {
        Some(rest) => rest.to_string(),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_lines_are_dropped() {
        let lines = normalize_expected("ab\n\ncd\n", 2024, &Replacements::new());
        assert_eq!(lines, vec!["ab", "cd"]);
    }

    #[test]
    fn datetime_resolves_before_replacements() {
        let repl: Replacements = [("year", "unused")].into_iter().collect();
        let lines = normalize_expected("(c) <DATETIME> @year@", 2031, &repl);
        assert_eq!(lines, vec!["(c) 2031 unused"]);
    }

    #[test]
    fn replacement_applies_every_occurrence() {
        let repl: Replacements = [("accent", "en-US")].into_iter().collect();
        assert_eq!(repl.apply("@accent@ and @accent@"), "en-US and en-US");
        assert_eq!(repl.apply("@other@"), "@other@");
    }

    #[test]
    fn fixture_path_is_redacted() {
        let fixture = Path::new("/tmp/run/0001-test.zip");
        let text = "</tmp/run/0001-test.zip>\n[/tmp/run/0001-test.zip#chapter]\n/tmp/run/0001-test.zip: ok\n";
        let lines = normalize_actual(text, fixture, &Replacements::new());
        assert_eq!(lines, vec!["<>", "[#chapter]", ": ok"]);
    }

    #[test]
    fn lines_emptied_by_normalization_are_dropped() {
        let fixture = Path::new("/scratch/0001-test.gz");
        let lines = normalize_actual("/scratch/0001-test.gz\nab\n", fixture, &Replacements::new());
        assert_eq!(lines, vec!["ab"]);

        let repl: Replacements = [("accent", "")].into_iter().collect();
        assert_eq!(normalize_expected("@accent@\nab", 2024, &repl), vec!["ab"]);
    }

    #[test]
    fn carriage_returns_are_preserved() {
        let lines = normalize_expected("a\r\nb", 2024, &Replacements::new());
        assert_eq!(lines, vec!["a\r", "b"]);
    }

    proptest! {
        #[test]
        fn normalizing_twice_is_a_no_op(
            lines in proptest::collection::vec(
                prop_oneof![
                    "[a-z0-9 .:#-]{0,12}",
                    Just("@accent@".to_string()),
                    Just("/scratch/fixture.gz".to_string()),
                    "(/scratch/fixture.gz|</scratch/fixture.gz|\\[/scratch/fixture.gz)[a-z:>\\]]{0,6}",
                ],
                0..12,
            )
        ) {
            let empty: Replacements = [("accent", "")].into_iter().collect();
            let once = normalize_expected(&lines.join("\n"), 2024, &empty);
            prop_assert!(once.iter().all(|line| !line.is_empty()));
            let twice = normalize_expected(&once.join("\n"), 2024, &empty);
            prop_assert_eq!(&once, &twice);

            let repl: Replacements = [("accent", "en-GB")].into_iter().collect();
            let once = normalize_expected(&lines.join("\n"), 2024, &repl);
            let twice = normalize_expected(&once.join("\n"), 2024, &repl);
            prop_assert_eq!(&once, &twice);

            let fixture = Path::new("/scratch/fixture.gz");
            let once = normalize_actual(&lines.join("\n"), fixture, &repl);
            let twice = normalize_actual(&once.join("\n"), fixture, &repl);
            prop_assert_eq!(once, twice);
        }
    }
}
