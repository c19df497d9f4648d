//! Suite declarations and their validated form.
//!
//! A suite file declares groups of tests in YAML:
//!
//! ```yaml
//! name: Accents
//! replace: [accent]
//! accent: en-US
//! groups:
//!   - name: English (Scottish English)
//!     kind: parsetext
//!     tests:
//!       - test: accent/english/consonants.ipa
//!         result: accent/english/consonants.ipa
//!         accent: en-GB-scotland
//! ```
//!
//! Keys other than the ones named on [`SuiteDecl`], [`GroupDecl`] and
//! [`TestDecl`] are free-form string fields. They supply replacement values
//! and `@field` archive member references.
//!
//! [`Suite::from_decl`] turns a declaration into an immutable [`Suite`]. It
//! checks every group kind, replacement key and archive reference up front,
//! so a malformed declaration fails before any tool runs.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::HarnessConfig;
use crate::dispatch::GroupKind;
use crate::errors::{HarnessError, Result};
use crate::fixture::{ArchiveMember, Compression, FixtureSpec, MIMETYPE_MEMBER};
use crate::normalize::Replacements;

// =============================================================================
// DECLARATIONS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteDecl {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<GroupDecl>,
    /// `(location, filename)` pairs; turns every test into a zip fixture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<Vec<(String, String)>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace: Vec<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDecl {
    pub name: String,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub tests: Vec<TestDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compress: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace: Vec<String>,
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDecl {
    pub test: String,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub displayas: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl TestDecl {
    pub fn new(test: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            result: result.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn expecting(mut self, expect: impl Into<String>) -> Self {
        self.expect = Some(expect.into());
        self
    }

    /// Looks up a field by name, including the `test`/`result` paths.
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "test" => Some(&self.test),
            "result" => Some(&self.result),
            _ => self.fields.get(name).map(String::as_str),
        }
    }
}

// =============================================================================
// VALIDATED MODEL
// =============================================================================

/// Whether a test is expected to match its golden file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    #[default]
    Pass,
    Fail,
}

impl Polarity {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pass" => Some(Polarity::Pass),
            "fail" => Some(Polarity::Fail),
            _ => None,
        }
    }

    /// Tag printed next to every result, e.g. `expect-pass`.
    pub fn tag(&self) -> &'static str {
        match self {
            Polarity::Pass => "expect-pass",
            Polarity::Fail => "expect-fail",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    pub groups: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub kind: GroupKind,
    pub compression: Option<Compression>,
    pub tests: Vec<Test>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    /// The `test` path as declared, used for display and reports.
    pub name: String,
    pub input: PathBuf,
    pub expected: PathBuf,
    pub polarity: Polarity,
    pub display: String,
    pub replacements: Replacements,
    pub fixture: FixtureSpec,
}

impl Suite {
    pub fn from_decl(decl: &SuiteDecl, config: &HarnessConfig) -> Result<Self> {
        let groups = decl
            .groups
            .iter()
            .map(|group| Group::from_decl(group, decl, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: decl.name.clone(),
            groups,
        })
    }

    pub fn test_count(&self) -> usize {
        self.groups.iter().map(|g| g.tests.len()).sum()
    }
}

impl Group {
    fn from_decl(decl: &GroupDecl, suite: &SuiteDecl, config: &HarnessConfig) -> Result<Self> {
        let kind = decl
            .kind
            .parse::<GroupKind>()
            .map_err(|_| HarnessError::UnknownGroupKind {
                group: decl.name.clone(),
                kind: decl.kind.clone(),
            })?;
        let compression = decl
            .compress
            .as_deref()
            .map(|c| {
                c.parse::<Compression>()
                    .map_err(|_| HarnessError::UnknownCompression {
                        group: decl.name.clone(),
                        compression: c.to_string(),
                    })
            })
            .transpose()?;
        let tests = decl
            .tests
            .iter()
            .map(|test| Test::from_decl(test, decl, suite, compression, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: decl.name.clone(),
            kind,
            compression,
            tests,
        })
    }
}

impl Test {
    fn from_decl(
        decl: &TestDecl,
        group: &GroupDecl,
        suite: &SuiteDecl,
        compression: Option<Compression>,
        config: &HarnessConfig,
    ) -> Result<Self> {
        let polarity = match decl.expect.as_deref() {
            None => Polarity::Pass,
            Some(value) => Polarity::parse(value).ok_or_else(|| HarnessError::Configuration {
                message: format!("test '{}' has unknown expectation '{}'", decl.test, value),
                help: Some("use 'pass' or 'fail'".to_string()),
            })?,
        };
        let replacements = resolve_replacements(decl, group, suite)?;
        let fixture = match (&suite.archive, compression) {
            (Some(members), _) => FixtureSpec::Archive(resolve_archive(members, decl, config)?),
            (None, Some(compression)) => FixtureSpec::Compressed(compression),
            (None, None) => FixtureSpec::Plain,
        };
        Ok(Self {
            name: decl.test.clone(),
            input: config.resolve(&decl.test),
            expected: config.resolve(&decl.result),
            polarity,
            display: decl.displayas.clone().unwrap_or_else(|| decl.test.clone()),
            replacements,
            fixture,
        })
    }
}

/// Resolves every key named in the suite's and the group's `replace` lists.
/// A test value wins over a group default, which wins over a suite default.
pub fn resolve_replacements(
    test: &TestDecl,
    group: &GroupDecl,
    suite: &SuiteDecl,
) -> Result<Replacements> {
    let mut resolved = Replacements::new();
    for key in suite.replace.iter().chain(&group.replace) {
        let value = test
            .fields
            .get(key)
            .or_else(|| group.values.get(key))
            .or_else(|| suite.values.get(key))
            .ok_or_else(|| HarnessError::UnresolvedReplacement {
                test: test.test.clone(),
                key: key.clone(),
            })?;
        resolved.insert(key.clone(), value.clone());
    }
    Ok(resolved)
}

fn resolve_archive(
    members: &[(String, String)],
    test: &TestDecl,
    config: &HarnessConfig,
) -> Result<Vec<ArchiveMember>> {
    members
        .iter()
        .map(|(location, filename)| {
            if location == MIMETYPE_MEMBER {
                return Ok(ArchiveMember::Mimetype(filename.clone()));
            }
            let filename = match filename.strip_prefix('@') {
                Some(field) => test.field(field).ok_or_else(|| {
                    HarnessError::UnresolvedArchiveField {
                        test: test.test.clone(),
                        field: field.to_string(),
                    }
                })?,
                None => filename.as_str(),
            };
            Ok(ArchiveMember::File {
                location: location.clone(),
                source: config.resolve(filename),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config() -> HarnessConfig {
        HarnessConfig {
            root: PathBuf::from("/t"),
            ..HarnessConfig::default()
        }
    }

    fn group(kind: &str, tests: Vec<TestDecl>) -> GroupDecl {
        GroupDecl {
            name: "group".into(),
            kind: kind.into(),
            tests,
            ..GroupDecl::default()
        }
    }

    #[test]
    fn yaml_declaration_is_parsed_with_free_form_fields() {
        let yaml = r#"
name: Accents
replace: [accent]
accent: en-US
groups:
  - name: Scottish
    type: parsetext
    tests:
      - test: accent/consonants.ipa
        result: accent/consonants.en
        accent: en-GB-scotland
        expect: fail
"#;
        let decl: SuiteDecl = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(decl.values.get("accent").map(String::as_str), Some("en-US"));
        let suite = Suite::from_decl(&decl, &config()).unwrap();
        let test = &suite.groups[0].tests[0];
        assert_eq!(suite.groups[0].kind, GroupKind::ParseText);
        assert_eq!(test.polarity, Polarity::Fail);
        assert_eq!(test.input, Path::new("/t/accent/consonants.ipa"));
        assert_eq!(test.replacements.get("accent"), Some("en-GB-scotland"));
        assert_eq!(test.fixture, FixtureSpec::Plain);
    }

    #[test]
    fn replacement_precedence_is_test_then_group_then_suite() {
        let mut suite = SuiteDecl {
            name: "s".into(),
            replace: vec!["accent".into(), "voice".into()],
            ..SuiteDecl::default()
        };
        suite.values.insert("accent".into(), "suite".into());
        suite.values.insert("voice".into(), "suite-voice".into());
        let mut group = group("events", vec![]);
        group.values.insert("accent".into(), "group".into());

        let plain = TestDecl::new("a", "b");
        let overriding = TestDecl::new("a", "b").with_field("accent", "test");

        let resolved = resolve_replacements(&plain, &group, &suite).unwrap();
        assert_eq!(resolved.get("accent"), Some("group"));
        assert_eq!(resolved.get("voice"), Some("suite-voice"));

        let resolved = resolve_replacements(&overriding, &group, &suite).unwrap();
        assert_eq!(resolved.get("accent"), Some("test"));
    }

    #[test]
    fn group_replace_keys_are_honoured() {
        let suite = SuiteDecl::default();
        let mut group = group("events", vec![]);
        group.replace = vec!["ruleset".into()];
        let test = TestDecl::new("a", "b").with_field("ruleset", "context.ldb");
        let resolved = resolve_replacements(&test, &group, &suite).unwrap();
        assert_eq!(resolved.get("ruleset"), Some("context.ldb"));
    }

    #[test]
    fn unresolved_key_is_a_configuration_error() {
        let suite = SuiteDecl {
            name: "s".into(),
            replace: vec!["accent".into()],
            groups: vec![group("events", vec![TestDecl::new("a", "b")])],
            ..SuiteDecl::default()
        };
        let err = Suite::from_decl(&suite, &config()).unwrap_err();
        assert!(matches!(err, HarnessError::UnresolvedReplacement { ref key, .. } if key == "accent"));
        assert!(err.is_configuration());
    }

    #[test]
    fn unknown_kind_fails_at_construction() {
        let suite = SuiteDecl {
            name: "s".into(),
            groups: vec![
                group("events", vec![TestDecl::new("a", "b")]),
                group("phonemeset", vec![]),
            ],
            ..SuiteDecl::default()
        };
        let err = Suite::from_decl(&suite, &config()).unwrap_err();
        assert!(matches!(err, HarnessError::UnknownGroupKind { ref kind, .. } if kind == "phonemeset"));
    }

    #[test]
    fn unknown_compression_and_expectation_are_rejected() {
        let mut g = group("events", vec![]);
        g.compress = Some("zstd".into());
        let suite = SuiteDecl {
            name: "s".into(),
            groups: vec![g],
            ..SuiteDecl::default()
        };
        assert!(matches!(
            Suite::from_decl(&suite, &config()),
            Err(HarnessError::UnknownCompression { .. })
        ));

        let suite = SuiteDecl {
            name: "s".into(),
            groups: vec![group("events", vec![TestDecl::new("a", "b").expecting("maybe")])],
            ..SuiteDecl::default()
        };
        assert!(matches!(
            Suite::from_decl(&suite, &config()),
            Err(HarnessError::Configuration { .. })
        ));
    }

    #[test]
    fn archive_members_resolve_test_fields() {
        let suite = SuiteDecl {
            name: "EPUB".into(),
            archive: Some(vec![
                ("mimetype".into(), "application/epub+zip".into()),
                ("OEBPS/content.opf".into(), "@test".into()),
                ("OEBPS/toc.ncx".into(), "@ncx".into()),
                ("META-INF/container.xml".into(), "epub/container.xml".into()),
            ]),
            groups: vec![GroupDecl {
                compress: Some("gzip".into()),
                ..group(
                    "metadata-turtle",
                    vec![TestDecl::new("epub/a.opf", "epub/a.n3").with_field("ncx", "epub/a.ncx")],
                )
            }],
            ..SuiteDecl::default()
        };
        let suite = Suite::from_decl(&suite, &config()).unwrap();
        let FixtureSpec::Archive(members) = &suite.groups[0].tests[0].fixture else {
            panic!("archive declaration should take precedence over compression");
        };
        assert_eq!(members[0], ArchiveMember::Mimetype("application/epub+zip".into()));
        assert_eq!(
            members[1],
            ArchiveMember::File {
                location: "OEBPS/content.opf".into(),
                source: PathBuf::from("/t/epub/a.opf"),
            }
        );
        assert_eq!(
            members[2],
            ArchiveMember::File {
                location: "OEBPS/toc.ncx".into(),
                source: PathBuf::from("/t/epub/a.ncx"),
            }
        );
    }

    #[test]
    fn missing_archive_field_is_reported() {
        let suite = SuiteDecl {
            name: "EPUB".into(),
            archive: Some(vec![("OEBPS/toc.ncx".into(), "@ncx".into())]),
            groups: vec![group("events", vec![TestDecl::new("a", "b")])],
            ..SuiteDecl::default()
        };
        assert!(matches!(
            Suite::from_decl(&suite, &config()),
            Err(HarnessError::UnresolvedArchiveField { ref field, .. }) if field == "ncx"
        ));
    }
}
