//! Group kinds and the tool invocation each one selects.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::config::ToolPaths;

/// Output format requested from the metadata tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataFormat {
    NTriple,
    Turtle,
    Vorbis,
}

impl MetadataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataFormat::NTriple => "ntriple",
            MetadataFormat::Turtle => "turtle",
            MetadataFormat::Vorbis => "vorbis",
        }
    }
}

/// The closed set of group kinds a suite may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum GroupKind {
    Metadata(MetadataFormat),
    Events,
    XmlReader,
    ParseText,
}

impl GroupKind {
    pub const ALL: [GroupKind; 6] = [
        GroupKind::Metadata(MetadataFormat::NTriple),
        GroupKind::Metadata(MetadataFormat::Turtle),
        GroupKind::Metadata(MetadataFormat::Vorbis),
        GroupKind::Events,
        GroupKind::XmlReader,
        GroupKind::ParseText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Metadata(MetadataFormat::NTriple) => "metadata-ntriple",
            GroupKind::Metadata(MetadataFormat::Turtle) => "metadata-turtle",
            GroupKind::Metadata(MetadataFormat::Vorbis) => "metadata-vorbis",
            GroupKind::Events => "events",
            GroupKind::XmlReader => "xmlreader",
            GroupKind::ParseText => "parsetext",
        }
    }

    /// The command used to check every test of a group of this kind.
    pub fn invocation(&self, tools: &ToolPaths) -> ToolInvocation {
        match self {
            GroupKind::Metadata(format) => ToolInvocation {
                program: tools.metadata.clone(),
                flag: Some(format!("--{}", format.as_str())),
                description: format!("as {} metadata", format.as_str()),
            },
            GroupKind::Events => ToolInvocation {
                program: tools.events.clone(),
                flag: None,
                description: "as text/speech events".to_string(),
            },
            GroupKind::XmlReader => ToolInvocation {
                program: tools.xmlreader.clone(),
                flag: None,
                description: "as xmlreader tags".to_string(),
            },
            GroupKind::ParseText => ToolInvocation {
                program: tools.parsetext.clone(),
                flag: None,
                description: "as parsetext tags".to_string(),
            },
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<GroupKind> for String {
    fn from(kind: GroupKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Returned when a kind string is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for GroupKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A tool under test and the arguments that precede the fixture path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: PathBuf,
    pub flag: Option<String>,
    /// Human-readable tail of the progress line, e.g. "as turtle metadata".
    pub description: String,
}

impl ToolInvocation {
    pub fn args(&self, fixture: &Path) -> Vec<OsString> {
        let mut args = Vec::with_capacity(2);
        if let Some(flag) = &self.flag {
            args.push(OsString::from(flag));
        }
        args.push(fixture.as_os_str().to_owned());
        args
    }

    /// The command line as it would be typed in a shell, for verbose logs.
    pub fn display(&self, fixture: &Path) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.args(fixture) {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}
