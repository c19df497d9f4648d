//! Harness error type.
//!
//! Every failure that aborts a run is a [`HarnessError`]. Output mismatches are
//! not errors: they are counted verdicts. The only exception is
//! [`HarnessError::TestsFailed`], which `summary()` returns so that the calling
//! process can turn a failing run into a non-zero exit.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;

#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    #[error("configuration error: {message}")]
    #[diagnostic(code(harness::config))]
    Configuration {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("group '{group}' declares unknown kind '{kind}'")]
    #[diagnostic(
        code(harness::config::kind),
        help("expected one of: metadata-ntriple, metadata-turtle, metadata-vorbis, events, xmlreader, parsetext")
    )]
    UnknownGroupKind { group: String, kind: String },

    #[error("group '{group}' declares unknown compression '{compression}'")]
    #[diagnostic(
        code(harness::config::compress),
        help("expected one of: gzip, bzip2, lzma")
    )]
    UnknownCompression { group: String, compression: String },

    #[error("test '{test}' has no value for replacement key '{key}'")]
    #[diagnostic(
        code(harness::config::replace),
        help("set the key on the test, or give it a default on the group or suite")
    )]
    UnresolvedReplacement { test: String, key: String },

    #[error("test '{test}' has no field '{field}' referenced by the archive declaration")]
    #[diagnostic(code(harness::config::archive))]
    UnresolvedArchiveField { test: String, field: String },

    #[error("fixture file not found: {}", path.display())]
    #[diagnostic(code(harness::fixture::missing))]
    MissingFixture { path: PathBuf },

    #[error("archive member source cannot be opened: {}", path.display())]
    #[diagnostic(code(harness::fixture::member))]
    MissingMember {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build archive fixture")]
    #[diagnostic(code(harness::fixture::archive))]
    Archive {
        #[from]
        source: zip::result::ZipError,
    },

    #[error("external tool '{program}' failed: {message}")]
    #[diagnostic(code(harness::tool))]
    ExternalTool { program: String, message: String },

    #[error("{context}")]
    #[diagnostic(code(harness::io))]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse suite file {}", path.display())]
    #[diagnostic(code(harness::suite::parse))]
    SuiteParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot parse config file {}", path.display())]
    #[diagnostic(code(harness::config::parse))]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot write report")]
    #[diagnostic(code(harness::report))]
    Report {
        #[from]
        source: serde_json::Error,
    },

    #[error("{failed} test(s) failed")]
    #[diagnostic(code(harness::failed))]
    TestsFailed { failed: usize },
}

impl HarnessError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn tool(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            program: program.into(),
            message: message.into(),
        }
    }

    /// True for errors that come from a malformed declaration rather than
    /// from the environment the run happens in.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::ConfigParse { .. }
                | Self::UnknownGroupKind { .. }
                | Self::UnknownCompression { .. }
                | Self::UnresolvedReplacement { .. }
                | Self::UnresolvedArchiveField { .. }
        )
    }
}

/// Prints an error with full miette diagnostics on stderr.
pub fn print_error(error: HarnessError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
