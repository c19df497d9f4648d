//! Fixture synthesis.
//!
//! A test's input file is handed to the tool under test either as-is, packed
//! into a freshly built zip container, or piped through an external
//! compressor first.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{HarnessError, Result};
use crate::scratch::Scratch;

/// Archive location whose filename is written verbatim as the member content.
pub const MIMETYPE_MEMBER: &str = "mimetype";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Gzip,
    Bzip2,
    Lzma,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Bzip2 => "bzip2",
            Compression::Lzma => "lzma",
        }
    }

    /// The external compressor, which is also the name it goes by.
    pub fn program(&self) -> &'static str {
        self.as_str()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Gzip => "gz",
            Compression::Bzip2 => "bz2",
            Compression::Lzma => "lzma",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gzip" => Ok(Compression::Gzip),
            "bzip2" => Ok(Compression::Bzip2),
            "lzma" => Ok(Compression::Lzma),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveMember {
    /// Stored, uncompressed `mimetype` member with the given content.
    Mimetype(String),
    /// Deflated copy of `source` at `location` inside the container.
    File { location: String, source: PathBuf },
}

/// How a test's input reaches the tool under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSpec {
    Plain,
    Archive(Vec<ArchiveMember>),
    Compressed(Compression),
}

impl FixtureSpec {
    /// Produces the path to hand to the tool for the test whose input is `input`.
    pub fn build(&self, input: &Path, scratch: &mut Scratch) -> Result<PathBuf> {
        match self {
            FixtureSpec::Plain => Ok(input.to_path_buf()),
            FixtureSpec::Archive(members) => {
                let dest = scratch.file("test.zip");
                build_archive(members, &dest)?;
                Ok(dest)
            }
            FixtureSpec::Compressed(compression) => {
                let dest = scratch.file(&format!("test.{}", compression.extension()));
                compress(*compression, input, &dest)?;
                Ok(dest)
            }
        }
    }
}

/// Writes a zip container at `dest`. `mimetype` members are always written
/// first and stored; everything else is deflated in declaration order.
pub fn build_archive(members: &[ArchiveMember], dest: &Path) -> Result<()> {
    let file = File::create(dest)
        .map_err(|e| HarnessError::io(format!("cannot create {}", dest.display()), e))?;
    let mut zip = ZipWriter::new(file);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let (mimetypes, files): (Vec<_>, Vec<_>) = members
        .iter()
        .partition(|m| matches!(m, ArchiveMember::Mimetype(_)));

    for member in mimetypes.into_iter().chain(files) {
        match member {
            ArchiveMember::Mimetype(content) => {
                zip.start_file(MIMETYPE_MEMBER, stored.clone())?;
                zip.write_all(content.as_bytes())
                    .map_err(|e| HarnessError::io("cannot write mimetype member", e))?;
            }
            ArchiveMember::File { location, source } => {
                let bytes = fs::read(source).map_err(|e| HarnessError::MissingMember {
                    path: source.clone(),
                    source: e,
                })?;
                zip.start_file(location.as_str(), deflated.clone())?;
                zip.write_all(&bytes)
                    .map_err(|e| HarnessError::io(format!("cannot write member {location}"), e))?;
            }
        }
    }
    zip.finish()?;
    Ok(())
}

/// Runs `<compressor> -c <input>` with stdout redirected to `dest`.
pub fn compress(compression: Compression, input: &Path, dest: &Path) -> Result<()> {
    compress_with(compression.program(), input, dest)
}

fn compress_with(program: &str, input: &Path, dest: &Path) -> Result<()> {
    let out = File::create(dest)
        .map_err(|e| HarnessError::io(format!("cannot create {}", dest.display()), e))?;
    let status = Command::new(program)
        .arg("-c")
        .arg(input)
        .stdin(Stdio::null())
        .stdout(out)
        .status()
        .map_err(|e| spawn_error(program, e))?;
    if !status.success() {
        return Err(HarnessError::tool(
            program,
            format!("exited with {status} while compressing {}", input.display()),
        ));
    }
    Ok(())
}

fn spawn_error(program: &str, e: io::Error) -> HarnessError {
    HarnessError::tool(program, format!("cannot be started: {e}"))
}
