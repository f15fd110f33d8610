//! Error types for the status client and the ingestion pipeline.
//!
//! None of these are retried anywhere in the core. Callers map them onto user-facing
//! strings (see [`crate::status::StatusClient::report`] and [`crate::ingest`]).

use std::path::PathBuf;
use std::time::Duration;

/// A status reply that could not be decoded. The payload is discarded.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MalformedReplyError {
    #[error("reply has {lines} line(s), expected a header and an info string")]
    MissingInfoLine { lines: usize },
    #[error("info string key `{key}` has no value")]
    DanglingKey { key: String },
    #[error("unparseable player line `{line}`")]
    BadPlayerLine { line: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("{address}: connection error: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{address}: no reply within {timeout:?}")]
    Timeout { address: String, timeout: Duration },
    #[error("{address}: read error: {source}")]
    Receive {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{address}: malformed reply: {source}")]
    Malformed {
        address: String,
        #[source]
        source: MalformedReplyError,
    },
}

impl StatusError {
    #[must_use]
    pub fn connect(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            address: address.into(),
            source,
        }
    }
}

/// Errors from reading a Quake 2 PAK directory.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PakError {
    #[error("not a PAK file (bad magic)")]
    BadMagic,
    #[error("PAK header truncated")]
    Truncated,
    #[error("PAK directory at {offset}+{length} lies outside the file")]
    DirectoryOutOfBounds { offset: u32, length: u32 },
    #[error("PAK directory length {0} is not a multiple of 64")]
    DirectoryMisaligned(u32),
    #[error("PAK entry `{name}` lies outside the file")]
    EntryOutOfBounds { name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveOpenError {
    #[error("failed to read archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a recognised archive container")]
    UnknownContainer { path: PathBuf },
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error(transparent)]
    Pak(#[from] PakError),
}

/// Returned by a [`crate::contract::MapValidator`]; its message is shown to the user verbatim.
#[derive(Debug, thiserror::Error)]
pub enum FormatValidationError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("`{0}` is not a plain file name")]
    InvalidName(String),
    #[error("bad magic, expected IBSP")]
    BadMagic,
    #[error("unsupported BSP version {0}, expected 38")]
    UnsupportedVersion(i32),
    #[error("file too short for a BSP header")]
    Truncated,
    #[error("lump {index} lies outside the file")]
    LumpOutOfBounds { index: usize },
}

/// Why a standalone map was not staged.
#[derive(Debug, thiserror::Error)]
pub enum MapStageError {
    /// The upload itself is unacceptable; the message is meant for the uploader.
    #[error(transparent)]
    Invalid(#[from] FormatValidationError),
    /// The map was fine but could not be written into the working tree.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The step of the add → commit → push sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStep {
    Add,
    Commit,
    Push,
}

impl std::fmt::Display for PublishStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PublishStep::Add => "add",
            PublishStep::Commit => "commit",
            PublishStep::Push => "push",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("git {step} failed: {detail}")]
pub struct PublishError {
    pub step: PublishStep,
    pub detail: String,
}

impl PublishError {
    #[must_use]
    pub fn new(step: PublishStep, detail: impl Into<String>) -> Self {
        Self {
            step,
            detail: detail.into(),
        }
    }
}
