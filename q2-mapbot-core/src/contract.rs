//! # contract: capabilities the ingestion pipeline consumes
//!
//! The pipeline never downloads, validates maps or talks to git directly. It goes through the
//! three traits below, so the real implementations ([`crate::download::HttpDownloader`],
//! [`crate::bsp::BspValidator`], [`crate::git::GitRepository`]) can be swapped for a
//! library binding or a mock.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`; `MockDownloader`, `MockMapValidator` and
//!   `MockRepository` are exported under the `test-export-mocks` feature.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::{FormatValidationError, PublishError};

/// Error type for Downloader trait (simple boxed error for now)
pub type DownloadError = Box<dyn std::error::Error + Send + Sync>;

/// Fetches the bytes behind an attachment URL.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

/// What a map validator reports about an accepted `.bsp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MapSummary {
    pub entity_count: usize,
    pub texture_count: usize,
    pub byte_size: u64,
}

/// Structural check of a standalone map file. The error message is shown to the uploader
/// verbatim, so it should read well on its own.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait MapValidator: Send + Sync {
    fn validate(&self, path: &Path) -> Result<MapSummary, FormatValidationError>;
}

/// One add → commit → push unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTransaction {
    pub message: String,
    /// Paths relative to the working tree root.
    pub paths: BTreeSet<PathBuf>,
}

/// Stage, commit and push as a single capability.
///
/// There is no rollback: if a step fails, whatever the earlier steps did stays in the
/// working tree and index for an operator to sort out.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    async fn publish(&self, transaction: &PublishTransaction) -> Result<(), PublishError>;
}
