//! Per-attachment ingestion: classify → download → stage → publish → reply.
//!
//! Each call handles one attachment and produces the text that goes back to the uploader.
//! Unrecognised files produce no reply at all.
//!
//! # Error Handling
//! Every failure is logged with the file name and turned into a short reply. Nothing is
//! retried; files already written to the working tree stay there when publishing fails.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::bsp::BspValidator;
use crate::classify::{classify, file_name_from_url, ContentKind};
use crate::config::PipelineConfig;
use crate::contract::{Downloader, MapValidator, Repository};
use crate::download::HttpDownloader;
use crate::error::MapStageError;
use crate::git::GitRepository;
use crate::publish::PublishCoordinator;
use crate::stage::{ArchiveStager, SingleFileStager, StagingResult};

/// A file posted to a chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    /// Original file name; when empty the last URL segment is used.
    pub filename: String,
    /// Display name of the uploader, used in the commit message.
    pub submitter: String,
}

impl Attachment {
    pub fn new(
        url: impl Into<String>,
        filename: impl Into<String>,
        submitter: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            filename: filename.into(),
            submitter: submitter.into(),
        }
    }

    pub fn name(&self) -> &str {
        if self.filename.is_empty() {
            file_name_from_url(&self.url)
        } else {
            &self.filename
        }
    }
}

pub struct IngestPipeline {
    config: PipelineConfig,
    downloader: Arc<dyn Downloader>,
    archives: ArchiveStager,
    maps: SingleFileStager,
    publisher: PublishCoordinator,
}

impl IngestPipeline {
    pub fn new(
        config: PipelineConfig,
        downloader: Arc<dyn Downloader>,
        validator: Arc<dyn MapValidator>,
        repository: Arc<dyn Repository>,
    ) -> Self {
        Self {
            archives: ArchiveStager::from_config(&config),
            maps: SingleFileStager::new(validator),
            publisher: PublishCoordinator::new(repository),
            downloader,
            config,
        }
    }

    /// Pipeline wired to HTTP downloads, the BSP header validator and the git CLI.
    pub fn from_config(config: PipelineConfig) -> Self {
        let repository = GitRepository::from_config(&config);
        Self::new(
            config,
            Arc::new(HttpDownloader::new()),
            Arc::new(BspValidator::new()),
            Arc::new(repository),
        )
    }

    /// Handles one attachment. Returns `None` for files that are not game content.
    pub async fn on_attachment(&self, attachment: &Attachment) -> Option<String> {
        let name = attachment.name();
        let kind = classify(name);
        if kind == ContentKind::Unrecognized {
            debug!(file = name, url = %attachment.url, "Ignoring unrecognised attachment");
            return None;
        }
        info!(file = name, ?kind, submitter = %attachment.submitter, "Ingesting attachment");
        Some(self.ingest(kind, name, attachment).await)
    }

    async fn ingest(&self, kind: ContentKind, name: &str, attachment: &Attachment) -> String {
        let bytes = match self.downloader.download(&attachment.url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(file = name, url = %attachment.url, error = %e, "Download failed");
                return format!("Sorry, I was unable to download `{name}`");
            }
        };

        let local = match self.write_temp(&bytes) {
            Ok(file) => file,
            Err(e) => {
                error!(
                    file = name,
                    temp_dir = %self.config.temp_dir.display(),
                    error = %e,
                    "Failed to store download"
                );
                return format!("Sorry, I was unable to process `{name}`");
            }
        };

        let message = format!("Added {name}, submitted by {}", attachment.submitter);
        if kind.is_archive() {
            self.ingest_archive(name, local.path(), &message).await
        } else {
            self.ingest_map(name, local.path(), &message).await
        }
    }

    fn write_temp(&self, bytes: &[u8]) -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("q2-mapbot-")
            .tempfile_in(&self.config.temp_dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(file)
    }

    async fn ingest_map(&self, name: &str, local: &Path, message: &str) -> String {
        let result = match self.maps.stage(local, name, &self.config.repo_path) {
            Ok(result) => result,
            Err(MapStageError::Invalid(e)) => {
                warn!(file = name, error = %e, "Map rejected");
                return format!("Invalid map file `{name}`: {e}");
            }
            Err(e @ MapStageError::Write { .. }) => {
                error!(file = name, error = %e, "Failed to stage map");
                return format!("Sorry, I was unable to process `{name}`");
            }
        };
        if let Some(reply) = self.publish(name, &result, message).await {
            return reply;
        }
        match result.map_summary {
            Some(summary) => format!(
                "Added `{name}`\n```\n  {} bytes\n  {} entities\n  {} textures\n```",
                summary.byte_size, summary.entity_count, summary.texture_count
            ),
            None => format!("Added `{name}`"),
        }
    }

    async fn ingest_archive(&self, name: &str, local: &Path, message: &str) -> String {
        let result = match self.archives.stage(local, &self.config.repo_path) {
            Ok(result) => result,
            Err(e) => {
                warn!(file = name, error = %e, "Archive could not be opened");
                return format!("`{name}` is not a valid archive");
            }
        };
        if result.structure_rejected() {
            info!(
                file = name,
                rejected = result.files_rejected,
                "Archive has no content in the expected layout"
            );
            return self.layout_rejection(name);
        }
        if let Some(reply) = self.publish(name, &result, message).await {
            return reply;
        }
        format!(
            "Files in `{name}` have been committed to the repository ({} added)",
            result.files_accepted
        )
    }

    /// Publishes and returns a reply only when publishing failed.
    async fn publish(&self, name: &str, result: &StagingResult, message: &str) -> Option<String> {
        match serde_json::to_string(result) {
            Ok(json) => debug!(file = name, result = %json, "Staging result"),
            Err(e) => debug!(file = name, error = ?e, "Failed to serialize staging result"),
        }
        match self.publisher.publish(result, message).await {
            Ok(outcome) => {
                info!(file = name, ?outcome, "Published upload");
                None
            }
            Err(e) => {
                error!(file = name, step = %e.step, error = %e, "Could not commit upload");
                Some(format!("Could not commit `{name}` to the repository"))
            }
        }
    }

    fn layout_rejection(&self, name: &str) -> String {
        let folders: String = self
            .config
            .allowed_prefixes
            .iter()
            .map(|p| format!("{}/...\n", p.trim_matches('/')))
            .collect();
        format!(
            "`{name}` contains an invalid file structure. It should contain top-level folders matching a mod directory:\n```\n{folders}```"
        )
    }
}
