//! Staging: writing accepted upload content into the repository working tree.
//!
//! Archives (zip family and PAK) are filtered entry by entry against the content taxonomy,
//! the fixed set of top-level game directories. Standalone maps are validated and copied
//! into `maps/`.

use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::contract::{MapSummary, MapValidator};
use crate::error::{ArchiveOpenError, FormatValidationError, MapStageError};
use crate::pak;

/// Top-level directories a content archive may populate.
pub const DEFAULT_CONTENT_PREFIXES: &[&str] = &[
    "maps/", "models/", "textures/", "env/", "sounds/", "pics/", "players/",
];

/// Outcome of staging one upload.
///
/// `destination_paths` are relative to the working tree root and always
/// `files_accepted` long.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagingResult {
    pub files_accepted: usize,
    pub files_rejected: usize,
    pub destination_paths: Vec<PathBuf>,
    pub map_summary: Option<MapSummary>,
}

impl StagingResult {
    fn accept(&mut self, relative: PathBuf) {
        self.files_accepted += 1;
        self.destination_paths.push(relative);
    }

    fn reject(&mut self) {
        self.files_rejected += 1;
    }

    /// True when an archive had no entry inside the content taxonomy. The uploader has
    /// to be told what layout is expected; this is not a silent no-op.
    pub fn structure_rejected(&self) -> bool {
        self.files_accepted == 0
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveStager {
    /// Allowed first path components, without the trailing slash.
    prefixes: Vec<String>,
}

impl Default for ArchiveStager {
    fn default() -> Self {
        Self::new(DEFAULT_CONTENT_PREFIXES.iter().copied())
    }
}

impl ArchiveStager {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.as_ref().trim_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { prefixes }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.allowed_prefixes)
    }

    /// Where an archive entry would land, relative to the working tree, or `None` if the
    /// entry is outside the taxonomy. Only plain relative components are allowed, so
    /// `..`, absolute paths and drive prefixes never match.
    pub fn destination_for(&self, entry_name: &str) -> Option<PathBuf> {
        let normalized = entry_name.replace('\\', "/");
        let path = Path::new(&normalized);
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part),
                _ => return None,
            }
        }
        let first = parts.first()?.to_str()?;
        if parts.len() < 2 || !self.prefixes.iter().any(|p| p == first) {
            return None;
        }
        Some(parts.iter().collect())
    }

    /// Extracts every entry inside the taxonomy from the archive at `archive_path` into
    /// `working_tree_root`. Entries that fail to write are logged and counted as rejected.
    pub fn stage(
        &self,
        archive_path: &Path,
        working_tree_root: &Path,
    ) -> Result<StagingResult, ArchiveOpenError> {
        let data = fs::read(archive_path).map_err(|source| ArchiveOpenError::Io {
            path: archive_path.to_path_buf(),
            source,
        })?;

        let result = if data.starts_with(b"PACK") {
            self.stage_pak(&data, working_tree_root)?
        } else if data.starts_with(b"PK") {
            self.stage_zip(&data, working_tree_root)?
        } else {
            return Err(ArchiveOpenError::UnknownContainer {
                path: archive_path.to_path_buf(),
            });
        };

        info!(
            archive = %archive_path.display(),
            accepted = result.files_accepted,
            rejected = result.files_rejected,
            "Staged archive"
        );
        Ok(result)
    }

    fn stage_zip(&self, data: &[u8], root: &Path) -> Result<StagingResult, ArchiveOpenError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
        let mut result = StagingResult::default();
        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(index, error = %e, "Unreadable zip entry, skipping");
                    result.reject();
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            self.stage_entry(&name, &mut entry, root, &mut result);
        }
        Ok(result)
    }

    fn stage_pak(&self, data: &[u8], root: &Path) -> Result<StagingResult, ArchiveOpenError> {
        let mut result = StagingResult::default();
        for entry in pak::entries(data)? {
            let mut reader = entry.data;
            self.stage_entry(&entry.name, &mut reader, root, &mut result);
        }
        Ok(result)
    }

    fn stage_entry(
        &self,
        name: &str,
        reader: &mut impl Read,
        root: &Path,
        result: &mut StagingResult,
    ) {
        let Some(relative) = self.destination_for(name) else {
            debug!(entry = name, "Entry outside content taxonomy, skipping");
            result.reject();
            return;
        };
        match write_entry(root, &relative, reader) {
            Ok(()) => result.accept(relative),
            Err(e) => {
                error!(
                    entry = name,
                    path = %root.join(&relative).display(),
                    error = %e,
                    "Failed to write archive entry"
                );
                result.reject();
            }
        }
    }
}

/// Copies `reader` into `root/relative`. The bytes go to a temporary file next to the
/// destination first, so a read that fails halfway leaves any existing file untouched.
fn write_entry(root: &Path, relative: &Path, reader: &mut impl Read) -> io::Result<()> {
    let full_path = root.join(relative);
    let parent = full_path.parent().unwrap_or(root);
    fs::create_dir_all(parent)?;
    let mut staged = NamedTempFile::new_in(parent)?;
    io::copy(reader, &mut staged)?;
    staged.as_file().sync_all()?;
    staged.persist(&full_path).map_err(|e| e.error)?;
    Ok(())
}

/// Stages a standalone `.bsp` into `maps/` after structural validation.
#[derive(Clone)]
pub struct SingleFileStager {
    validator: Arc<dyn MapValidator>,
}

impl SingleFileStager {
    pub fn new(validator: Arc<dyn MapValidator>) -> Self {
        Self { validator }
    }

    pub fn stage(
        &self,
        source_path: &Path,
        destination_name: &str,
        working_tree_root: &Path,
    ) -> Result<StagingResult, MapStageError> {
        if !is_plain_file_name(destination_name) {
            return Err(FormatValidationError::InvalidName(destination_name.to_string()).into());
        }
        let summary = self.validator.validate(source_path)?;

        let relative = Path::new("maps").join(destination_name);
        let full_path = working_tree_root.join(&relative);
        File::open(source_path)
            .and_then(|mut source| write_entry(working_tree_root, &relative, &mut source))
            .map_err(|source| MapStageError::Write {
                path: full_path.clone(),
                source,
            })?;
        info!(
            source = %source_path.display(),
            path = %full_path.display(),
            entities = summary.entity_count,
            textures = summary.texture_count,
            "Staged map file"
        );

        Ok(StagingResult {
            files_accepted: 1,
            files_rejected: 0,
            destination_paths: vec![relative],
            map_summary: Some(summary),
        })
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
