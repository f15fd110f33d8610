use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::stage::DEFAULT_CONTENT_PREFIXES;

fn default_timeout_ms() -> u64 {
    2000
}

/// Settings for the status protocol client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StatusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn trace_loaded(&self) {
        info!(timeout_ms = self.timeout_ms, "Loaded status config");
    }
}

fn default_prefixes() -> Vec<String> {
    DEFAULT_CONTENT_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

/// Settings for the ingestion pipeline: where uploads are staged and published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Working tree of the git repository that receives content.
    pub repo_path: PathBuf,
    /// Scratch directory for downloaded attachments.
    #[serde(default = "std::env::temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    /// Top-level directories an archive entry must live under.
    #[serde(default = "default_prefixes")]
    pub allowed_prefixes: Vec<String>,
}

impl PipelineConfig {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            temp_dir: std::env::temp_dir(),
            remote: None,
            branch: None,
            allowed_prefixes: default_prefixes(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            repo_path = %self.repo_path.display(),
            temp_dir = %self.temp_dir.display(),
            remote = ?self.remote,
            prefixes = self.allowed_prefixes.len(),
            "Loaded pipeline config"
        );
        debug!(?self, "Pipeline config loaded (full debug)");
    }
}
