/// `load_config` module: loads the YAML bot config and adapts it into the core crate's
/// `StatusConfig` / `PipelineConfig`.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into typed sections
/// - Parse channel rule strings (`"all,-123,+456"`) into [`ChannelRules`]
/// - Apply environment overrides (`MAPBOT_REPO_PATH`) after `.env` has been loaded
///
/// # Errors
/// All errors use `anyhow::Error` with the config path in the message and are surfaced at
/// the CLI boundary.
use anyhow::Result;
use q2_mapbot_core::config::{PipelineConfig, StatusConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::channels::ChannelRules;

/// Environment variable that replaces `ingest.repo_path`.
pub const REPO_PATH_ENV: &str = "MAPBOT_REPO_PATH";

#[derive(Debug, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub status: StatusSection,
    /// Without this section attachments are never ingested.
    #[serde(default)]
    pub ingest: Option<IngestSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusSection {
    #[serde(flatten)]
    pub client: StatusConfig,
    /// Channels where `!q2 <address>` is answered.
    #[serde(default)]
    pub channels: ChannelRules,
}

#[derive(Debug, Deserialize)]
pub struct IngestSection {
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
    /// Channels whose attachments are ingested.
    #[serde(default)]
    pub channels: ChannelRules,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BotConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: BotConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let (Some(ingest), Ok(repo_path)) = (config.ingest.as_mut(), std::env::var(REPO_PATH_ENV)) {
        info!(repo_path = %repo_path, "Repository path overridden from environment");
        ingest.pipeline.repo_path = PathBuf::from(repo_path);
    }

    config.status.client.trace_loaded();
    if let Some(ingest) = &config.ingest {
        ingest.pipeline.trace_loaded();
    } else {
        info!("No ingest section, attachments will be ignored");
    }
    Ok(config)
}
