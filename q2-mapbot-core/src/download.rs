use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use crate::contract::{DownloadError, Downloader};

/// Fetches attachments over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        info!(url = %url, "Fetching attachment");
        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Failed to fetch attachment");
            e
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %url, "Attachment download returned error");
            return Err(format!("GET {url} returned {status}").into());
        }

        let body = response.bytes().await?;
        info!(url = %url, bytes = body.len(), "Downloaded attachment");
        Ok(body.to_vec())
    }
}
