//! Asset downloads over HTTP

use super::{AssetFetcher, ScraperError};
use crate::LibraryError;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Streams images to disk, writing to a `.partial` file first
pub struct HttpAssetFetcher {
    client: reqwest::Client,
}

impl HttpAssetFetcher {
    pub fn new() -> Result<Self, LibraryError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .user_agent(format!("romshelf/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ScraperError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tracing::debug!("Downloading {} to {}", url, dest.display());

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ScraperError::Network(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let partial = dest.with_extension("partial");
        if let Err(e) = write_body(response, &partial).await {
            tracing::warn!("Download of {} failed: {}", url, e);
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        tokio::fs::rename(&partial, dest).await?;
        Ok(())
    }
}

async fn write_body(response: reqwest::Response, partial: &Path) -> Result<(), ScraperError> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}
