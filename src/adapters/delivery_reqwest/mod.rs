//! Delivery/CDN adapter
//!
//! Resolves a delivery id plus a second range to a fetchable URL and
//! streams the byte range to a local file. The delivery network is
//! consumed only via plain byte fetches.

use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{SongcutError, SongcutResult};
use crate::ports::DeliveryPort;

/// reqwest-backed byte-range fetcher
pub struct ReqwestDeliveryAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestDeliveryAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn range_url(&self, delivery_id: &str, start: f64, end: f64) -> String {
        format!(
            "{}/media/{}?start={:.3}&end={:.3}",
            self.base_url.trim_end_matches('/'),
            delivery_id,
            start,
            end
        )
    }
}

#[async_trait]
impl DeliveryPort for ReqwestDeliveryAdapter {
    async fn fetch_range(
        &self,
        delivery_id: &str,
        start_seconds: f64,
        end_seconds: f64,
        dest: &Path,
    ) -> SongcutResult<()> {
        let url = self.range_url(delivery_id, start_seconds, end_seconds);
        debug!(%url, dest = %dest.display(), "fetching clip bytes");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SongcutError::Delivery {
                message: format!("{}: {}", delivery_id, e),
            })?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SongcutError::Delivery {
                message: format!("{}: transfer interrupted: {}", delivery_id, e),
            })?;
            written += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if written == 0 {
            return Err(SongcutError::Delivery {
                message: format!("{}: empty response body", delivery_id),
            });
        }
        debug!(bytes = written, "fetch complete");
        Ok(())
    }
}
