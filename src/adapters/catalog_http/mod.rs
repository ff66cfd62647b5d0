//! Media catalog adapter
//!
//! Looks up `{assetId, catalogId}` over HTTP and derives the delivery
//! identifier from the cataloged filename. Lookup failures are surfaced
//! as errors; the acquisition engine decides to fall back to the raw id.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{SongcutError, SongcutResult};
use crate::ports::{CatalogEntry, CatalogPort};

/// HTTP catalog client
pub struct HttpCatalogAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    filename: String,
    title: Option<String>,
    duration: Option<f64>,
}

#[async_trait]
impl CatalogPort for HttpCatalogAdapter {
    async fn lookup(&self, video_id: &str, catalog_id: &str) -> SongcutResult<CatalogEntry> {
        let url = format!(
            "{}/catalogs/{}/assets/{}",
            self.base_url.trim_end_matches('/'),
            catalog_id,
            video_id
        );
        let response: CatalogResponse = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SongcutError::Catalog {
                message: format!("{}/{}: {}", catalog_id, video_id, e),
            })?
            .json()
            .await
            .map_err(|e| SongcutError::Catalog {
                message: format!("{}/{}: bad payload: {}", catalog_id, video_id, e),
            })?;

        let delivery_id = delivery_id_from_filename(&response.filename);
        debug!(video_id, catalog_id, delivery_id, "catalog lookup complete");
        Ok(CatalogEntry {
            delivery_id,
            title: response.title,
            duration: response.duration,
        })
    }
}

/// The delivery identifier is the filename minus its extension chain
fn delivery_id_from_filename(filename: &str) -> String {
    filename
        .split('/')
        .next_back()
        .unwrap_or(filename)
        .split('.')
        .next()
        .unwrap_or(filename)
        .to_string()
}
