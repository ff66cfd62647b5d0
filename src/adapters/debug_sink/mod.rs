//! Best-effort debug side channel
//!
//! Every event goes to the tracing log; optionally it is also appended
//! to a local file and posted to an HTTP collector. Both extras are
//! fire-and-forget: failures are swallowed and can never affect the
//! pipeline outcome.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::ports::{DebugEvent, DebugSinkPort};

/// Debug sink logging through tracing, with optional file append and
/// fire-and-forget HTTP post
pub struct TracingDebugSink {
    log_file: Option<PathBuf>,
    post_url: Option<String>,
    client: reqwest::Client,
}

impl TracingDebugSink {
    pub fn new() -> Self {
        Self {
            log_file: None,
            post_url: None,
            client: reqwest::Client::new(),
        }
    }

    /// Also append one line per event to a local file
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Also post each event to an HTTP collector
    pub fn with_post_url(mut self, url: impl Into<String>) -> Self {
        self.post_url = Some(url.into());
        self
    }
}

impl Default for TracingDebugSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DebugSinkPort for TracingDebugSink {
    async fn emit(&self, event: DebugEvent) {
        debug!(phase = event.phase, "{}", event.message);

        if let Some(path) = &self.log_file {
            let line = format!(
                "{} [{}] {}\n",
                event.at.to_rfc3339(),
                event.phase,
                event.message
            );
            let path = path.clone();
            // Append failures are ignored on purpose.
            let _ = tokio::task::spawn_blocking(move || {
                use std::io::Write;
                if let Ok(mut file) = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                {
                    let _ = file.write_all(line.as_bytes());
                }
            })
            .await;
        }

        if let Some(url) = &self.post_url {
            let payload = serde_json::json!({
                "phase": event.phase,
                "message": event.message,
                "at": event.at.to_rfc3339(),
            });
            let request = self.client.post(url).json(&payload);
            // Detached: the render never waits on, or learns about, the
            // collector.
            tokio::spawn(async move {
                let _ = request.send().await;
            });
        }
    }
}
