//! Null implementations for optional ports

use async_trait::async_trait;

use crate::error::SongcutResult;
use crate::ports::CutIndexPort;

/// Stands in when no precomputed cut index exists; every asset reports
/// "no index", pushing the engine to on-the-fly detection.
pub struct NullCutIndex;

#[async_trait]
impl CutIndexPort for NullCutIndex {
    async fn cuts_in_range(
        &self,
        _video_id: &str,
        _start_seconds: f64,
        _end_seconds: f64,
    ) -> SongcutResult<Option<Vec<f64>>> {
        Ok(None)
    }

    async fn cut_free_window(
        &self,
        _video_id: &str,
        _start_seconds: f64,
        _end_seconds: f64,
        _length: f64,
    ) -> SongcutResult<Option<(f64, f64)>> {
        Ok(None)
    }
}
