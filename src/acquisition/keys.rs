//! Used-clip-key bookkeeping
//!
//! One key set threads across the entire acquisition phase so a
//! replacement chosen for one segment can never be re-picked for another
//! anywhere in the same render.

use std::collections::HashSet;
use std::sync::Mutex;

/// Identity of a used source window: asset id plus the window's start
/// truncated to whole seconds. Two non-overlapping windows starting
/// within the same integer second therefore collide; kept for
/// compatibility with the upstream key format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipKey {
    pub video_id: String,
    pub second: i64,
}

impl ClipKey {
    pub fn for_window(video_id: &str, start_seconds: f64) -> Self {
        Self {
            video_id: video_id.to_string(),
            second: start_seconds.floor() as i64,
        }
    }
}

/// The render-wide set of used keys. Batches are awaited in order, so the
/// mutex only arbitrates tasks inside one batch.
#[derive(Debug, Default)]
pub struct UsedKeys {
    inner: Mutex<HashSet<ClipKey>>,
}

impl UsedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key unconditionally
    pub fn record(&self, key: ClipKey) {
        self.inner.lock().expect("used-key set poisoned").insert(key);
    }

    /// Atomically claim a key; false if it was already used
    pub fn try_reserve(&self, key: ClipKey) -> bool {
        self.inner.lock().expect("used-key set poisoned").insert(key)
    }

    pub fn contains(&self, key: &ClipKey) -> bool {
        self.inner
            .lock()
            .expect("used-key set poisoned")
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("used-key set poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_truncates_to_integer_second() {
        assert_eq!(ClipKey::for_window("a", 3.2), ClipKey::for_window("a", 3.9));
        assert_ne!(ClipKey::for_window("a", 3.2), ClipKey::for_window("a", 4.0));
        assert_ne!(ClipKey::for_window("a", 3.2), ClipKey::for_window("b", 3.2));
    }

    #[test]
    fn reserve_claims_exactly_once() {
        let used = UsedKeys::new();
        assert!(used.try_reserve(ClipKey::for_window("a", 1.0)));
        assert!(!used.try_reserve(ClipKey::for_window("a", 1.5)));
        assert!(used.try_reserve(ClipKey::for_window("a", 2.0)));
        assert_eq!(used.len(), 2);
    }
}
