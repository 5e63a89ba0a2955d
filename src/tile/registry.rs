//! Uids of tiles loaded against the current index.

use rustc_hash::FxHashSet;

/// Tracks which tile uids have been loaded since the last rebuild.
///
/// The set is cleared whenever a new index is installed, so membership means
/// "loaded from the index that is current now".
#[derive(Debug, Default)]
pub struct LoadedTiles {
    uids: FxHashSet<u64>,
}

impl LoadedTiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_loaded(&mut self, uid: u64) {
        self.uids.insert(uid);
    }

    pub fn is_loaded(&self, uid: u64) -> bool {
        self.uids.contains(&uid)
    }

    /// Returns `false` if `uid` was not loaded.
    pub fn remove(&mut self, uid: u64) -> bool {
        self.uids.remove(&uid)
    }

    pub fn clear(&mut self) {
        self.uids.clear();
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}
