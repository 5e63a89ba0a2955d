//! Spatial index over converted features.
//!
//! An index is immutable once built: a rebuild produces a new index which is
//! swapped into the [`IndexSlot`] in one step. Readers take an
//! [`IndexSnapshot`] and keep reading from it even if a newer index is
//! installed meanwhile.

mod quadtree;
pub(crate) mod slice;

pub use quadtree::{QuadtreeIndex, QuadtreeIndexer};

use crate::compute::ConvertedCollection;
use crate::config::IndexOptions;
use crate::error::IndexError;
use geotiler_types::{TileKey, TilePayload};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Immutable mapping from tile keys to tile payloads.
pub trait TileIndex: Send + Sync + fmt::Debug {
    /// Payload for `key`, or `None` when the key holds nothing.
    fn tile(&self, key: TileKey) -> Option<Arc<TilePayload>>;

    /// Fixed-point resolution of the payloads this index produces.
    fn extent(&self) -> u32;

    /// Number of features the index was built from.
    fn feature_count(&self) -> usize;
}

/// Shared handle to a built index.
pub type IndexHandle = Arc<dyn TileIndex>;

/// Options handed to an [`Indexer`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildOptions {
    pub index: IndexOptions,
    /// The collection already went through a codec's normalization.
    pub preconverted: bool,
}

impl BuildOptions {
    pub fn new(index: IndexOptions) -> Self {
        Self {
            index,
            preconverted: false,
        }
    }

    pub fn with_preconverted(mut self, preconverted: bool) -> Self {
        self.preconverted = preconverted;
        self
    }
}

/// Builds a tile index from converted features.
pub trait Indexer: Send + Sync {
    fn build(
        &self,
        collection: ConvertedCollection,
        options: &BuildOptions,
    ) -> Result<IndexHandle, IndexError>;
}

/// An installed index together with the generation it was installed as.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    pub generation: u64,
    pub index: IndexHandle,
}

#[derive(Debug, Default)]
struct SlotState {
    generation: u64,
    index: Option<IndexHandle>,
}

/// Holds the current index of one source.
///
/// Generations increase with every install and are never reused, including
/// across a [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct IndexSlot {
    state: RwLock<SlotState>,
}

impl IndexSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current index. Returns the new generation.
    pub fn install(&self, index: IndexHandle) -> u64 {
        let mut state = self.state.write();
        state.generation += 1;
        state.index = Some(index);
        state.generation
    }

    /// Drops the current index. Returns `false` if none was installed.
    pub fn clear(&self) -> bool {
        self.state.write().index.take().is_some()
    }

    pub fn snapshot(&self) -> Option<IndexSnapshot> {
        let state = self.state.read();
        state.index.as_ref().map(|index| IndexSnapshot {
            generation: state.generation,
            index: Arc::clone(index),
        })
    }

    pub fn is_installed(&self) -> bool {
        self.state.read().index.is_some()
    }

    /// Generation of the most recent install, `0` before the first one.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }
}
