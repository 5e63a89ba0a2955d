//! Tile access: serving encoded tiles from the current index.
//!
//! A request resolves to one of three outcomes. [`TileResult::NotIndexed`]
//! before any load succeeded, [`TileResult::Empty`] when the index holds
//! nothing for the key, or a [`TileResult::Tile`] with freshly encoded bytes.
//! The first two both mean "nothing to render" to a caller and are never
//! errors.

mod encoder;
mod loader;
mod registry;

pub use encoder::{
    BincodeTileEncoder, DecodedTile, EncodedView, TILE_FORMAT_VERSION, TileEncoder, decode_tile,
};
pub use loader::{TileLoader, VectorTileLoader, load_and_register, reload_or_load};
pub use registry::LoadedTiles;

use crate::error::Result;
use crate::index::{IndexSlot, IndexSnapshot};
use bytes::Bytes;
use geotiler_types::{MAX_ZOOM, TileFeature, TileKey, TilePayload};
use std::sync::Arc;

/// Name of the single layer every tile is exposed under.
pub const TILE_LAYER_NAME: &str = "_geojsonTileLayer";

/// Read-only vector-tile view over one payload.
#[derive(Debug, Clone)]
pub struct TileWrapper {
    payload: Arc<TilePayload>,
    extent: u32,
}

impl TileWrapper {
    pub fn new(payload: Arc<TilePayload>, extent: u32) -> Self {
        Self { payload, extent }
    }

    pub fn key(&self) -> TileKey {
        self.payload.key
    }

    pub fn layer_name(&self) -> &'static str {
        TILE_LAYER_NAME
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn features(&self) -> &[TileFeature] {
        &self.payload.features
    }

    pub fn feature(&self, i: usize) -> Option<&TileFeature> {
        self.payload.features.get(i)
    }
}

/// An encoded tile ready to hand to a caller.
#[derive(Debug, Clone)]
pub struct TileData {
    /// Encoded bytes. Never a view into a larger buffer.
    pub bytes: Bytes,
    /// Structured access to the same tile.
    pub wrapper: Arc<TileWrapper>,
}

/// Outcome of a tile lookup.
#[derive(Debug, Clone)]
pub enum TileResult {
    /// No index has been installed yet.
    NotIndexed,
    /// The index holds nothing for this key.
    Empty,
    Tile(TileData),
}

impl TileResult {
    pub fn into_data(self) -> Option<TileData> {
        match self {
            TileResult::Tile(data) => Some(data),
            TileResult::NotIndexed | TileResult::Empty => None,
        }
    }

    /// True for both "nothing to render" outcomes.
    pub fn is_no_data(&self) -> bool {
        !matches!(self, TileResult::Tile(_))
    }
}

/// Reads tiles from an [`IndexSlot`] and encodes them.
#[derive(Clone)]
pub struct TileAccess {
    slot: Arc<IndexSlot>,
    encoder: Arc<dyn TileEncoder>,
}

impl TileAccess {
    pub fn new(slot: Arc<IndexSlot>, encoder: Arc<dyn TileEncoder>) -> Self {
        Self { slot, encoder }
    }

    /// Pins the current index for a sequence of reads.
    pub fn snapshot(&self) -> Option<IndexSnapshot> {
        self.slot.snapshot()
    }

    /// Looks up `key` in the current index.
    pub fn get_tile(&self, key: TileKey) -> Result<TileResult> {
        match self.slot.snapshot() {
            Some(snapshot) => self.read(&snapshot, key),
            None => Ok(TileResult::NotIndexed),
        }
    }

    /// Looks up `key` in a pinned index.
    pub fn read(&self, snapshot: &IndexSnapshot, key: TileKey) -> Result<TileResult> {
        // Nothing is ever indexed past the deepest zoom.
        if key.z > MAX_ZOOM {
            return Ok(TileResult::Empty);
        }

        let Some(payload) = snapshot.index.tile(key) else {
            return Ok(TileResult::Empty);
        };

        let wrapper = Arc::new(TileWrapper::new(payload, snapshot.index.extent()));
        let view = self.encoder.encode(&wrapper)?;
        Ok(TileResult::Tile(TileData {
            bytes: view.into_transport(),
            wrapper,
        }))
    }
}

impl std::fmt::Debug for TileAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileAccess")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
