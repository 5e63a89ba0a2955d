//! Tile encoding.
//!
//! Encoders may hand back a view into a larger buffer they own.
//! [`EncodedView::into_transport`] turns such a view into bytes that stand on
//! their own before they leave the worker.

use super::TileWrapper;
use crate::error::{Result, TilerError};
use bytes::{BufMut, Bytes, BytesMut};
use geotiler_types::{TileFeature, TileKey};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Version written into every encoded tile.
pub const TILE_FORMAT_VERSION: u32 = 1;

/// Encoded bytes, possibly a window into a larger backing buffer.
#[derive(Debug, Clone)]
pub struct EncodedView {
    backing: Bytes,
    range: Range<usize>,
}

impl EncodedView {
    /// A view covering all of `bytes`.
    pub fn full(bytes: impl Into<Bytes>) -> Self {
        let backing = bytes.into();
        let range = 0..backing.len();
        Self { backing, range }
    }

    /// A view over `range` of `backing`.
    pub fn new(backing: Bytes, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > backing.len() {
            return Err(TilerError::Encode(format!(
                "view {:?} out of bounds for a buffer of {} bytes",
                range,
                backing.len()
            )));
        }
        Ok(Self { backing, range })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.backing[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// True when the view spans its whole backing buffer.
    pub fn covers_backing(&self) -> bool {
        self.range.start == 0 && self.range.end == self.backing.len()
    }

    /// Bytes safe to hand to another owner.
    ///
    /// A partial view is copied into a buffer of exactly its length; a full
    /// view is passed through.
    pub fn into_transport(self) -> Bytes {
        if self.covers_backing() {
            self.backing
        } else {
            Bytes::copy_from_slice(&self.backing[self.range])
        }
    }
}

/// Encodes a tile into its binary form.
pub trait TileEncoder: Send + Sync {
    fn encode(&self, tile: &TileWrapper) -> Result<EncodedView>;
}

#[derive(Serialize)]
struct EncodedTile<'a> {
    version: u32,
    layer: &'a str,
    extent: u32,
    key: TileKey,
    features: &'a [TileFeature],
}

/// A tile read back from its binary form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecodedTile {
    pub version: u32,
    pub layer: String,
    pub extent: u32,
    pub key: TileKey,
    pub features: Vec<TileFeature>,
}

/// Default encoder: bincode behind a little-endian `u32` length prefix.
///
/// The returned view skips the prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeTileEncoder;

impl TileEncoder for BincodeTileEncoder {
    fn encode(&self, tile: &TileWrapper) -> Result<EncodedView> {
        let body = bincode::serialize(&EncodedTile {
            version: TILE_FORMAT_VERSION,
            layer: tile.layer_name(),
            extent: tile.extent(),
            key: tile.key(),
            features: tile.features(),
        })
        .map_err(|e| TilerError::Encode(e.to_string()))?;

        let len = u32::try_from(body.len())
            .map_err(|_| TilerError::Encode(format!("tile {} is too large", tile.key())))?;

        let mut framed = BytesMut::with_capacity(4 + body.len());
        framed.put_u32_le(len);
        framed.extend_from_slice(&body);
        EncodedView::new(framed.freeze(), 4..4 + body.len())
    }
}

/// Decodes bytes produced by [`BincodeTileEncoder`].
pub fn decode_tile(bytes: &[u8]) -> Result<DecodedTile> {
    let tile: DecodedTile =
        bincode::deserialize(bytes).map_err(|e| TilerError::Serialization(e.to_string()))?;
    if tile.version != TILE_FORMAT_VERSION {
        return Err(TilerError::Serialization(format!(
            "unsupported tile format version {}",
            tile.version
        )));
    }
    Ok(tile)
}
