//! Loading and reloading tiles on behalf of the host.

use super::{LoadedTiles, TileAccess, TileData};
use crate::error::Result;
use crate::protocol::TileParams;
use geotiler_types::TileKey;
use rustc_hash::FxHashMap;

/// Produces tile data for host tile requests.
pub trait TileLoader: Send {
    /// Loads a tile from scratch.
    fn load_tile(&mut self, tiles: &TileAccess, params: &TileParams) -> Result<Option<TileData>>;

    /// Refreshes a tile the host already holds.
    fn reload_tile(&mut self, tiles: &TileAccess, params: &TileParams)
    -> Result<Option<TileData>>;

    /// Forgets anything kept for `uid`.
    fn remove_tile(&mut self, _uid: u64) {}
}

#[derive(Debug, Clone)]
struct CachedTile {
    key: TileKey,
    generation: u64,
    data: Option<TileData>,
}

/// Default loader.
///
/// Remembers the last result per uid and answers a reload from it while the
/// index it came from is still installed.
#[derive(Debug, Default)]
pub struct VectorTileLoader {
    cache: FxHashMap<u64, CachedTile>,
}

impl VectorTileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl TileLoader for VectorTileLoader {
    fn load_tile(&mut self, tiles: &TileAccess, params: &TileParams) -> Result<Option<TileData>> {
        let Some(snapshot) = tiles.snapshot() else {
            self.cache.remove(&params.uid);
            return Ok(None);
        };

        let data = tiles.read(&snapshot, params.key)?.into_data();
        self.cache.insert(
            params.uid,
            CachedTile {
                key: params.key,
                generation: snapshot.generation,
                data: data.clone(),
            },
        );
        Ok(data)
    }

    fn reload_tile(
        &mut self,
        tiles: &TileAccess,
        params: &TileParams,
    ) -> Result<Option<TileData>> {
        if let (Some(cached), Some(snapshot)) = (self.cache.get(&params.uid), tiles.snapshot())
            && cached.key == params.key
            && cached.generation == snapshot.generation
        {
            return Ok(cached.data.clone());
        }
        self.load_tile(tiles, params)
    }

    fn remove_tile(&mut self, uid: u64) {
        self.cache.remove(&uid);
    }
}

/// Loads a tile and records its uid as loaded.
pub fn load_and_register(
    registry: &mut LoadedTiles,
    loader: &mut dyn TileLoader,
    tiles: &TileAccess,
    params: &TileParams,
) -> Result<Option<TileData>> {
    let data = loader.load_tile(tiles, params)?;
    registry.mark_loaded(params.uid);
    Ok(data)
}

/// Reloads a tile loaded since the last rebuild, loads it otherwise.
pub fn reload_or_load(
    registry: &mut LoadedTiles,
    loader: &mut dyn TileLoader,
    tiles: &TileAccess,
    params: &TileParams,
) -> Result<Option<TileData>> {
    if registry.is_loaded(params.uid) {
        loader.reload_tile(tiles, params)
    } else {
        load_and_register(registry, loader, tiles, params)
    }
}
