//! Worker facade for one GeoJSON source.
//!
//! The host talks to a [`GeoJsonWorker`] through six operations:
//!
//! - `load_data` submits new data and returns a receiver for the outcome
//! - `coalesce` tells the worker the last outcome was consumed
//! - `load_tile`, `reload_tile` and `remove_tile` serve and forget tiles
//! - `remove_source` tears the source down
//!
//! Loads go through a [`LoadCoalescer`]: bursts of updates collapse into at
//! most one rebuild per `coalesce`, and every superseded load resolves as
//! abandoned.
//!
//! # Example
//!
//! ```
//! use geotiler::{GeoJsonWorker, LoadDataParams, TileParams, TileKey};
//! use serde_json::json;
//!
//! let mut worker = GeoJsonWorker::new(Default::default()).unwrap();
//! let data = json!({"type": "Point", "coordinates": [0.0, 0.0]});
//!
//! let mut done = worker.load_data(LoadDataParams::new("poi", data));
//! let outcome = done.try_recv().unwrap().unwrap().unwrap();
//! assert!(!outcome.abandoned);
//! worker.coalesce();
//!
//! let tile = worker.load_tile(&TileParams::new(1, TileKey::new(0, 0, 0))).unwrap();
//! assert!(tile.is_some());
//! ```

use crate::builder::WorkerBuilder;
use crate::coalescer::{
    CoalescerState, CoalescerStats, LoadCoalescer, LoadReceiver, PendingLoad, Responder,
};
use crate::config::Config;
use crate::error::Result;
use crate::index::IndexSlot;
use crate::pipeline::Pipeline;
use crate::protocol::{LoadDataParams, LoadDataResult, TileParams};
use crate::tile::{
    LoadedTiles, TileAccess, TileData, TileLoader, TileResult, load_and_register, reload_or_load,
};
use geotiler_types::TileKey;
use std::sync::Arc;

/// Background worker serving tiles for one source.
pub struct GeoJsonWorker {
    coalescer: LoadCoalescer<LoadDataParams>,
    pipeline: Pipeline,
    slot: Arc<IndexSlot>,
    tiles: TileAccess,
    loaded_tiles: LoadedTiles,
    loader: Box<dyn TileLoader>,
}

impl GeoJsonWorker {
    /// Creates a worker with the default collaborators.
    pub fn new(config: Config) -> Result<Self> {
        WorkerBuilder::new().config(config).build()
    }

    pub(crate) fn from_parts(
        pipeline: Pipeline,
        tiles: TileAccess,
        slot: Arc<IndexSlot>,
        loader: Box<dyn TileLoader>,
    ) -> Self {
        Self {
            coalescer: LoadCoalescer::new(),
            pipeline,
            slot,
            tiles,
            loaded_tiles: LoadedTiles::new(),
            loader,
        }
    }

    /// Submits new data for this source.
    ///
    /// Runs the pipeline right away when no run is outstanding; otherwise the
    /// request waits for the next [`coalesce`](Self::coalesce), replacing
    /// (and abandoning) any request already waiting.
    pub fn load_data(&mut self, params: LoadDataParams) -> LoadReceiver {
        let (responder, receiver) = Responder::channel();
        if let Some(pending) = self.coalescer.submit(params, responder) {
            self.run(pending);
        }
        receiver
    }

    /// Signals that the last load outcome was consumed.
    pub fn coalesce(&mut self) {
        if let Some(pending) = self.coalescer.settle() {
            self.run(pending);
        }
    }

    fn run(&mut self, pending: PendingLoad<LoadDataParams>) {
        let (request, responder) = pending.into_parts();
        let source = request.source.clone();

        let outcome = self.pipeline.run(request).map(|output| {
            let generation = self.slot.install(output.index);
            self.loaded_tiles.clear();
            log::debug!("Installed index generation {} for '{}'", generation, source);
            LoadDataResult::loaded(output.timing)
        });

        if let Err(e) = &outcome {
            log::warn!("Load for '{}' failed: {}", source, e);
        }
        if !responder.respond(outcome) {
            log::debug!("Load outcome for '{}' had no receiver", source);
        }
    }

    /// Loads a tile from scratch and records it as loaded.
    pub fn load_tile(&mut self, params: &TileParams) -> Result<Option<TileData>> {
        load_and_register(
            &mut self.loaded_tiles,
            self.loader.as_mut(),
            &self.tiles,
            params,
        )
    }

    /// Reloads a tile loaded since the last rebuild, loads it otherwise.
    pub fn reload_tile(&mut self, params: &TileParams) -> Result<Option<TileData>> {
        reload_or_load(
            &mut self.loaded_tiles,
            self.loader.as_mut(),
            &self.tiles,
            params,
        )
    }

    /// Forgets a tile.
    pub fn remove_tile(&mut self, params: &TileParams) {
        self.loaded_tiles.remove(params.uid);
        self.loader.remove_tile(params.uid);
    }

    /// Tears the source down.
    ///
    /// A queued load resolves as abandoned and the index is dropped, so tile
    /// requests answer "no data" until the next successful load.
    pub fn remove_source(&mut self) {
        self.coalescer.shutdown();
        if self.slot.clear() {
            log::debug!("Dropped index generation {}", self.slot.generation());
        }
        self.loaded_tiles.clear();
    }

    /// Looks up a tile without touching the loaded-tile registry.
    pub fn get_tile(&self, key: TileKey) -> Result<TileResult> {
        self.tiles.get_tile(key)
    }

    /// True once a load succeeded and the source was not removed since.
    pub fn is_loaded(&self) -> bool {
        self.slot.is_installed()
    }

    pub fn is_tile_loaded(&self, uid: u64) -> bool {
        self.loaded_tiles.is_loaded(uid)
    }

    pub fn state(&self) -> CoalescerState {
        self.coalescer.state()
    }

    pub fn stats(&self) -> CoalescerStats {
        self.coalescer.stats()
    }

    /// Generation of the installed index, `0` before the first load.
    pub fn generation(&self) -> u64 {
        self.slot.generation()
    }

    /// Shared read access to the tiles of this source.
    pub fn tiles(&self) -> TileAccess {
        self.tiles.clone()
    }
}

impl std::fmt::Debug for GeoJsonWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoJsonWorker")
            .field("state", &self.coalescer.state())
            .field("generation", &self.slot.generation())
            .field("loaded_tiles", &self.loaded_tiles.len())
            .finish_non_exhaustive()
    }
}
