//! Worker builder for plugging in custom collaborators
//!
//! Every collaborator has a default; a builder with nothing set produces the
//! same worker as [`GeoJsonWorker::new`].

use crate::compute::{FormatCodec, GeoJsonCodec};
use crate::config::Config;
use crate::error::{Result, TilerError};
use crate::index::{IndexSlot, Indexer, QuadtreeIndexer};
use crate::pipeline::Pipeline;
use crate::tile::{BincodeTileEncoder, TileAccess, TileEncoder, TileLoader, VectorTileLoader};
use crate::worker::GeoJsonWorker;
use std::sync::Arc;

/// Builder for [`GeoJsonWorker`].
#[derive(Default)]
pub struct WorkerBuilder {
    config: Config,
    codec: Option<Arc<dyn FormatCodec>>,
    indexer: Option<Arc<dyn Indexer>>,
    encoder: Option<Arc<dyn TileEncoder>>,
    loader: Option<Box<dyn TileLoader>>,
}

impl WorkerBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use a different format codec.
    pub fn codec(mut self, codec: Arc<dyn FormatCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Use a different indexer.
    pub fn indexer(mut self, indexer: Arc<dyn Indexer>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Use a different tile encoder.
    pub fn encoder(mut self, encoder: Arc<dyn TileEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Use a different tile loader.
    pub fn loader(mut self, loader: Box<dyn TileLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the worker. Fails if the configuration does not validate.
    pub fn build(self) -> Result<GeoJsonWorker> {
        self.config.validate().map_err(TilerError::InvalidConfig)?;

        let pipeline = Pipeline::new(
            self.codec.unwrap_or_else(|| Arc::new(GeoJsonCodec)),
            self.indexer.unwrap_or_else(|| Arc::new(QuadtreeIndexer)),
            self.config.conversion,
            self.config.index,
        );
        let slot = Arc::new(IndexSlot::new());
        let tiles = TileAccess::new(
            Arc::clone(&slot),
            self.encoder.unwrap_or_else(|| Arc::new(BincodeTileEncoder)),
        );
        let loader = self
            .loader
            .unwrap_or_else(|| Box::new(VectorTileLoader::new()));

        Ok(GeoJsonWorker::from_parts(pipeline, tiles, slot, loader))
    }
}

impl std::fmt::Debug for WorkerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerBuilder")
            .field("config", &self.config)
            .field("custom_codec", &self.codec.is_some())
            .field("custom_indexer", &self.indexer.is_some())
            .field("custom_encoder", &self.encoder.is_some())
            .field("custom_loader", &self.loader.is_some())
            .finish()
    }
}
