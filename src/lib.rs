//! Background worker that turns GeoJSON into vector tiles.
//!
//! Loads are coalesced so a burst of updates triggers at most one rebuild per
//! settle signal. Tiles are cut from an immutable index that is swapped in
//! atomically, and handed out as self-contained encoded bytes.
//!
//! ```rust
//! use geotiler::{GeoJsonWorker, LoadDataParams, TileKey, TileParams};
//! use serde_json::json;
//!
//! let mut worker = GeoJsonWorker::new(Default::default())?;
//! let data = json!({
//!     "type": "FeatureCollection",
//!     "features": [{
//!         "type": "Feature",
//!         "properties": {"name": "NYC"},
//!         "geometry": {"type": "Point", "coordinates": [-74.0060, 40.7128]}
//!     }]
//! });
//!
//! let _done = worker.load_data(LoadDataParams::new("cities", data));
//! worker.coalesce();
//!
//! let tile = worker.load_tile(&TileParams::new(1, TileKey::new(0, 0, 0)))?;
//! assert_eq!(tile.map(|t| t.wrapper.len()), Some(1));
//! # Ok::<(), geotiler::TilerError>(())
//! ```

pub mod builder;
pub mod coalescer;
pub mod compute;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod protocol;
pub mod tile;
pub mod worker;

pub use builder::WorkerBuilder;
pub use coalescer::{CoalescerState, CoalescerStats, LoadCoalescer, LoadReceiver, Responder};
pub use config::{Config, ConversionParams, IndexOptions};
pub use dispatcher::{Dispatcher, Reply};
pub use error::{ConversionError, IndexError, Result, TilerError};
pub use worker::GeoJsonWorker;

pub use compute::{FormatCodec, GeoJsonCodec};

pub use index::{
    BuildOptions, IndexHandle, IndexSlot, IndexSnapshot, Indexer, QuadtreeIndexer, TileIndex,
};

pub use protocol::{
    LoadDataParams, LoadDataResult, ResourceTiming, TileParams, WorkerRequest, WorkerResponse,
};

pub use tile::{
    BincodeTileEncoder, TILE_LAYER_NAME, TileAccess, TileData, TileEncoder, TileLoader,
    TileResult, TileWrapper, VectorTileLoader,
};

pub use geotiler_types::{
    FeatureId, FeatureKind, MAX_ZOOM, Properties, PropertyValue, TileFeature, TileGeometry,
    TileKey, TilePayload,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoJsonWorker, Result, TilerError, WorkerBuilder};

    pub use crate::{Config, IndexOptions};

    pub use crate::{LoadDataParams, LoadDataResult, TileParams};

    pub use crate::{Dispatcher, Reply, WorkerRequest, WorkerResponse};

    pub use crate::{TileData, TileKey, TileResult};
}
