//! Request and response types exchanged with the worker.
//!
//! Requests are serde-serializable so a host can ship them across a thread or
//! process boundary as JSON; [`WorkerRequest`] is the tagged envelope the
//! [`Dispatcher`](crate::dispatcher::Dispatcher) routes on.

use crate::config::IndexOptions;
use crate::tile::TileData;
use geotiler_types::TileKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Parameters of a load request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDataParams {
    /// Id of the source being (re)loaded
    pub source: String,

    /// Raw GeoJSON payload
    #[serde(default)]
    pub data: Option<Value>,

    /// Per-request index options, replacing the configured defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_options: Option<IndexOptions>,

    /// Measure how long each pipeline step took
    #[serde(default)]
    pub collect_resource_timing: bool,
}

impl LoadDataParams {
    pub fn new(source: impl Into<String>, data: Value) -> Self {
        Self {
            source: source.into(),
            data: Some(data),
            index_options: None,
            collect_resource_timing: false,
        }
    }

    /// A request that carries no payload.
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            data: None,
            index_options: None,
            collect_resource_timing: false,
        }
    }

    pub fn with_index_options(mut self, options: IndexOptions) -> Self {
        self.index_options = Some(options);
        self
    }

    pub fn with_resource_timing(mut self, collect: bool) -> Self {
        self.collect_resource_timing = collect;
        self
    }
}

/// Parameters of a tile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileParams {
    /// Host-assigned id, stable for the lifetime of one tile on screen
    pub uid: u64,
    pub key: TileKey,
}

impl TileParams {
    pub fn new(uid: u64, key: TileKey) -> Self {
        Self { uid, key }
    }
}

/// Time spent in each pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceTiming {
    pub validate: Duration,
    pub convert: Duration,
    pub index: Duration,
}

impl ResourceTiming {
    pub fn total(&self) -> Duration {
        self.validate + self.convert + self.index
    }
}

/// Outcome of a load request.
///
/// A load either completes (optionally with timing) or is abandoned because a
/// newer request superseded it before it ran. Failures travel as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadDataResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_timing: Option<ResourceTiming>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub abandoned: bool,
}

impl LoadDataResult {
    pub fn loaded(resource_timing: Option<ResourceTiming>) -> Self {
        Self {
            resource_timing,
            abandoned: false,
        }
    }

    pub fn abandoned() -> Self {
        Self {
            resource_timing: None,
            abandoned: true,
        }
    }
}

/// Message envelope for the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerRequest {
    LoadData(LoadDataParams),
    Coalesce {
        source: String,
    },
    LoadTile {
        source: String,
        #[serde(flatten)]
        params: TileParams,
    },
    ReloadTile {
        source: String,
        #[serde(flatten)]
        params: TileParams,
    },
    RemoveTile {
        source: String,
        #[serde(flatten)]
        params: TileParams,
    },
    RemoveSource {
        source: String,
    },
}

impl WorkerRequest {
    /// Id of the source this request is addressed to.
    pub fn source(&self) -> &str {
        match self {
            WorkerRequest::LoadData(params) => &params.source,
            WorkerRequest::Coalesce { source }
            | WorkerRequest::LoadTile { source, .. }
            | WorkerRequest::ReloadTile { source, .. }
            | WorkerRequest::RemoveTile { source, .. }
            | WorkerRequest::RemoveSource { source } => source,
        }
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::TilerError::Serialization(e.to_string()))
    }
}

/// Immediate answer to a non-load request.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Ack,
    /// Tile bytes, or `None` when there is nothing to render.
    Tile(Option<TileData>),
}

impl WorkerResponse {
    /// Tile data carried by the response, if any.
    pub fn into_tile(self) -> Option<TileData> {
        match self {
            WorkerResponse::Tile(data) => data,
            WorkerResponse::Ack => None,
        }
    }
}
