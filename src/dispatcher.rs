//! Routing of protocol messages to per-source workers.
//!
//! The dispatcher owns one [`GeoJsonWorker`] per source id, creating it on
//! the first `load_data` for that source and dropping it on `remove_source`.

use crate::builder::WorkerBuilder;
use crate::coalescer::LoadReceiver;
use crate::config::Config;
use crate::error::{Result, TilerError};
use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::worker::GeoJsonWorker;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

type WorkerFactory = Box<dyn Fn() -> Result<GeoJsonWorker> + Send>;

/// Answer to a dispatched request.
#[derive(Debug)]
pub enum Reply {
    /// Answered on the spot.
    Ready(Result<WorkerResponse>),
    /// A load, answered once it runs or is abandoned.
    Load(LoadReceiver),
}

impl Reply {
    /// The immediate response, or `None` for a load.
    pub fn into_ready(self) -> Option<Result<WorkerResponse>> {
        match self {
            Reply::Ready(result) => Some(result),
            Reply::Load(_) => None,
        }
    }
}

/// Routes [`WorkerRequest`]s by source id.
pub struct Dispatcher {
    workers: FxHashMap<String, GeoJsonWorker>,
    factory: WorkerFactory,
}

impl Dispatcher {
    /// Creates a dispatcher whose workers use the default collaborators.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(TilerError::InvalidConfig)?;
        Ok(Self::with_factory(move || {
            WorkerBuilder::new().config(config.clone()).build()
        }))
    }

    /// Creates a dispatcher building its workers with `factory`.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<GeoJsonWorker> + Send + 'static,
    {
        Self {
            workers: FxHashMap::default(),
            factory: Box::new(factory),
        }
    }

    pub fn worker(&self, source: &str) -> Option<&GeoJsonWorker> {
        self.workers.get(source)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.workers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Handles one request.
    ///
    /// Tile requests for a source that was never loaded answer with no data.
    /// `coalesce` for such a source is an error, removals are no-ops.
    pub fn dispatch(&mut self, request: WorkerRequest) -> Reply {
        match request {
            WorkerRequest::LoadData(params) => {
                let worker = match self.workers.entry(params.source.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => match (self.factory)() {
                        Ok(worker) => {
                            log::debug!("Created worker for '{}'", entry.key());
                            entry.insert(worker)
                        }
                        Err(e) => return Reply::Ready(Err(e)),
                    },
                };
                Reply::Load(worker.load_data(params))
            }
            WorkerRequest::Coalesce { source } => Reply::Ready(match self.workers.get_mut(&source) {
                Some(worker) => {
                    worker.coalesce();
                    Ok(WorkerResponse::Ack)
                }
                None => Err(TilerError::UnknownSource(source)),
            }),
            WorkerRequest::LoadTile { source, params } => {
                Reply::Ready(match self.workers.get_mut(&source) {
                    Some(worker) => worker.load_tile(&params).map(WorkerResponse::Tile),
                    None => Ok(WorkerResponse::Tile(None)),
                })
            }
            WorkerRequest::ReloadTile { source, params } => {
                Reply::Ready(match self.workers.get_mut(&source) {
                    Some(worker) => worker.reload_tile(&params).map(WorkerResponse::Tile),
                    None => Ok(WorkerResponse::Tile(None)),
                })
            }
            WorkerRequest::RemoveTile { source, params } => {
                if let Some(worker) = self.workers.get_mut(&source) {
                    worker.remove_tile(&params);
                }
                Reply::Ready(Ok(WorkerResponse::Ack))
            }
            WorkerRequest::RemoveSource { source } => {
                if let Some(mut worker) = self.workers.remove(&source) {
                    worker.remove_source();
                    log::debug!("Removed worker for '{}'", source);
                }
                Reply::Ready(Ok(WorkerResponse::Ack))
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}
