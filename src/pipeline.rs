//! Conversion and indexing pipeline.
//!
//! One run turns a load request into a fresh index:
//!
//! 1. validate the raw data
//! 2. convert it with the format codec
//! 3. build the index with the configured options
//!
//! The caller installs the result. A failed run leaves whatever index was
//! installed before untouched.

use crate::compute::{FormatCodec, validate_raw_data};
use crate::config::{ConversionParams, IndexOptions};
use crate::error::{Result, TilerError};
use crate::index::{BuildOptions, IndexHandle, Indexer};
use crate::protocol::{LoadDataParams, ResourceTiming};
use std::sync::Arc;
use std::time::Instant;

/// A successfully built index.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub index: IndexHandle,
    /// Present when the request asked for it.
    pub timing: Option<ResourceTiming>,
}

/// Runs the conversion steps with a fixed set of collaborators.
#[derive(Clone)]
pub struct Pipeline {
    codec: Arc<dyn FormatCodec>,
    indexer: Arc<dyn Indexer>,
    conversion: ConversionParams,
    default_index: IndexOptions,
}

impl Pipeline {
    pub fn new(
        codec: Arc<dyn FormatCodec>,
        indexer: Arc<dyn Indexer>,
        conversion: ConversionParams,
        default_index: IndexOptions,
    ) -> Self {
        Self {
            codec,
            indexer,
            conversion,
            default_index,
        }
    }

    pub fn conversion(&self) -> &ConversionParams {
        &self.conversion
    }

    pub fn default_index(&self) -> &IndexOptions {
        &self.default_index
    }

    pub fn run(&self, request: LoadDataParams) -> Result<PipelineOutput> {
        let LoadDataParams {
            source,
            data,
            index_options,
            collect_resource_timing,
        } = request;

        let started = Instant::now();
        let data = validate_raw_data(&source, data)?;
        let validated = Instant::now();

        let collection = self
            .codec
            .convert(data, &self.conversion)
            .map_err(|e| TilerError::Conversion {
                source_id: source.clone(),
                source: e,
            })?;
        let converted = Instant::now();
        let feature_count = collection.len();

        let options = BuildOptions::new(index_options.unwrap_or_else(|| self.default_index.clone()))
            .with_preconverted(true);
        let index = self
            .indexer
            .build(collection, &options)
            .map_err(|e| TilerError::IndexBuild {
                source_id: source.clone(),
                source: e,
            })?;
        let indexed = Instant::now();

        log::debug!(
            "Indexed {} features for '{}' in {:?}",
            feature_count,
            source,
            indexed - started
        );

        let timing = collect_resource_timing.then(|| ResourceTiming {
            validate: validated - started,
            convert: converted - validated,
            index: indexed - converted,
        });
        Ok(PipelineOutput { index, timing })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("conversion", &self.conversion)
            .field("default_index", &self.default_index)
            .finish_non_exhaustive()
    }
}
