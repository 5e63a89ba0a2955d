//! Compute layer for input validation and geometry processing.
//!
//! This module holds the data-level work of the conversion step:
//! - Validation of raw load requests
//! - Conversion of GeoJSON into projected, importance-marked features
//! - Geometry helpers: simplification, measurement and clipping
//!
//! Nothing in here knows about tiles being served or requests being coalesced.

pub mod clip;
pub mod convert;
pub mod geometry;
pub mod simplify;
pub mod validation;

pub use convert::{
    ConvertedCollection, ConvertedFeature, ConvertedGeometry, FormatCodec, GeoJsonCodec,
    ProjectedPart, ProjectedPoint,
};
pub use validation::validate_raw_data;
