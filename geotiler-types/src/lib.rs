//! # geotiler-types
//!
//! Plain data types shared between the geotiler worker and whatever sits on
//! the other side of its message boundary:
//!
//! - **Keys**: `TileKey` addresses a tile in the zoom/x/y quadtree
//! - **Features**: `TileFeature`, `TileGeometry` and `PropertyValue` describe
//!   the contents of one tile in integer tile coordinates
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use geotiler_types::key::TileKey;
//!
//! let key = TileKey::new(3, 5, 2);
//! assert_eq!(key.parent(), Some(TileKey::new(2, 2, 1)));
//! assert_eq!(key.to_string(), "3/5/2");
//! ```

pub mod feature;
pub mod key;

pub use feature::{
    FeatureId, FeatureKind, Properties, PropertyValue, TileFeature, TileGeometry, TilePayload,
    TilePoint,
};
pub use key::{MAX_ZOOM, TileKey};
