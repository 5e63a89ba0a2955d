//! Tile pyramid backed by an R-tree of feature bounds.
//!
//! Tiles are sliced at build time by descending the quadtree from the root,
//! skipping every subtree no feature reaches. Descent stops at
//! `index_max_zoom`, or earlier at a tile holding no more than
//! `index_max_points` vertices. Any other tile, up to `max_zoom`, is sliced
//! on request from the features whose bounds intersect the buffered tile.

use super::slice::TileWindow;
use super::{BuildOptions, IndexHandle, Indexer, TileIndex};
use crate::compute::geometry::{bounding_rect, line_length, rewind, signed_area};
use crate::compute::simplify::mark_importance;
use crate::compute::{ConvertedCollection, ConvertedFeature, ConvertedGeometry};
use crate::config::IndexOptions;
use crate::error::IndexError;
use geotiler_types::{FeatureId, PropertyValue, TileKey, TilePayload};
use rstar::{AABB, RTree, RTreeObject};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Feature bounds stored in the R-tree.
#[derive(Debug, Clone, PartialEq)]
struct FeatureBounds {
    index: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl RTreeObject for FeatureBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Default [`Indexer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct QuadtreeIndexer;

impl Indexer for QuadtreeIndexer {
    fn build(
        &self,
        mut collection: ConvertedCollection,
        options: &BuildOptions,
    ) -> Result<IndexHandle, IndexError> {
        options
            .index
            .validate()
            .map_err(IndexError::InvalidOptions)?;

        if options.index.index_max_points == 0 && options.index.index_max_zoom > 8 {
            log::warn!(
                "Eagerly indexing every tile down to zoom {} may slice a very large number \
                of tiles for data with wide coverage",
                options.index.index_max_zoom
            );
        }

        if !options.preconverted {
            normalize(&mut collection);
        }
        assign_ids(&mut collection.features, &options.index);

        Ok(Arc::new(QuadtreeIndex::new(
            collection.features,
            options.index.clone(),
        )))
    }
}

/// Recomputes everything a codec is expected to have prepared.
fn normalize(collection: &mut ConvertedCollection) {
    let sq_tolerance = collection.params.sq_tolerance();

    for feature in &mut collection.features {
        match &mut feature.geometry {
            ConvertedGeometry::Points(_) => {}
            ConvertedGeometry::Lines(lines) => {
                for line in lines {
                    mark_importance(&mut line.points, sq_tolerance);
                    line.size = line_length(&line.points);
                }
            }
            ConvertedGeometry::Polygons(polygons) => {
                for rings in polygons {
                    for (i, ring) in rings.iter_mut().enumerate() {
                        mark_importance(&mut ring.points, sq_tolerance);
                        ring.size = signed_area(&ring.points).abs();
                        rewind(ring, i == 0);
                    }
                }
            }
        }
        if let Some(bbox) = bounding_rect(&feature.geometry) {
            feature.bbox = bbox;
        }
    }
}

fn assign_ids(features: &mut [ConvertedFeature], options: &IndexOptions) {
    for (i, feature) in features.iter_mut().enumerate() {
        if let Some(property) = &options.promote_id {
            feature.id = feature.properties.get(property).map(promoted_id);
        } else if options.generate_id {
            feature.id = Some(FeatureId::Number(i as u64));
        }
    }
}

/// Unsigned integers stay numeric; anything else is promoted as its text.
fn promoted_id(value: &PropertyValue) -> FeatureId {
    match value {
        PropertyValue::UInt(n) => FeatureId::Number(*n),
        PropertyValue::String(s) => FeatureId::String(s.clone()),
        PropertyValue::Int(n) => FeatureId::String(n.to_string()),
        PropertyValue::Double(n) => FeatureId::String(n.to_string()),
        PropertyValue::Bool(b) => FeatureId::String(b.to_string()),
    }
}

/// Index produced by [`QuadtreeIndexer`].
#[derive(Debug)]
pub struct QuadtreeIndex {
    options: IndexOptions,
    features: Vec<ConvertedFeature>,
    tree: RTree<FeatureBounds>,
    /// Every tile visited at build time; `None` where simplification left
    /// nothing.
    tiles: FxHashMap<TileKey, Option<Arc<TilePayload>>>,
}

impl QuadtreeIndex {
    pub fn new(features: Vec<ConvertedFeature>, options: IndexOptions) -> Self {
        let bounds = features
            .iter()
            .enumerate()
            .map(|(index, feature)| FeatureBounds {
                index,
                min: [feature.bbox.min().x, feature.bbox.min().y],
                max: [feature.bbox.max().x, feature.bbox.max().y],
            })
            .collect();

        let mut index = Self {
            options,
            features,
            tree: RTree::bulk_load(bounds),
            tiles: FxHashMap::default(),
        };
        index.tiles = index.precompute();

        log::debug!(
            "Indexed {} features, {} tiles precomputed down to zoom {}",
            index.features.len(),
            index.precomputed_tiles(),
            index.options.index_max_zoom
        );
        index
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Number of non-empty tiles sliced at build time.
    pub fn precomputed_tiles(&self) -> usize {
        self.tiles.values().filter(|tile| tile.is_some()).count()
    }

    fn precompute(&self) -> FxHashMap<TileKey, Option<Arc<TilePayload>>> {
        let mut tiles = FxHashMap::default();
        let mut stack = vec![TileKey::new(0, 0, 0)];

        while let Some(key) = stack.pop() {
            let window = TileWindow::new(key, &self.options);
            let candidates = self.candidates(&window);
            if candidates.is_empty() {
                continue;
            }
            let payload = self.cut(key, &window, &candidates).map(Arc::new);
            let vertices = payload.as_ref().map_or(0, |tile| tile.vertex_count());
            tiles.insert(key, payload);

            // Small tiles are cheap to slice on request. An emptied tile
            // stops descent too: its children are sliced on request.
            if key.z < self.options.index_max_zoom && vertices > self.options.index_max_points {
                stack.extend(key.children());
            }
        }
        tiles
    }

    /// Indices of the features reaching into `window`, in collection order.
    fn candidates(&self, window: &TileWindow) -> Vec<usize> {
        let (min, max) = window.unit_bounds();
        let envelope = AABB::from_corners(min, max);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|bounds| bounds.index)
            .collect();
        hits.sort_unstable();
        hits
    }

    fn cut(&self, key: TileKey, window: &TileWindow, candidates: &[usize]) -> Option<TilePayload> {
        let mut features = Vec::new();
        for &i in candidates {
            window.slice(&self.features[i], &mut features);
        }
        if features.is_empty() {
            None
        } else {
            Some(TilePayload::new(key, features))
        }
    }
}

impl TileIndex for QuadtreeIndex {
    fn tile(&self, key: TileKey) -> Option<Arc<TilePayload>> {
        let key = key.wrapped();
        if !key.is_valid() || key.z > self.options.max_zoom {
            return None;
        }
        if let Some(tile) = self.tiles.get(&key) {
            return tile.clone();
        }

        let window = TileWindow::new(key, &self.options);
        let candidates = self.candidates(&window);
        self.cut(key, &window, &candidates).map(Arc::new)
    }

    fn extent(&self) -> u32 {
        self.options.extent
    }

    fn feature_count(&self) -> usize {
        self.features.len()
    }
}
