//! Cutting converted features into the features of one tile.

use crate::compute::clip::{clip_points, clip_polyline, clip_ring};
use crate::compute::geometry::path_length;
use crate::compute::{ConvertedFeature, ConvertedGeometry, ProjectedPart, ProjectedPoint};
use crate::config::IndexOptions;
use geotiler_types::{TileFeature, TileGeometry, TileKey, TilePoint};

/// Geometry of one tile: where it sits in unit space and how much detail it
/// keeps.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TileWindow {
    key: TileKey,
    scale: f64,
    extent: f64,
    buffer: f64,
    tolerance: f64,
    sq_tolerance: f64,
    line_metrics: bool,
}

impl TileWindow {
    /// `key` must be valid and no deeper than `options.max_zoom`.
    pub fn new(key: TileKey, options: &IndexOptions) -> Self {
        let scale = (1u64 << key.z) as f64;
        let extent = options.extent as f64;
        // The deepest zoom keeps every vertex.
        let tolerance = if key.z >= options.max_zoom {
            0.0
        } else {
            options.tolerance / (scale * extent)
        };
        Self {
            key,
            scale,
            extent,
            buffer: options.buffer as f64,
            tolerance,
            sq_tolerance: tolerance * tolerance,
            line_metrics: options.line_metrics,
        }
    }

    /// Buffered tile bounds in unit space, as `(min, max)` corners.
    pub fn unit_bounds(&self) -> ([f64; 2], [f64; 2]) {
        let pad = self.buffer / self.extent;
        let (x, y) = (self.key.x as f64, self.key.y as f64);
        (
            [(x - pad) / self.scale, (y - pad) / self.scale],
            [(x + 1.0 + pad) / self.scale, (y + 1.0 + pad) / self.scale],
        )
    }

    fn to_tile(&self, p: &ProjectedPoint) -> [f64; 2] {
        [
            (p.x * self.scale - self.key.x as f64) * self.extent,
            (p.y * self.scale - self.key.y as f64) * self.extent,
        ]
    }

    fn keeps(&self, p: &ProjectedPoint) -> bool {
        self.tolerance == 0.0 || p.importance > self.sq_tolerance
    }

    fn simplified(&self, part: &ProjectedPart) -> Vec<[f64; 2]> {
        part.points
            .iter()
            .filter(|p| self.keeps(p))
            .map(|p| self.to_tile(p))
            .collect()
    }

    fn clip_min(&self) -> f64 {
        -self.buffer
    }

    fn clip_max(&self) -> f64 {
        self.extent + self.buffer
    }

    /// Appends the tile features `feature` contributes to this tile.
    ///
    /// With line metrics on, every clipped line piece becomes its own feature
    /// so it can carry its position along the source line.
    pub fn slice(&self, feature: &ConvertedFeature, out: &mut Vec<TileFeature>) {
        let (min, max) = (self.clip_min(), self.clip_max());
        let make = |geometry, line_range| TileFeature {
            id: feature.id.clone(),
            geometry,
            properties: feature.properties.clone(),
            line_range,
        };

        match &feature.geometry {
            ConvertedGeometry::Points(points) => {
                let projected: Vec<_> = points.iter().map(|p| self.to_tile(p)).collect();
                let kept = quantize(&clip_points(&projected, min, max));
                if !kept.is_empty() {
                    out.push(make(TileGeometry::Points(kept), None));
                }
            }
            ConvertedGeometry::Lines(parts) => {
                let mut lines = Vec::new();
                for part in parts {
                    if self.tolerance > 0.0 && part.size < self.tolerance {
                        continue;
                    }
                    let path = self.simplified(part);
                    let total = path_length(&path);
                    for piece in clip_polyline(&path, min, max) {
                        let line = quantize(&piece.points);
                        if line.len() < 2 {
                            continue;
                        }
                        if self.line_metrics {
                            out.push(make(TileGeometry::Lines(vec![line]), Some(piece.range(total))));
                        } else {
                            lines.push(line);
                        }
                    }
                }
                if !lines.is_empty() {
                    out.push(make(TileGeometry::Lines(lines), None));
                }
            }
            ConvertedGeometry::Polygons(polygons) => {
                let kept: Vec<_> = polygons
                    .iter()
                    .filter_map(|rings| self.polygon(rings))
                    .collect();
                if !kept.is_empty() {
                    out.push(make(TileGeometry::Polygons(kept), None));
                }
            }
        }
    }

    fn polygon(&self, rings: &[ProjectedPart]) -> Option<Vec<Vec<TilePoint>>> {
        let (min, max) = (self.clip_min(), self.clip_max());
        let mut kept = Vec::with_capacity(rings.len());

        for (i, ring) in rings.iter().enumerate() {
            let outer = i == 0;
            if self.tolerance > 0.0 && ring.size < self.sq_tolerance {
                if outer {
                    return None;
                }
                continue;
            }

            let mut clipped = quantize(&clip_ring(&self.simplified(ring), min, max));
            if let (Some(&first), Some(&last)) = (clipped.first(), clipped.last())
                && first != last
            {
                clipped.push(first);
            }
            if clipped.len() < 4 {
                if outer {
                    return None;
                }
                continue;
            }
            kept.push(clipped);
        }
        Some(kept)
    }
}

/// Rounds to the tile grid, dropping consecutive duplicates.
fn quantize(points: &[[f64; 2]]) -> Vec<TilePoint> {
    let mut out: Vec<TilePoint> = Vec::with_capacity(points.len());
    for p in points {
        let q = [p[0].round() as i32, p[1].round() as i32];
        if out.last() != Some(&q) {
            out.push(q);
        }
    }
    out
}
