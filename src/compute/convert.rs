//! GeoJSON conversion into the intermediate tiling format.
//!
//! Converted features live in unit Web Mercator space (`x` and `y` in
//! `[0, 1]`, `y` growing south). Every vertex carries its simplification
//! importance and every line or ring its size, so that tiles at any zoom can
//! be cut from one conversion without simplifying again.

use super::geometry::{bounding_rect, line_length, rewind, signed_area};
use super::simplify::mark_importance;
use crate::config::ConversionParams;
use crate::error::ConversionError;
use geo::Rect;
use geojson::{GeoJson, Geometry, feature::Id};
use geotiler_types::{FeatureId, Properties, PropertyValue};
use serde_json::Value;
use std::f64::consts::PI;

/// A projected vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    /// Squared tolerance above which this vertex is dropped.
    pub importance: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            importance: 0.0,
        }
    }
}

/// A projected line or ring.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPart {
    pub points: Vec<ProjectedPoint>,
    /// Length for lines, absolute area for rings.
    pub size: f64,
}

impl ProjectedPart {
    pub fn new(points: Vec<ProjectedPoint>) -> Self {
        Self { points, size: 0.0 }
    }
}

/// Geometry of a converted feature.
#[derive(Debug, Clone, PartialEq)]
pub enum ConvertedGeometry {
    Points(Vec<ProjectedPoint>),
    Lines(Vec<ProjectedPart>),
    /// Polygons, each a list of rings with the outer ring first.
    Polygons(Vec<Vec<ProjectedPart>>),
}

impl ConvertedGeometry {
    /// Iterates over every vertex of the geometry.
    pub fn vertices(&self) -> Box<dyn Iterator<Item = &ProjectedPoint> + '_> {
        match self {
            ConvertedGeometry::Points(points) => Box::new(points.iter()),
            ConvertedGeometry::Lines(lines) => {
                Box::new(lines.iter().flat_map(|part| part.points.iter()))
            }
            ConvertedGeometry::Polygons(polygons) => Box::new(
                polygons
                    .iter()
                    .flatten()
                    .flat_map(|ring| ring.points.iter()),
            ),
        }
    }
}

/// A feature ready for indexing.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedFeature {
    pub id: Option<FeatureId>,
    pub geometry: ConvertedGeometry,
    pub properties: Properties,
    /// Bounds in unit Web Mercator space.
    pub bbox: Rect<f64>,
}

impl ConvertedFeature {
    /// Builds a feature with bounds computed from its geometry.
    ///
    /// Returns `None` for a geometry without vertices.
    pub fn new(
        id: Option<FeatureId>,
        geometry: ConvertedGeometry,
        properties: Properties,
    ) -> Option<Self> {
        let bbox = bounding_rect(&geometry)?;
        Some(Self {
            id,
            geometry,
            properties,
            bbox,
        })
    }
}

/// Output of a format codec.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedCollection {
    pub features: Vec<ConvertedFeature>,
    /// Parameters the importance values were computed with.
    pub params: ConversionParams,
}

impl ConvertedCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Converts validated raw data into the intermediate format.
pub trait FormatCodec: Send + Sync {
    fn convert(
        &self,
        raw: Value,
        params: &ConversionParams,
    ) -> Result<ConvertedCollection, ConversionError>;
}

/// Codec for RFC 7946 GeoJSON.
///
/// Features without geometry are skipped. A `GeometryCollection` becomes one
/// feature per member, all sharing the parent's id and properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonCodec;

impl FormatCodec for GeoJsonCodec {
    fn convert(
        &self,
        raw: Value,
        params: &ConversionParams,
    ) -> Result<ConvertedCollection, ConversionError> {
        params.validate().map_err(ConversionError::InvalidParams)?;

        let geojson: GeoJson =
            serde_json::from_value(raw).map_err(|e| ConversionError::Malformed(e.to_string()))?;

        let mut converter = Converter {
            sq_tolerance: params.sq_tolerance(),
            features: Vec::new(),
        };
        match geojson {
            GeoJson::FeatureCollection(collection) => {
                for feature in collection.features {
                    converter.feature(feature)?;
                }
            }
            GeoJson::Feature(feature) => converter.feature(feature)?,
            GeoJson::Geometry(geometry) => {
                converter.geometry(&geometry, None, Properties::new())?
            }
        }

        Ok(ConvertedCollection {
            features: converter.features,
            params: *params,
        })
    }
}

struct Converter {
    sq_tolerance: f64,
    features: Vec<ConvertedFeature>,
}

impl Converter {
    fn feature(&mut self, feature: geojson::Feature) -> Result<(), ConversionError> {
        let Some(geometry) = feature.geometry else {
            return Ok(());
        };
        let id = feature.id.map(convert_id);
        let properties = feature
            .properties
            .map(|object| {
                object
                    .iter()
                    .filter_map(|(k, v)| PropertyValue::from_json(v).map(|v| (k.clone(), v)))
                    .collect()
            })
            .unwrap_or_default();
        self.geometry(&geometry, id, properties)
    }

    fn geometry(
        &mut self,
        geometry: &Geometry,
        id: Option<FeatureId>,
        properties: Properties,
    ) -> Result<(), ConversionError> {
        use geojson::Value as G;

        let converted = match &geometry.value {
            G::Point(position) => ConvertedGeometry::Points(vec![project(position)?]),
            G::MultiPoint(positions) => ConvertedGeometry::Points(
                positions
                    .iter()
                    .map(|p| project(p))
                    .collect::<Result<_, _>>()?,
            ),
            G::LineString(line) => ConvertedGeometry::Lines(vec![self.line(line)?]),
            G::MultiLineString(lines) => ConvertedGeometry::Lines(
                lines
                    .iter()
                    .map(|line| self.line(line))
                    .collect::<Result<_, _>>()?,
            ),
            G::Polygon(rings) => ConvertedGeometry::Polygons(vec![self.polygon(rings)?]),
            G::MultiPolygon(polygons) => ConvertedGeometry::Polygons(
                polygons
                    .iter()
                    .map(|rings| self.polygon(rings))
                    .collect::<Result<_, _>>()?,
            ),
            G::GeometryCollection(members) => {
                for member in members {
                    self.geometry(member, id.clone(), properties.clone())?;
                }
                return Ok(());
            }
        };

        // Empty geometries carry nothing to draw.
        if let Some(feature) = ConvertedFeature::new(id, converted, properties) {
            self.features.push(feature);
        }
        Ok(())
    }

    fn line(&self, positions: &[Vec<f64>]) -> Result<ProjectedPart, ConversionError> {
        let mut part = self.part(positions)?;
        part.size = line_length(&part.points);
        Ok(part)
    }

    fn polygon(&self, rings: &[Vec<Vec<f64>>]) -> Result<Vec<ProjectedPart>, ConversionError> {
        let mut parts = Vec::with_capacity(rings.len());
        for (i, positions) in rings.iter().enumerate() {
            let mut ring = self.part(positions)?;
            ring.size = signed_area(&ring.points).abs();
            rewind(&mut ring, i == 0);
            parts.push(ring);
        }
        Ok(parts)
    }

    fn part(&self, positions: &[Vec<f64>]) -> Result<ProjectedPart, ConversionError> {
        let mut points = positions
            .iter()
            .map(|p| project(p))
            .collect::<Result<Vec<_>, _>>()?;
        mark_importance(&mut points, self.sq_tolerance);
        Ok(ProjectedPart::new(points))
    }
}

fn convert_id(id: Id) -> FeatureId {
    match id {
        Id::String(s) => FeatureId::String(s),
        Id::Number(n) => match n.as_u64() {
            Some(n) => FeatureId::Number(n),
            None => FeatureId::String(n.to_string()),
        },
    }
}

/// Projects a `[lon, lat]` position into unit Web Mercator space.
pub fn project(position: &[f64]) -> Result<ProjectedPoint, ConversionError> {
    let [lon, lat] = match position {
        [lon, lat, ..] => [*lon, *lat],
        _ => {
            return Err(ConversionError::InvalidCoordinate(format!(
                "position needs at least 2 values, got {}",
                position.len()
            )));
        }
    };
    if !lon.is_finite() || !lat.is_finite() {
        return Err(ConversionError::InvalidCoordinate(format!(
            "non-finite position [{}, {}]",
            lon, lat
        )));
    }

    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    Ok(ProjectedPoint::new(lon / 360.0 + 0.5, y.clamp(0.0, 1.0)))
}
