//! Tile contents: features in integer tile coordinates with typed properties.

use crate::key::TileKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A vertex in tile-local integer coordinates.
///
/// `[0, 0]` is the north-west corner and `[extent, extent]` the south-east
/// corner; buffered geometry may extend slightly outside that range.
pub type TilePoint = [i32; 2];

/// Property bag of a feature, ordered by key.
pub type Properties = BTreeMap<String, PropertyValue>;

/// Feature identifier as carried by the source data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureId {
    Number(u64),
    String(String),
}

impl From<u64> for FeatureId {
    fn from(id: u64) -> Self {
        FeatureId::Number(id)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        FeatureId::String(id.to_string())
    }
}

/// Scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    UInt(u64),
    Double(f64),
    Bool(bool),
}

impl PropertyValue {
    /// Converts a JSON value into a property value.
    ///
    /// `null` has no representation and yields `None`. Arrays and objects are
    /// kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        match value {
            Value::Null => None,
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Some(PropertyValue::UInt(u))
                } else if let Some(i) = n.as_i64() {
                    Some(PropertyValue::Int(i))
                } else {
                    n.as_f64().map(PropertyValue::Double)
                }
            }
            Value::String(s) => Some(PropertyValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => Some(PropertyValue::String(value.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Geometry type of a feature, numbered as vector tile geometry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FeatureKind {
    Point = 1,
    LineString = 2,
    Polygon = 3,
}

/// Geometry of a tile feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TileGeometry {
    /// One or more points.
    Points(Vec<TilePoint>),
    /// One or more line strings.
    Lines(Vec<Vec<TilePoint>>),
    /// One or more polygons, each an outer ring followed by its holes.
    Polygons(Vec<Vec<Vec<TilePoint>>>),
}

impl TileGeometry {
    pub fn kind(&self) -> FeatureKind {
        match self {
            TileGeometry::Points(_) => FeatureKind::Point,
            TileGeometry::Lines(_) => FeatureKind::LineString,
            TileGeometry::Polygons(_) => FeatureKind::Polygon,
        }
    }

    /// Total number of vertices across all parts.
    pub fn vertex_count(&self) -> usize {
        match self {
            TileGeometry::Points(points) => points.len(),
            TileGeometry::Lines(lines) => lines.iter().map(Vec::len).sum(),
            TileGeometry::Polygons(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter().map(Vec::len))
                .sum(),
        }
    }
}

/// One feature of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileFeature {
    pub id: Option<FeatureId>,
    pub geometry: TileGeometry,
    pub properties: Properties,
    /// Fraction of the source line's length covered by this part, as
    /// `(start, end)`. Only set for line features when line metrics are on.
    pub line_range: Option<(f64, f64)>,
}

impl TileFeature {
    pub fn kind(&self) -> FeatureKind {
        self.geometry.kind()
    }
}

/// Ordered features of one tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilePayload {
    pub key: TileKey,
    pub features: Vec<TileFeature>,
}

impl TilePayload {
    pub fn new(key: TileKey, features: Vec<TileFeature>) -> Self {
        Self { key, features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Total number of vertices over all features.
    pub fn vertex_count(&self) -> usize {
        self.features.iter().map(|f| f.geometry.vertex_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_from_json_scalars() {
        assert_eq!(
            PropertyValue::from_json(&json!("a")),
            Some(PropertyValue::String("a".into()))
        );
        assert_eq!(PropertyValue::from_json(&json!(7)), Some(PropertyValue::UInt(7)));
        assert_eq!(PropertyValue::from_json(&json!(-7)), Some(PropertyValue::Int(-7)));
        assert_eq!(
            PropertyValue::from_json(&json!(1.5)),
            Some(PropertyValue::Double(1.5))
        );
        assert_eq!(
            PropertyValue::from_json(&json!(true)),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(PropertyValue::from_json(&json!(null)), None);
    }

    #[test]
    fn test_property_from_json_nested_is_text() {
        let value = PropertyValue::from_json(&json!({"a": [1, 2]})).unwrap();
        assert_eq!(value.as_str(), Some(r#"{"a":[1,2]}"#));
    }

    #[test]
    fn test_vertex_count() {
        let geometry = TileGeometry::Polygons(vec![vec![
            vec![[0, 0], [10, 0], [10, 10], [0, 0]],
            vec![[2, 2], [3, 2], [3, 3], [2, 2]],
        ]]);
        assert_eq!(geometry.vertex_count(), 8);
        assert_eq!(geometry.kind(), FeatureKind::Polygon);
    }
}
