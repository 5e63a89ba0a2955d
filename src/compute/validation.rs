//! Validation for raw load requests.

use crate::error::{Result, TilerError};
use serde_json::Value;

/// `type` members accepted at the top level of a GeoJSON object.
pub const GEOJSON_TYPES: [&str; 9] = [
    "FeatureCollection",
    "Feature",
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// Checks that a load request carries a GeoJSON object and returns it.
///
/// Only the outer shape is checked here: the data must be present, must be a
/// JSON object and must declare a recognized `type`. Malformed contents are
/// left for the codec to report.
///
/// # Examples
///
/// ```
/// use geotiler::compute::validation::validate_raw_data;
/// use serde_json::json;
///
/// let data = json!({"type": "FeatureCollection", "features": []});
/// assert!(validate_raw_data("roads", Some(data)).is_ok());
///
/// // Missing data
/// assert!(validate_raw_data("roads", None).is_err());
///
/// // Not an object
/// assert!(validate_raw_data("roads", Some(json!("not-an-object"))).is_err());
/// ```
pub fn validate_raw_data(source_id: &str, data: Option<Value>) -> Result<Value> {
    let invalid = |reason: String| TilerError::InvalidInput {
        source_id: source_id.to_string(),
        reason,
    };

    let Some(data) = data else {
        return Err(invalid("no data was provided".to_string()));
    };

    let Some(object) = data.as_object() else {
        return Err(invalid(format!("expected an object, got {}", kind_of(&data))));
    };

    match object.get("type") {
        Some(Value::String(kind)) if GEOJSON_TYPES.contains(&kind.as_str()) => Ok(data),
        Some(Value::String(kind)) => Err(invalid(format!("unrecognized type '{}'", kind))),
        Some(other) => Err(invalid(format!(
            "'type' must be a string, got {}",
            kind_of(other)
        ))),
        None => Err(invalid("missing 'type' member".to_string())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reason(result: Result<Value>) -> String {
        match result {
            Err(TilerError::InvalidInput { reason, .. }) => reason,
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_every_geojson_type() {
        for kind in GEOJSON_TYPES {
            let data = json!({ "type": kind });
            assert!(validate_raw_data("src", Some(data)).is_ok(), "{}", kind);
        }
    }

    #[test]
    fn test_rejects_missing_data() {
        assert!(reason(validate_raw_data("src", None)).contains("no data"));
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(reason(validate_raw_data("src", Some(json!("text")))).contains("a string"));
        assert!(reason(validate_raw_data("src", Some(json!([1, 2])))).contains("an array"));
        assert!(reason(validate_raw_data("src", Some(json!(null)))).contains("null"));
    }

    #[test]
    fn test_rejects_unrecognized_type() {
        let data = json!({"type": "not-an-object-string"});
        let err = validate_raw_data("parcels", Some(data)).unwrap_err();

        assert_eq!(err.source_id(), Some("parcels"));
        assert!(err.to_string().contains("not-an-object-string"));
    }

    #[test]
    fn test_rejects_missing_or_non_string_type() {
        assert!(reason(validate_raw_data("src", Some(json!({})))).contains("missing"));
        assert!(reason(validate_raw_data("src", Some(json!({"type": 3})))).contains("a number"));
    }
}
