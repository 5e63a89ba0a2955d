//! Error types for the tiling worker.
//!
//! `TilerError` is what every public operation returns. The collaborator
//! errors (`ConversionError`, `IndexError`) are what a format codec or an
//! indexer reports; the pipeline wraps them together with the id of the
//! source that asked for the work.
//!
//! A superseded load is not an error: it resolves with an abandoned
//! [`LoadDataResult`](crate::protocol::LoadDataResult).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TilerError>;

#[derive(Debug, Error)]
pub enum TilerError {
    #[error("Input data given to '{source_id}' is not a valid GeoJSON object: {reason}")]
    InvalidInput { source_id: String, reason: String },

    #[error("Failed to convert data for '{source_id}'")]
    Conversion {
        source_id: String,
        #[source]
        source: ConversionError,
    },

    #[error("Failed to build spatial index for '{source_id}'")]
    IndexBuild {
        source_id: String,
        #[source]
        source: IndexError,
    },

    #[error("Tile encoding failed: {0}")]
    Encode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown source '{0}'")]
    UnknownSource(String),
}

impl TilerError {
    /// Id of the source a pipeline failure belongs to, if any.
    pub fn source_id(&self) -> Option<&str> {
        match self {
            TilerError::InvalidInput { source_id, .. }
            | TilerError::Conversion { source_id, .. }
            | TilerError::IndexBuild { source_id, .. } => Some(source_id),
            TilerError::UnknownSource(id) => Some(id),
            _ => None,
        }
    }
}

/// Failure reported by a format codec.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Malformed GeoJSON: {0}")]
    Malformed(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid conversion parameters: {0}")]
    InvalidParams(String),
}

/// Failure reported by an indexer.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Invalid index options: {0}")]
    InvalidOptions(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_wrapped_cause_is_exposed_as_source() {
        let err = TilerError::IndexBuild {
            source_id: "roads".into(),
            source: IndexError::InvalidOptions("max zoom 30 exceeds 24".into()),
        };

        assert_eq!(err.source_id(), Some("roads"));
        let cause = err.source().expect("wrapped cause");
        assert!(cause.to_string().contains("max zoom 30"));
    }

    #[test]
    fn test_invalid_input_names_source() {
        let err = TilerError::InvalidInput {
            source_id: "parcels".into(),
            reason: "no data".into(),
        };
        assert!(err.to_string().contains("'parcels'"));
    }
}
