//! Error taxonomy for district generation.
//!
//! Only unrecoverable conditions live here. Recoverable degradations (a zone too
//! small for any lot, a capacity-driven reduction of buildings per block) are
//! reported as [`crate::pipeline::Diagnostic`] values instead.

use thiserror::Error;

use crate::roads::Axis;

pub type Result<T> = std::result::Result<T, CityGenError>;

#[derive(Debug, Error)]
pub enum CityGenError {
    /// Invalid input parameters. No partial output is produced.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The run asks for more blocks or buildings than the hard ceiling allows
    #[error("{reason}, limit {limit} ({requested_blocks} blocks, {requested_buildings} buildings)")]
    Capacity {
        requested_blocks: usize,
        requested_buildings: usize,
        limit: usize,
        reason: &'static str,
    },

    /// A road network handed to the zone identifier lacks segments on an axis
    #[error("malformed road network: {axis} axis has {found} segments, expected {expected}")]
    MalformedNetwork {
        axis: Axis,
        expected: usize,
        found: usize,
    },

    /// A generator defect. The run is aborted rather than emitting bad geometry.
    #[error("structural invariant violated in {component} at {indices:?}: {detail}")]
    StructuralInvariant {
        component: &'static str,
        indices: Vec<usize>,
        detail: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl CityGenError {
    pub fn config(msg: impl Into<String>) -> Self {
        CityGenError::Configuration(msg.into())
    }

    pub fn invariant(
        component: &'static str,
        indices: Vec<usize>,
        detail: impl Into<String>,
    ) -> Self {
        CityGenError::StructuralInvariant {
            component,
            indices,
            detail: detail.into(),
        }
    }

    /// Whether the error signals a bug in the generator rather than bad input
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            CityGenError::StructuralInvariant { .. } | CityGenError::MalformedNetwork { .. }
        )
    }
}
