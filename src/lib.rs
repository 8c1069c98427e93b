//! City district generation library
//!
//! Turns a `GridSpec` into roads, tiered zones and placed buildings.
//! Re-exports modules for use by binaries and tools.

pub mod ascii;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pipeline;
pub mod placement;
pub mod roads;
pub mod seeds;
pub mod variety;
pub mod verify;
pub mod zones;

pub use config::{CapacityLimits, CityConfig, GridSpec, RoadPerturbationMode, VarietyLevel};
pub use error::{CityGenError, Result};
pub use pipeline::{
    generate_city, generate_roads_only, regenerate_buildings, CityLayout, Diagnostic,
    GenerationReport,
};
pub use zones::ZoneTier;
