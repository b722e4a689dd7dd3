//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables live here with:
//! - Physical units (meters, seconds, m/s², etc.)
//! - Documented ranges and the fallback applied when out of range
//! - Type safety where possible (enums instead of boolean switches)

mod config;
mod ocean;

// Re-export all types
pub use config::{ConfigError, OceanConfig};
pub use ocean::{
    is_valid_grid_size, validate_grid_size, validate_instance_count, validate_vertex_distance,
    ConjugateSampling, OceanParams, Parallelism, SynthesisBackend, WaveVectorScale,
    DEFAULT_GRID_SIZE, DEFAULT_REPEAT_PERIOD_S, GRID_SIZES, MAX_INSTANCE_COUNT, MIN_INSTANCE_COUNT,
    MIN_TIME_DILATION, MIN_VERTEX_DISTANCE,
};
