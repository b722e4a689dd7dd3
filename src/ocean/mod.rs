//! FFT ocean simulation: spectrum, synthesis, tiling and height queries.

mod dispersion;
mod export;
mod fft;
mod field;
mod height;
mod influence;
mod instances;
mod mesh;
mod spectrum;
mod system;

pub use dispersion::{evolve, Dispersion};
pub use export::{heightmap_luma, save_heightmap, ExportError};
pub use fft::FftChannel;
pub use field::{Channel, WaveField};
pub use height::{local_height, query_height, wrap_index};
pub use influence::{Falloff, InfluenceMap, InfluenceMaps, MAX_INFLUENCE_MAPS};
pub use instances::{Instance, InstanceSet, Transform};
pub use mesh::{
    flat_vertices, grid_index, grid_indices, rest_position, ComputationalVertex, Topology, Vertex,
};
pub use spectrum::{Spectrum, PHILLIPS_DAMPING, WAVE_NUMBER_EPSILON};
pub use system::{LifecycleState, OceanSystem};
