//! Wave field synthesizer: spectrum evolution, parallel inverse FFTs and reconstruction.
//!
//! One call to [`WaveField::generate`] performs a full tick:
//!
//! 1. Evolve every cell's amplitude to time `t` and build the five
//!    frequency-domain channels (height, slope x/z, displacement x/z).
//! 2. Inverse-transform the five channels as independent jobs and wait for
//!    all of them (fork/join barrier).
//! 3. Undo the implicit frequency shift with the `(-1)^(x+z)` checkerboard
//!    and write heights, horizontal displacement and normals.
//! 4. Copy the first row/column onto the last row/column so the tile repeats
//!    without seams.

use glam::{Vec2, Vec3};
use log::{debug, trace, warn};

use super::dispersion::evolve;
use super::fft::FftChannel;
use super::mesh::{self, ComputationalVertex, Topology, Vertex};
use super::spectrum::{Spectrum, WAVE_NUMBER_EPSILON};
use crate::complex::Complex;
use crate::jobs;
use crate::params::{OceanParams, Parallelism, SynthesisBackend};

/// Grid sizes above this make the direct backend impractically slow
const DIRECT_BACKEND_SOFT_LIMIT: usize = 64;

/// Frequency-domain channel
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    Height,
    SlopeX,
    SlopeZ,
    DisplaceX,
    DisplaceZ,
}

impl Channel {
    pub const COUNT: usize = 5;

    pub const ALL: [Channel; Self::COUNT] = [
        Channel::Height,
        Channel::SlopeX,
        Channel::SlopeZ,
        Channel::DisplaceX,
        Channel::DisplaceZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Spatial-domain values reconstructed for one vertex
#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct SurfaceSample {
    height: f32,
    slope: Vec2,
    displacement: Vec2,
}

/// Simulated tile: computational state, render vertices and FFT channels
pub struct WaveField {
    grid_size: usize,
    cell_size: Vec2,
    displacement: bool,
    backend: SynthesisBackend,
    parallelism: Parallelism,
    spectrum: Spectrum,
    computational: Vec<ComputationalVertex>,
    vertices: Vec<Vertex>,
    triangle_indices: Vec<u32>,
    line_indices: Vec<u32>,
    spectra: [Vec<Complex>; Channel::COUNT],
    channels: [FftChannel; Channel::COUNT],
    time_s: f64,
}

impl WaveField {
    /// Allocate every array and sample the spectrum once per cell
    pub fn new(params: &OceanParams) -> Self {
        let grid_size = params.grid_size;
        let cell_size = params.cell_size();
        let spectrum = Spectrum::new(params);

        if params.backend == SynthesisBackend::Direct && grid_size > DIRECT_BACKEND_SOFT_LIMIT {
            warn!(
                "Direct synthesis on a {}x{} grid is O(N^4), expect very slow ticks",
                grid_size, grid_size
            );
        }

        let computational = sample_computational_vertices(&spectrum, params);
        let cells = grid_size * grid_size;

        debug!(
            "Constructed {}x{} wave field ({} vertices)",
            grid_size,
            grid_size,
            computational.len()
        );

        Self {
            grid_size,
            cell_size,
            displacement: params.displacement,
            backend: params.backend,
            parallelism: params.parallelism,
            spectrum,
            computational,
            vertices: mesh::flat_vertices(grid_size, cell_size),
            triangle_indices: mesh::grid_indices(grid_size, Topology::Triangles),
            line_indices: mesh::grid_indices(grid_size, Topology::Lines),
            spectra: std::array::from_fn(|_| vec![Complex::ZERO; cells]),
            channels: std::array::from_fn(|_| FftChannel::new(grid_size)),
            time_s: 0.0,
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// World spacing between neighbouring vertices
    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    /// Simulation time of the last synthesized tick (seconds)
    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Render vertices, `(grid_size + 1)²`, row-major
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex(&self, x: usize, z: usize) -> &Vertex {
        &self.vertices[mesh::grid_index(x, z, self.grid_size + 1)]
    }

    pub fn computational_vertices(&self) -> &[ComputationalVertex] {
        &self.computational
    }

    pub fn computational_vertex(&self, x: usize, z: usize) -> &ComputationalVertex {
        &self.computational[mesh::grid_index(x, z, self.grid_size + 1)]
    }

    pub fn indices(&self, topology: Topology) -> &[u32] {
        match topology {
            Topology::Triangles => &self.triangle_indices,
            Topology::Lines => &self.line_indices,
        }
    }

    /// Frequency-domain values of `channel` as built by the last tick, `grid_size²`
    pub fn frequency_channel(&self, channel: Channel) -> &[Complex] {
        &self.spectra[channel.index()]
    }

    /// `h(k, t)` of cell `(x, z)` from its cached initial amplitudes
    pub fn h_tilde(&self, x: usize, z: usize, time_s: f64) -> Complex {
        let vertex = self.computational_vertex(x, z);
        let omega = self.spectrum.angular_frequency(x as i32, z as i32);
        evolve(vertex.h_tilde_0, vertex.h_tilde_0_conjugate, omega, time_s)
    }

    /// Apply the options that do not invalidate the spectrum
    pub fn configure(&mut self, params: &OceanParams) {
        self.displacement = params.displacement;
        self.backend = params.backend;
        self.parallelism = params.parallelism;
    }

    /// Synthesize the field at `time_s`
    pub fn generate(&mut self, time_s: f64) {
        self.time_s = time_s;
        self.build_spectra(time_s);

        match self.backend {
            SynthesisBackend::Fft => {
                self.transform_channels();
                self.reconstruct_from_channels();
            }
            SynthesisBackend::Direct => self.reconstruct_direct(),
        }

        self.wrap_edges();
        self.sync_render_vertices();
    }

    fn build_spectra(&mut self, time_s: f64) {
        let n = self.grid_size;
        for z in 0..n {
            for x in 0..n {
                let k = self.spectrum.wave_vector(x as i32, z as i32);
                let k_len = k.length();
                let i = mesh::grid_index(x, z, n);

                // The zero wavevector would only lift the whole tile
                if k_len < WAVE_NUMBER_EPSILON {
                    for spectrum in &mut self.spectra {
                        spectrum[i] = Complex::ZERO;
                    }
                    continue;
                }

                let h = self.h_tilde(x, z, time_s);
                self.spectra[Channel::Height.index()][i] = h;
                self.spectra[Channel::SlopeX.index()][i] = h * Complex::imaginary(k.x);
                self.spectra[Channel::SlopeZ.index()][i] = h * Complex::imaginary(k.y);
                self.spectra[Channel::DisplaceX.index()][i] = h * Complex::imaginary(-k.x / k_len);
                self.spectra[Channel::DisplaceZ.index()][i] = h * Complex::imaginary(-k.y / k_len);
            }
        }
    }

    /// Fork one inverse FFT job per channel and join them all
    fn transform_channels(&mut self) {
        let spectra = &self.spectra;
        let channels = &mut self.channels;

        jobs::scope(self.parallelism, |jobs| {
            let handles: Vec<_> = channels
                .iter_mut()
                .zip(spectra.iter())
                .zip(Channel::ALL)
                .map(|((fft, input), channel)| {
                    jobs.queue(move || {
                        if !fft.transform(input) {
                            trace!("Skipped {:?} channel, no FFT plan", channel);
                        }
                    })
                })
                .collect();

            for handle in handles {
                jobs.wait(handle);
            }
        });
    }

    fn reconstruct_from_channels(&mut self) {
        let n = self.grid_size;
        let stride = n + 1;
        let value = |channel: Channel, i: usize| self.channels[channel.index()].value(i).real;

        for z in 0..n {
            for x in 0..n {
                let i = mesh::grid_index(x, z, n);
                // The FFT output is frequency-shifted by N/2 along both axes
                let sign = if (x + z) % 2 == 0 { 1.0 } else { -1.0 };
                let sample = SurfaceSample {
                    height: sign * value(Channel::Height, i),
                    slope: Vec2::new(value(Channel::SlopeX, i), value(Channel::SlopeZ, i)) * sign,
                    displacement: Vec2::new(
                        value(Channel::DisplaceX, i),
                        value(Channel::DisplaceZ, i),
                    ) * sign,
                };
                let vertex = &mut self.computational[mesh::grid_index(x, z, stride)];
                apply_sample(vertex, sample, self.displacement);
            }
        }
    }

    /// Evaluate every vertex as an explicit sum over all frequencies
    fn reconstruct_direct(&mut self) {
        let n = self.grid_size;
        let stride = n + 1;
        let half = (n / 2) as i64;
        let step = 2.0 * std::f32::consts::PI / n as f32;

        for z in 0..n {
            for x in 0..n {
                let mut sums = [Complex::ZERO; Channel::COUNT];
                for l in 0..n {
                    for m in 0..n {
                        let turns = ((m as i64 - half) * x as i64 + (l as i64 - half) * z as i64)
                            .rem_euclid(n as i64);
                        let unit = Complex::from_phase(step * turns as f32);
                        let i = mesh::grid_index(m, l, n);
                        for (sum, spectrum) in sums.iter_mut().zip(&self.spectra) {
                            *sum += spectrum[i] * unit;
                        }
                    }
                }

                let real = |channel: Channel| sums[channel.index()].real;
                let sample = SurfaceSample {
                    height: real(Channel::Height),
                    slope: Vec2::new(real(Channel::SlopeX), real(Channel::SlopeZ)),
                    displacement: Vec2::new(real(Channel::DisplaceX), real(Channel::DisplaceZ)),
                };
                let vertex = &mut self.computational[mesh::grid_index(x, z, stride)];
                apply_sample(vertex, sample, self.displacement);
            }
        }
    }

    /// Last row/column mirror the first row/column, relative to their own rest positions
    fn wrap_edges(&mut self) {
        let n = self.grid_size;
        let stride = n + 1;

        for z in 0..=n {
            for x in 0..=n {
                if x < n && z < n {
                    continue;
                }
                let source = self.computational[mesh::grid_index(x % n, z % n, stride)];
                let offset = source.position - source.original_position;
                let target = &mut self.computational[mesh::grid_index(x, z, stride)];
                target.position = target.original_position + offset;
                target.normal = source.normal;
            }
        }
    }

    fn sync_render_vertices(&mut self) {
        for (vertex, computed) in self.vertices.iter_mut().zip(&self.computational) {
            vertex.position = computed.position.to_array();
            vertex.normal = computed.normal.to_array();
        }
    }
}

fn apply_sample(vertex: &mut ComputationalVertex, sample: SurfaceSample, displacement: bool) {
    let mut position = vertex.original_position;
    position.y = sample.height;
    if displacement {
        position.x -= sample.displacement.x;
        position.z -= sample.displacement.y;
    }
    vertex.position = position;
    vertex.normal = Vec3::new(-sample.slope.x, 1.0, -sample.slope.y).normalize();
}

/// Sample `h0` and its conjugate companion for every grid point, rows split across jobs
fn sample_computational_vertices(
    spectrum: &Spectrum,
    params: &OceanParams,
) -> Vec<ComputationalVertex> {
    let n = params.grid_size;
    let stride = n + 1;
    let cell_size = params.cell_size();
    let mut vertices = vec![ComputationalVertex::default(); stride * stride];

    let workers = jobs::worker_count();
    let rows_per_job = stride.div_ceil(workers).max(1);
    let chunk_len = rows_per_job * stride;

    jobs::scope(params.parallelism, |jobs| {
        let handles: Vec<_> = vertices
            .chunks_mut(chunk_len)
            .enumerate()
            .map(|(chunk, rows)| {
                jobs.queue(move || {
                    for (offset, vertex) in rows.iter_mut().enumerate() {
                        let index = chunk * chunk_len + offset;
                        let (x, z) = (index % stride, index / stride);
                        let rest = mesh::rest_position(x, z, n, cell_size);
                        *vertex = ComputationalVertex {
                            original_position: rest,
                            position: rest,
                            normal: Vec3::Y,
                            h_tilde_0: spectrum.h_tilde_0(x as i32, z as i32),
                            h_tilde_0_conjugate: spectrum.h_tilde_0_conjugate(x as i32, z as i32),
                        };
                    }
                })
            })
            .collect();

        for handle in handles {
            jobs.wait(handle);
        }
    });

    vertices
}
