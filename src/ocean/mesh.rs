//! Tile mesh: render vertices, computational vertices and index buffers.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::complex::Complex;

/// Vertex data uploaded by the render backend (position + normal + UV)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }
}

/// Per-grid-point simulation state
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ComputationalVertex {
    /// Rest position of the vertex in tile space
    pub original_position: Vec3,
    pub position: Vec3,
    pub normal: Vec3,
    /// `h0(k)` of this cell
    pub h_tilde_0: Complex,
    /// Conjugate companion sample of this cell
    pub h_tilde_0_conjugate: Complex,
}

/// Index topology handed to the render backend
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Topology {
    /// Two triangles per cell
    #[default]
    Triangles,
    /// Three edges per cell plus the closing right and bottom edges
    Lines,
}

/// Row-major index of `(x, z)` in a grid with `stride` vertices per row
#[inline]
pub fn grid_index(x: usize, z: usize, stride: usize) -> usize {
    z * stride + x
}

/// Rest position of grid point `(x, z)`, centred on the tile origin
pub fn rest_position(x: usize, z: usize, grid_size: usize, cell_size: Vec2) -> Vec3 {
    let half = grid_size as f32 / 2.0;
    Vec3::new(
        (x as f32 - half) * cell_size.x,
        0.0,
        (z as f32 - half) * cell_size.y,
    )
}

/// Flat `(grid_size + 1)²` render grid in the XZ plane
pub fn flat_vertices(grid_size: usize, cell_size: Vec2) -> Vec<Vertex> {
    let stride = grid_size + 1;
    let mut vertices = Vec::with_capacity(stride * stride);

    for z in 0..=grid_size {
        for x in 0..=grid_size {
            vertices.push(Vertex {
                position: rest_position(x, z, grid_size, cell_size).to_array(),
                normal: Vec3::Y.to_array(),
                uv: [x as f32 / grid_size as f32, z as f32 / grid_size as f32],
            });
        }
    }
    vertices
}

/// Index buffer over the `(grid_size + 1)²` render grid
pub fn grid_indices(grid_size: usize, topology: Topology) -> Vec<u32> {
    match topology {
        Topology::Triangles => triangle_indices(grid_size),
        Topology::Lines => line_indices(grid_size),
    }
}

fn triangle_indices(grid_size: usize) -> Vec<u32> {
    let stride = grid_size + 1;
    let mut indices = Vec::with_capacity(grid_size * grid_size * 6);

    // Counter-clockwise winding
    for z in 0..grid_size {
        for x in 0..grid_size {
            let top_left = grid_index(x, z, stride) as u32;
            let top_right = top_left + 1;
            let bottom_left = grid_index(x, z + 1, stride) as u32;
            let bottom_right = bottom_left + 1;

            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }
    indices
}

fn line_indices(grid_size: usize) -> Vec<u32> {
    let stride = grid_size + 1;
    let mut indices = Vec::with_capacity(grid_size * grid_size * 6 + grid_size * 4);

    for z in 0..grid_size {
        for x in 0..grid_size {
            let top_left = grid_index(x, z, stride) as u32;
            let top_right = top_left + 1;
            let bottom_left = grid_index(x, z + 1, stride) as u32;
            let bottom_right = bottom_left + 1;

            indices.extend_from_slice(&[
                top_left,
                top_right,
                top_left,
                bottom_left,
                top_left,
                bottom_right,
            ]);
            if x == grid_size - 1 {
                indices.extend_from_slice(&[top_right, bottom_right]);
            }
            if z == grid_size - 1 {
                indices.extend_from_slice(&[bottom_left, bottom_right]);
            }
        }
    }
    indices
}
