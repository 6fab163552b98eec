//! Warp mesh: an N×N vertex lattice drawn as a single triangle strip.
//!
//! Vertex `k = i * N + j` sits on the lattice point `(i / (N-1), j / (N-1))`.
//! The lattice doubles as the texture coordinate of the vertex and never
//! changes; only the displaced positions are rewritten each frame.

use crate::displacement::DisplacementField;
use crate::error::IbfvError;

/// Builds the index list for one continuous triangle strip covering an
/// `n × n` lattice.
///
/// Each lattice column `x` contributes `n` pairs `(k, k + n)`, walking
/// upward on even columns and downward on odd ones. Every column starts
/// from the last index of the previous one, so the turnaround only adds
/// degenerate triangles and the whole grid draws in one call.
///
/// The result has exactly `n * (n - 1) * 2` entries, all below `n * n`.
/// Returns an empty list for `n < 2`.
pub fn build_strip_indices(n: u32) -> Vec<u32> {
    if n < 2 {
        return Vec::new();
    }
    let len = n as usize * (n as usize - 1) * 2;
    let mut indices = Vec::with_capacity(len);
    let mut index = 0u32;
    for x in 0..n - 1 {
        for _ in 0..n {
            indices.push(index);
            indices.push(index + n);
            if x % 2 == 0 {
                index += 1;
            } else {
                index -= 1;
            }
        }
        index = indices[indices.len() - 1];
    }
    indices
}

/// The warp mesh: fixed topology and texture coordinates, per-frame positions.
#[derive(Debug, Clone)]
pub struct MeshGrid {
    resolution: u32,
    lattice: Vec<[f32; 2]>,
    positions: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl MeshGrid {
    /// Creates an `n × n` mesh with positions equal to the lattice.
    ///
    /// Returns `IbfvError::InvalidDimensions` for `n < 2` and
    /// `IbfvError::InvalidConfig` if the vertex count does not fit `u32`.
    pub fn new(n: usize) -> Result<Self, IbfvError> {
        if n < 2 {
            return Err(IbfvError::InvalidDimensions);
        }
        let resolution = n
            .checked_mul(n)
            .and_then(|count| u32::try_from(count).ok())
            .and_then(|_| u32::try_from(n).ok())
            .ok_or_else(|| {
                IbfvError::invalid_config("mesh_resolution", "vertex count exceeds u32 indices")
            })?;

        let dm = 1.0 / (n as f64 - 1.0);
        let lattice: Vec<[f32; 2]> = (0..n)
            .flat_map(|i| (0..n).map(move |j| [(dm * i as f64) as f32, (dm * j as f64) as f32]))
            .collect();

        Ok(Self {
            resolution,
            positions: lattice.clone(),
            lattice,
            indices: build_strip_indices(resolution),
        })
    }

    /// Vertices per side (N).
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn vertex_count(&self) -> usize {
        self.lattice.len()
    }

    /// Recomputes every displaced position from its lattice point.
    pub fn rebuild(&mut self, field: &DisplacementField, sa: f64) {
        for (pos, lat) in self.positions.iter_mut().zip(&self.lattice) {
            let (px, py) = field.displace(f64::from(lat[0]), f64::from(lat[1]), sa);
            *pos = [px as f32, py as f32];
        }
    }

    /// Displaced positions, one per vertex, in vertex order.
    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    /// Fixed lattice coordinates, used as texture coordinates.
    pub fn tex_coords(&self) -> &[[f32; 2]] {
        &self.lattice
    }

    /// The triangle-strip connectivity built at construction.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}
