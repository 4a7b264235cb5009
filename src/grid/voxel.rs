//! Dense voxel density field with bounds-checked neighbor lookups.
//!
//! Storage is a flat `Vec<f32>` in x-major order:
//! `index = (x * ny + y) * nz + z`. Any lookup outside the grid is treated as
//! an absent voxel, which is what makes boundary voxels surface voxels.

use glam::{IVec3, Vec3};

use super::exposure::{flow_offset, normalize_flow};
use crate::error::SimulationError;

/// Densities below this after an erosion step are snapped to zero.
pub const RESIDUAL_DENSITY: f32 = 1e-4;

/// The six axis-aligned neighbor offsets (von Neumann neighborhood).
pub const AXIS_NEIGHBORS: [IVec3; 6] = [
    IVec3::new(1, 0, 0),
    IVec3::new(-1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(0, 0, -1),
];

/// A fixed-size 3D grid of densities in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    dims: [usize; 3],
    voxel_resolution: f32,
    density: Vec<f32>,
}

impl VoxelGrid {
    /// Creates an empty grid (all densities 0.0).
    pub fn new(dims: [usize; 3], voxel_resolution: f32) -> Result<Self, SimulationError> {
        let total = checked_len(dims)?;
        Self::from_densities(dims, voxel_resolution, vec![0.0; total])
    }

    /// Wraps an externally generated density field.
    ///
    /// `density` must hold `nx * ny * nz` values in x-major order, each in `[0, 1]`.
    pub fn from_densities(
        dims: [usize; 3],
        voxel_resolution: f32,
        density: Vec<f32>,
    ) -> Result<Self, SimulationError> {
        let total = checked_len(dims)?;
        if !(voxel_resolution.is_finite() && voxel_resolution > 0.0) {
            return Err(SimulationError::invalid(
                "voxel_resolution",
                format!("must be a positive finite number, got {}", voxel_resolution),
            ));
        }
        if density.len() != total {
            return Err(SimulationError::invalid(
                "density",
                format!("expected {} values for {:?}, got {}", total, dims, density.len()),
            ));
        }
        if let Some(bad) = density.iter().position(|d| !(0.0..=1.0).contains(d)) {
            return Err(SimulationError::invalid(
                "density",
                format!("value {} at index {} is outside [0, 1]", density[bad], bad),
            ));
        }

        Ok(Self {
            dims,
            voxel_resolution,
            density,
        })
    }

    /// Grid dimensions `[nx, ny, nz]`.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Total number of voxels.
    pub fn len(&self) -> usize {
        self.density.len()
    }

    pub fn is_empty(&self) -> bool {
        self.density.is_empty()
    }

    /// Volume represented by one voxel (mass units only).
    pub fn voxel_resolution(&self) -> f32 {
        self.voxel_resolution
    }

    /// Read-only view of the density buffer (x-major).
    pub fn densities(&self) -> &[f32] {
        &self.density
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let [_, ny, nz] = self.dims;
        (x * ny + y) * nz + z
    }

    #[inline]
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let [_, ny, nz] = self.dims;
        let z = idx % nz;
        let y = (idx / nz) % ny;
        let x = idx / (ny * nz);
        [x, y, z]
    }

    /// Voxel coordinates as a float position (voxel index space).
    pub fn position(&self, idx: usize) -> Vec3 {
        let [x, y, z] = self.coords(idx);
        Vec3::new(x as f32, y as f32, z as f32)
    }

    pub fn density(&self, x: usize, y: usize, z: usize) -> f32 {
        self.density[self.index(x, y, z)]
    }

    /// Returns the flat index of the voxel at `idx + offset`, or `None` outside the grid.
    pub fn neighbor(&self, idx: usize, offset: IVec3) -> Option<usize> {
        let [x, y, z] = self.coords(idx);
        let nx = x as i64 + offset.x as i64;
        let ny = y as i64 + offset.y as i64;
        let nz = z as i64 + offset.z as i64;
        let [dx, dy, dz] = self.dims;
        if nx < 0 || ny < 0 || nz < 0 || nx >= dx as i64 || ny >= dy as i64 || nz >= dz as i64 {
            return None;
        }
        Some(self.index(nx as usize, ny as usize, nz as usize))
    }

    /// True if the voxel at `idx + offset` exists and holds material.
    #[inline]
    fn neighbor_present(&self, idx: usize, offset: IVec3) -> bool {
        self.neighbor(idx, offset)
            .map(|n| self.density[n] > 0.0)
            .unwrap_or(false)
    }

    /// Presence field: `density > 0`.
    pub fn presence(&self) -> Vec<bool> {
        self.density.iter().map(|&d| d > 0.0).collect()
    }

    /// Present voxels with at least one absent (or out-of-bounds) axis neighbor.
    ///
    /// Equivalent to presence minus its binary erosion by the 6-connected
    /// structuring element, with everything outside the array counted as absent.
    pub fn surface_mask(&self) -> Vec<bool> {
        (0..self.len())
            .map(|i| {
                self.density[i] > 0.0
                    && AXIS_NEIGHBORS.iter().any(|&o| !self.neighbor_present(i, o))
            })
            .collect()
    }

    /// Surface voxels whose neighbor one rounded step along the flow is absent.
    ///
    /// Indices are returned in ascending flat order.
    pub fn exposed_surface_voxels(&self, flow_vector: Vec3) -> Result<Vec<usize>, SimulationError> {
        let offset = flow_offset(normalize_flow(flow_vector)?);
        let surface = self.surface_mask();
        Ok(self.exposed_from_mask(&surface, offset))
    }

    pub(crate) fn exposed_from_mask(&self, surface: &[bool], offset: IVec3) -> Vec<usize> {
        surface
            .iter()
            .enumerate()
            .filter(|&(i, &s)| s && !self.neighbor_present(i, offset))
            .map(|(i, _)| i)
            .collect()
    }

    /// Sum of all densities (dimensionless).
    pub fn total_density(&self) -> f64 {
        self.density.iter().map(|&d| d as f64).sum()
    }

    /// Volume-weighted density sum.
    pub fn mass(&self) -> f64 {
        self.total_density() * self.voxel_resolution as f64
    }

    /// Number of voxels with `density > 0`.
    pub fn active_voxel_count(&self) -> usize {
        self.density.iter().filter(|&&d| d > 0.0).count()
    }

    /// Center of the grid's bounding box in voxel index space.
    pub fn bounding_center(&self) -> Vec3 {
        let [nx, ny, nz] = self.dims;
        Vec3::new(
            (nx as f32 - 1.0) * 0.5,
            (ny as f32 - 1.0) * 0.5,
            (nz as f32 - 1.0) * 0.5,
        )
    }

    /// Refills every voxel with density 1.0.
    pub fn reset(&mut self) {
        self.density.fill(1.0);
    }

    /// Removes `amount` of density from one voxel, flooring at zero.
    ///
    /// Returns the density actually removed.
    pub(crate) fn erode(&mut self, idx: usize, amount: f32) -> Result<f32, SimulationError> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(SimulationError::InvariantViolation(format!(
                "erosion amount {} at voxel {:?} is negative or non-finite",
                amount,
                self.coords(idx)
            )));
        }

        let before = self.density[idx];
        let mut after = before - amount;
        if after < RESIDUAL_DENSITY {
            after = 0.0;
        }
        if !(0.0..=before).contains(&after) {
            return Err(SimulationError::InvariantViolation(format!(
                "density at voxel {:?} went from {} to {}",
                self.coords(idx),
                before,
                after
            )));
        }

        self.density[idx] = after;
        Ok(before - after)
    }
}

fn checked_len(dims: [usize; 3]) -> Result<usize, SimulationError> {
    if dims.iter().any(|&d| d == 0) {
        return Err(SimulationError::invalid(
            "size",
            format!("all grid dimensions must be positive, got {:?}", dims),
        ));
    }
    dims[0]
        .checked_mul(dims[1])
        .and_then(|v| v.checked_mul(dims[2]))
        .ok_or_else(|| SimulationError::invalid("size", format!("grid {:?} is too large", dims)))
}
