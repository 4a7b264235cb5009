//! Directional exposure geometry.
//!
//! Exposure is the clipped cosine between a voxel's radial direction from a
//! reference center and the unit flow direction. The reference center is the
//! grid's bounding-box center pulled upstream by `water_source_offset`.

use glam::{IVec3, Vec3};

use super::voxel::VoxelGrid;
use crate::error::SimulationError;

/// Flow vectors shorter than this cannot be normalized.
pub const FLOW_EPSILON: f32 = 1e-6;

/// Normalizes a flow vector, rejecting zero-length or non-finite input.
pub fn normalize_flow(flow_vector: Vec3) -> Result<Vec3, SimulationError> {
    let length = flow_vector.length();
    if !flow_vector.is_finite() || length <= FLOW_EPSILON {
        return Err(SimulationError::invalid(
            "flow_vector",
            format!("cannot normalize {:?}", flow_vector.to_array()),
        ));
    }
    Ok(flow_vector / length)
}

/// Integer neighbor offset for a unit flow direction (ties round away from zero).
pub fn flow_offset(flow_unit: Vec3) -> IVec3 {
    flow_unit.round().as_ivec3()
}

/// Reference point for exposure: bounding-box center minus `normalize(flow) * offset`.
pub fn shifted_center(
    grid: &VoxelGrid,
    flow_vector: Vec3,
    water_source_offset: f32,
) -> Result<Vec3, SimulationError> {
    let flow_unit = normalize_flow(flow_vector)?;
    Ok(grid.bounding_center() - flow_unit * water_source_offset)
}

/// Exposure of point `p` relative to `center` for the given unit flow.
///
/// Returns 0.0 when `p` coincides with `center`.
#[inline]
pub fn exposure_value(p: Vec3, center: Vec3, flow_unit: Vec3) -> f32 {
    let radial = p - center;
    if radial.length_squared() == 0.0 {
        return 0.0;
    }
    radial.normalize().dot(flow_unit).max(0.0)
}

/// Exposure for every voxel in the grid, present or not.
pub fn exposure_field(grid: &VoxelGrid, center: Vec3, flow_unit: Vec3) -> Vec<f32> {
    (0..grid.len())
        .map(|i| exposure_value(grid.position(i), center, flow_unit))
        .collect()
}

/// Surface and exposure state of a grid for one flow configuration.
///
/// Handed to erosion models and to read-only consumers (renderers, analysis)
/// so they never recompute masks themselves.
#[derive(Debug, Clone)]
pub struct ExposureSnapshot {
    /// Reference center used for exposure values.
    pub center: Vec3,
    /// Normalized flow direction.
    pub flow_unit: Vec3,
    /// Surface flag per voxel (x-major).
    pub surface: Vec<bool>,
    /// Flat indices of exposed surface voxels, ascending.
    pub exposed: Vec<usize>,
    /// Exposure value for each entry of `exposed`.
    pub exposure: Vec<f32>,
}

impl ExposureSnapshot {
    /// Computes the snapshot against an already-known reference center.
    pub fn capture(grid: &VoxelGrid, flow_unit: Vec3, center: Vec3) -> Self {
        let surface = grid.surface_mask();
        let exposed = grid.exposed_from_mask(&surface, flow_offset(flow_unit));
        let exposure = exposed
            .iter()
            .map(|&i| exposure_value(grid.position(i), center, flow_unit))
            .collect();

        Self {
            center,
            flow_unit,
            surface,
            exposed,
            exposure,
        }
    }

    /// Sum of exposure over exposed voxels.
    pub fn total_exposure(&self) -> f32 {
        self.exposure.iter().sum()
    }

    pub fn surface_count(&self) -> usize {
        self.surface.iter().filter(|&&s| s).count()
    }
}

impl VoxelGrid {
    /// Computes surface, exposed set and exposure values for a raw flow vector.
    pub fn exposure_snapshot(
        &self,
        flow_vector: Vec3,
        water_source_offset: f32,
    ) -> Result<ExposureSnapshot, SimulationError> {
        let flow_unit = normalize_flow(flow_vector)?;
        let center = shifted_center(self, flow_unit, water_source_offset)?;
        Ok(ExposureSnapshot::capture(self, flow_unit, center))
    }
}
