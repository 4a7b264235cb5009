//! Deterministic exposure-weighted erosion.

use glam::Vec3;
use log::debug;

use crate::error::SimulationError;
use crate::grid::{ExposureSnapshot, VoxelGrid};

/// Erodes every exposed voxel by `exposure * erosion_rate` each step.
#[derive(Debug, Clone, PartialEq)]
pub struct DeterministicErosion {
    erosion_rate: f32,
}

impl DeterministicErosion {
    pub fn new(erosion_rate: f32) -> Self {
        Self { erosion_rate }
    }

    pub fn erosion_rate(&self) -> f32 {
        self.erosion_rate
    }

    /// Applies one step and returns the mass removed.
    pub fn apply(
        &self,
        grid: &mut VoxelGrid,
        flow_unit: Vec3,
        reference_center: Vec3,
    ) -> Result<f64, SimulationError> {
        let snapshot = ExposureSnapshot::capture(grid, flow_unit, reference_center);

        let mut removed = 0.0f64;
        for (&idx, &exposure) in snapshot.exposed.iter().zip(&snapshot.exposure) {
            removed += grid.erode(idx, exposure * self.erosion_rate)? as f64;
        }

        debug!(
            "deterministic step: {} exposed voxels, density removed {:.6}",
            snapshot.exposed.len(),
            removed
        );
        Ok(removed * grid.voxel_resolution() as f64)
    }
}
