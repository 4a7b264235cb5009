//! Voxel grid representation and surface/exposure geometry.
//!
//! Surface detection (topological) and exposure weighting (directional) are
//! kept separate here and only combined inside the erosion models.

mod voxel;
mod exposure;

pub use voxel::{VoxelGrid, AXIS_NEIGHBORS, RESIDUAL_DENSITY};
pub use exposure::{
    exposure_field, exposure_value, flow_offset, normalize_flow, shifted_center,
    ExposureSnapshot, FLOW_EPSILON,
};
