//! Voxel erosion of a solid body under a steady directional flow.
//!
//! A body is discretized into a dense density grid. Each step, surface voxels
//! facing the flow are eroded in proportion to their directional exposure,
//! either deterministically or by seeded weighted sampling, and the total
//! mass is recorded.

pub mod error;
pub mod grid;
pub mod shapes;
pub mod erosion;
pub mod simulation;
pub mod analysis;
pub mod export;

pub use error::SimulationError;
pub use grid::{ExposureSnapshot, VoxelGrid};
pub use shapes::{Axis, GeometryKind, ShapeOptions};
pub use erosion::{ErosionConfig, ErosionKind, ErosionModel, StochasticParams};
pub use simulation::{
    MassRecord, RunConfig, RunOutcome, SimulationConfig, SimulationState, StepReport,
    TimeIntegrator,
};
pub use analysis::MassSummary;
