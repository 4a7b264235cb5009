//! Erosion models.
//!
//! Both models consume the grid's surface/exposure state for a fixed flow and
//! reference center and mutate densities in place. `ErosionModel` is the
//! tagged variant the integrator drives.

mod config;
mod deterministic;
mod stochastic;

pub use config::{ErosionConfig, ErosionKind, StochasticParams};
pub use deterministic::DeterministicErosion;
pub use stochastic::{selection_weights, weighted_sample_without_replacement, StochasticErosion};

use glam::Vec3;

use crate::error::SimulationError;
use crate::grid::{normalize_flow, VoxelGrid};

/// One erosion model instance, deterministic or stochastic.
#[derive(Debug, Clone)]
pub enum ErosionModel {
    Deterministic(DeterministicErosion),
    Stochastic(StochasticErosion),
}

impl ErosionModel {
    /// Validates `config` and builds the matching model.
    ///
    /// The stochastic variant seeds its generator here, once.
    pub fn from_config(config: &ErosionConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(match config.kind {
            ErosionKind::Deterministic => {
                ErosionModel::Deterministic(DeterministicErosion::new(config.erosion_rate))
            }
            ErosionKind::Stochastic(params) => {
                ErosionModel::Stochastic(StochasticErosion::new(config.erosion_rate, params)?)
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErosionModel::Deterministic(_) => "deterministic",
            ErosionModel::Stochastic(_) => "stochastic",
        }
    }

    /// Runs one erosion step and returns the mass actually removed.
    pub fn apply(
        &mut self,
        grid: &mut VoxelGrid,
        flow_vector: Vec3,
        reference_center: Vec3,
    ) -> Result<f64, SimulationError> {
        let flow_unit = normalize_flow(flow_vector)?;
        match self {
            ErosionModel::Deterministic(model) => model.apply(grid, flow_unit, reference_center),
            ErosionModel::Stochastic(model) => model.apply(grid, flow_unit, reference_center),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::shifted_center;

    #[test]
    fn from_config_picks_variant() {
        let det = ErosionModel::from_config(&ErosionConfig::default()).unwrap();
        assert_eq!(det.name(), "deterministic");

        let cfg = ErosionConfig::stochastic([0.0, 0.0, -1.0], 0.1, StochasticParams::default());
        let sto = ErosionModel::from_config(&cfg).unwrap();
        assert_eq!(sto.name(), "stochastic");
    }

    #[test]
    fn from_config_validates_eagerly() {
        let cfg = ErosionConfig::deterministic([0.0, 0.0, 0.0], 0.1);
        assert!(ErosionModel::from_config(&cfg).is_err());
    }

    #[test]
    fn apply_accepts_unnormalized_flow() {
        let mut grid = VoxelGrid::from_densities([3, 3, 3], 1.0, vec![1.0; 27]).unwrap();
        let flow = Vec3::new(0.0, 0.0, -5.0);
        let center = shifted_center(&grid, flow, 1000.0).unwrap();
        let mut model = ErosionModel::from_config(&ErosionConfig::deterministic([0.0, 0.0, -5.0], 1.0)).unwrap();
        let removed = model.apply(&mut grid, flow, center).unwrap();
        assert!((removed - 9.0).abs() < 1e-6);
        assert!(model.apply(&mut grid, Vec3::ZERO, center).is_err());
    }
}
