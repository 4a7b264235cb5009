//! Erosion configuration.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::grid::normalize_flow;

/// Parameters only the stochastic model uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochasticParams {
    /// Standard deviation of the per-voxel erosion draw.
    pub erosion_std: f32,
    /// Fraction of exposed voxels eroded per step (0-1).
    pub erosion_fraction: f64,
    /// Seed for the model's random stream.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    42
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            erosion_std: 0.005,
            erosion_fraction: 0.2,
            seed: default_seed(),
        }
    }
}

/// Which erosion model to run, with its kind-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErosionKind {
    /// Every exposed voxel loses `exposure * erosion_rate` per step.
    Deterministic,
    /// A weighted random subset of exposed voxels loses `exposure * N(rate, std)`.
    Stochastic(StochasticParams),
}

impl ErosionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErosionKind::Deterministic => "deterministic",
            ErosionKind::Stochastic(_) => "stochastic",
        }
    }
}

/// Erosion parameters shared by both models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErosionConfig {
    /// Model selection (`type: deterministic | stochastic`).
    #[serde(flatten)]
    pub kind: ErosionKind,
    /// Direction of the incoming flow. Need not be normalized.
    pub flow_vector: [f32; 3],
    /// Erosion per unit exposure per step (mean of the draw for stochastic).
    pub erosion_rate: f32,
    /// Distance the exposure reference point sits upstream of the grid center.
    #[serde(alias = "water_source_height", default = "default_water_source_offset")]
    pub water_source_offset: f32,
}

fn default_water_source_offset() -> f32 {
    1.0
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self::deterministic([0.0, 0.0, -1.0], 0.01)
    }
}

impl ErosionConfig {
    /// Deterministic erosion along `flow_vector`.
    pub fn deterministic(flow_vector: [f32; 3], erosion_rate: f32) -> Self {
        Self {
            kind: ErosionKind::Deterministic,
            flow_vector,
            erosion_rate,
            water_source_offset: default_water_source_offset(),
        }
    }

    /// Stochastic erosion along `flow_vector`.
    pub fn stochastic(flow_vector: [f32; 3], erosion_rate: f32, params: StochasticParams) -> Self {
        Self {
            kind: ErosionKind::Stochastic(params),
            flow_vector,
            erosion_rate,
            water_source_offset: default_water_source_offset(),
        }
    }

    pub fn with_water_source_offset(mut self, offset: f32) -> Self {
        self.water_source_offset = offset;
        self
    }

    pub fn flow(&self) -> Vec3 {
        Vec3::from_array(self.flow_vector)
    }

    /// Checks every parameter, returning the first problem found.
    pub fn validate(&self) -> Result<(), SimulationError> {
        normalize_flow(self.flow())?;

        if !(self.erosion_rate.is_finite() && self.erosion_rate >= 0.0) {
            return Err(SimulationError::invalid(
                "erosion_rate",
                format!("must be >= 0, got {}", self.erosion_rate),
            ));
        }
        if !self.water_source_offset.is_finite() {
            return Err(SimulationError::invalid(
                "water_source_offset",
                format!("must be finite, got {}", self.water_source_offset),
            ));
        }

        if let ErosionKind::Stochastic(p) = &self.kind {
            if !(p.erosion_std.is_finite() && p.erosion_std >= 0.0) {
                return Err(SimulationError::invalid(
                    "erosion_std",
                    format!("must be >= 0, got {}", p.erosion_std),
                ));
            }
            if !(0.0..=1.0).contains(&p.erosion_fraction) {
                return Err(SimulationError::invalid(
                    "erosion_fraction",
                    format!("must be within [0, 1], got {}", p.erosion_fraction),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        ErosionConfig::default().validate().unwrap();
        ErosionConfig::stochastic([1.0, 0.0, 0.0], 0.1, StochasticParams::default())
            .validate()
            .unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let zero_flow = ErosionConfig::deterministic([0.0, 0.0, 0.0], 0.1);
        assert!(matches!(
            zero_flow.validate(),
            Err(SimulationError::InvalidConfiguration { field: "flow_vector", .. })
        ));

        let negative_rate = ErosionConfig::deterministic([0.0, 0.0, -1.0], -0.1);
        assert!(negative_rate.validate().is_err());

        let bad_offset = ErosionConfig::default().with_water_source_offset(f32::INFINITY);
        assert!(bad_offset.validate().is_err());

        let params = StochasticParams { erosion_fraction: 1.5, ..Default::default() };
        assert!(matches!(
            ErosionConfig::stochastic([0.0, 0.0, -1.0], 0.1, params).validate(),
            Err(SimulationError::InvalidConfiguration { field: "erosion_fraction", .. })
        ));

        let params = StochasticParams { erosion_std: -1.0, ..Default::default() };
        assert!(ErosionConfig::stochastic([0.0, 0.0, -1.0], 0.1, params).validate().is_err());
    }

    #[test]
    fn kind_names() {
        assert_eq!(ErosionKind::Deterministic.name(), "deterministic");
        assert_eq!(ErosionKind::Stochastic(StochasticParams::default()).name(), "stochastic");
    }
}
