//! Run configuration record and its file formats.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::erosion::ErosionConfig;
use crate::error::SimulationError;
use crate::shapes::{Axis, GeometryKind, ShapeOptions};

/// Errors from loading or saving a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] SimulationError),
}

/// Eroded body: grid size, voxel scale and initial shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Grid dimensions `[nx, ny, nz]` in voxels.
    pub size: [usize; 3],
    /// Volume represented by one voxel (mass units).
    pub voxel_resolution: f32,
    /// Initial shape.
    #[serde(default)]
    pub geometry: GeometryKind,
    /// Axis for `cylinder` geometry.
    #[serde(default)]
    pub cylinder_axis: Axis,
    /// Superellipsoid exponent for `rounded_cuboid` geometry.
    #[serde(default = "default_roundness_exponent")]
    pub roundness_exponent: f32,
}

fn default_roundness_exponent() -> f32 {
    ShapeOptions::default().roundness_exponent
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            size: [30, 30, 10],
            voxel_resolution: 1.0,
            geometry: GeometryKind::Cuboid,
            cylinder_axis: Axis::Z,
            roundness_exponent: default_roundness_exponent(),
        }
    }
}

impl BodyConfig {
    pub fn shape_options(&self) -> ShapeOptions {
        ShapeOptions {
            cylinder_axis: self.cylinder_axis,
            roundness_exponent: self.roundness_exponent,
        }
    }
}

/// Step loop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of erosion steps.
    pub steps: u32,
    /// Report every `log_interval` steps.
    pub log_interval: u32,
    /// Keep density copies at logged steps (plus first and last).
    #[serde(default)]
    pub keep_snapshots: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 100,
            log_interval: 10,
            keep_snapshots: false,
        }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(alias = "soap")]
    pub body: BodyConfig,
    pub erosion_model: ErosionConfig,
    pub simulation: RunConfig,
}

impl SimulationConfig {
    /// Checks every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let body = &self.body;
        if body.size.iter().any(|&d| d == 0) {
            return Err(SimulationError::invalid(
                "size",
                format!("all grid dimensions must be positive, got {:?}", body.size),
            ));
        }
        if !(body.voxel_resolution.is_finite() && body.voxel_resolution > 0.0) {
            return Err(SimulationError::invalid(
                "voxel_resolution",
                format!("must be positive, got {}", body.voxel_resolution),
            ));
        }
        if !(body.roundness_exponent.is_finite() && body.roundness_exponent > 0.0) {
            return Err(SimulationError::invalid(
                "roundness_exponent",
                format!("must be positive, got {}", body.roundness_exponent),
            ));
        }

        self.erosion_model.validate()?;

        if self.simulation.steps == 0 {
            return Err(SimulationError::invalid("steps", "must be at least 1"));
        }
        if self.simulation.log_interval == 0 {
            return Err(SimulationError::invalid("log_interval", "must be at least 1"));
        }
        Ok(())
    }

    /// Loads and validates a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Saves as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path.as_ref(), self.to_yaml()?)?;
        Ok(())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Short run label usable in file names,
    /// e.g. `stochastic_cuboid_v-0_0_-1_r-0.05_w-1`.
    pub fn label(&self) -> String {
        let em = &self.erosion_model;
        let flow = em
            .flow_vector
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("_");
        format!(
            "{}_{}_v-{}_r-{}_w-{}",
            em.kind.name(),
            self.body.geometry.name(),
            flow,
            em.erosion_rate,
            em.water_source_offset
        )
    }
}
