//! Step loop driving an erosion model over one voxel grid.

use glam::Vec3;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::config::{RunConfig, SimulationConfig};
use crate::erosion::{ErosionConfig, ErosionModel};
use crate::error::SimulationError;
use crate::grid::{normalize_flow, shifted_center, ExposureSnapshot, VoxelGrid};
use crate::shapes::build_grid;

/// One `(step, mass)` entry of the mass history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassRecord {
    pub step: u32,
    pub mass: f64,
}

/// Progress report for a completed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Step number, starting at 1.
    pub step: u32,
    /// Mass after the step.
    pub mass: f64,
    /// `mass / initial_mass` (0.0 for an empty body).
    pub mass_fraction: f64,
    /// Mass removed by this step.
    pub mass_removed: f64,
}

/// Density copy taken at a step boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSnapshot {
    pub step: u32,
    pub density: Vec<f32>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All configured steps executed.
    Completed,
    /// The caller asked to stop; `steps_done` steps executed.
    Cancelled { steps_done: u32 },
}

/// Live state of a run: the grid, the step counter and the mass history.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub grid: VoxelGrid,
    pub step: u32,
    pub mass_history: Vec<MassRecord>,
}

/// Owns the grid for the duration of a run and advances it step by step.
///
/// The reference center is computed once from the initial grid; the flow
/// never changes during a run.
#[derive(Debug, Clone)]
pub struct TimeIntegrator {
    state: SimulationState,
    model: ErosionModel,
    flow_vector: Vec3,
    flow_unit: Vec3,
    reference_center: Vec3,
    initial_mass: f64,
    steps: u32,
    log_interval: u32,
    keep_snapshots: bool,
    snapshots: Vec<GridSnapshot>,
}

impl TimeIntegrator {
    /// Creates an integrator over an existing grid.
    ///
    /// All parameters are validated here; no step runs on invalid input.
    pub fn new(
        grid: VoxelGrid,
        erosion: &ErosionConfig,
        run: &RunConfig,
    ) -> Result<Self, SimulationError> {
        if run.steps == 0 {
            return Err(SimulationError::invalid("steps", "must be at least 1"));
        }
        if run.log_interval == 0 {
            return Err(SimulationError::invalid("log_interval", "must be at least 1"));
        }

        let model = ErosionModel::from_config(erosion)?;
        let flow_vector = erosion.flow();
        let flow_unit = normalize_flow(flow_vector)?;
        let reference_center = shifted_center(&grid, flow_vector, erosion.water_source_offset)?;
        let initial_mass = grid.mass();

        let snapshots = if run.keep_snapshots {
            vec![GridSnapshot {
                step: 0,
                density: grid.densities().to_vec(),
            }]
        } else {
            Vec::new()
        };

        Ok(Self {
            state: SimulationState {
                grid,
                step: 0,
                mass_history: vec![MassRecord {
                    step: 0,
                    mass: initial_mass,
                }],
            },
            model,
            flow_vector,
            flow_unit,
            reference_center,
            initial_mass,
            steps: run.steps,
            log_interval: run.log_interval,
            keep_snapshots: run.keep_snapshots,
            snapshots,
        })
    }

    /// Validates `config`, generates the initial shape and wraps it.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let body = &config.body;
        let grid = build_grid(body.geometry, body.size, body.voxel_resolution, &body.shape_options())?;
        Self::new(grid, &config.erosion_model, &config.simulation)
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn into_state(self) -> SimulationState {
        self.state
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.state.grid
    }

    pub fn mass_history(&self) -> &[MassRecord] {
        &self.state.mass_history
    }

    pub fn snapshots(&self) -> &[GridSnapshot] {
        &self.snapshots
    }

    pub fn model(&self) -> &ErosionModel {
        &self.model
    }

    pub fn reference_center(&self) -> Vec3 {
        self.reference_center
    }

    pub fn flow_unit(&self) -> Vec3 {
        self.flow_unit
    }

    pub fn initial_mass(&self) -> f64 {
        self.initial_mass
    }

    pub fn current_step(&self) -> u32 {
        self.state.step
    }

    pub fn total_steps(&self) -> u32 {
        self.steps
    }

    pub fn is_finished(&self) -> bool {
        self.state.step >= self.steps
    }

    /// Surface/exposure state of the current grid for this run's flow.
    pub fn exposure_snapshot(&self) -> ExposureSnapshot {
        ExposureSnapshot::capture(&self.state.grid, self.flow_unit, self.reference_center)
    }

    /// True if `step` is a reporting step.
    pub fn is_log_step(&self, step: u32) -> bool {
        step % self.log_interval == 0
    }

    fn mass_fraction(&self, mass: f64) -> f64 {
        if self.initial_mass > 0.0 {
            mass / self.initial_mass
        } else {
            0.0
        }
    }

    /// Executes one step. Returns `None` once every configured step has run.
    pub fn step(&mut self) -> Result<Option<StepReport>, SimulationError> {
        if self.is_finished() {
            return Ok(None);
        }

        let mass_before = self.state.grid.mass();
        let mass_removed =
            self.model
                .apply(&mut self.state.grid, self.flow_vector, self.reference_center)?;
        let mass = self.state.grid.mass();

        if mass > mass_before {
            return Err(SimulationError::InvariantViolation(format!(
                "mass increased from {} to {} at step {}",
                mass_before,
                mass,
                self.state.step + 1
            )));
        }

        self.state.step += 1;
        let step = self.state.step;
        self.state.mass_history.push(MassRecord { step, mass });

        if self.keep_snapshots && (self.is_log_step(step) || step == self.steps) {
            self.snapshots.push(GridSnapshot {
                step,
                density: self.state.grid.densities().to_vec(),
            });
        }

        debug!("step {}: mass {:.6} (removed {:.6})", step, mass, mass_removed);
        Ok(Some(StepReport {
            step,
            mass,
            mass_fraction: self.mass_fraction(mass),
            mass_removed,
        }))
    }

    /// Runs every remaining step, logging reports at the configured interval.
    pub fn run(&mut self) -> Result<&SimulationState, SimulationError> {
        self.run_with_callbacks(
            |report, _grid| {
                info!(
                    "Step {:4}: mass = {:.3} ({:.1}% remaining)",
                    report.step,
                    report.mass,
                    report.mass_fraction * 100.0
                );
            },
            |_| true,
        )?;
        Ok(&self.state)
    }

    /// Runs the remaining steps with caller hooks.
    ///
    /// * `on_log` - called after every `log_interval`-th step with the report and grid
    /// * `keep_running` - polled before each step with the number of completed steps;
    ///   returning `false` stops the run at that step boundary
    pub fn run_with_callbacks<F1, F2>(
        &mut self,
        mut on_log: F1,
        mut keep_running: F2,
    ) -> Result<RunOutcome, SimulationError>
    where
        F1: FnMut(&StepReport, &VoxelGrid),
        F2: FnMut(u32) -> bool,
    {
        info!(
            "running {} erosion for {} steps (initial mass {:.3})",
            self.model.name(),
            self.steps - self.state.step,
            self.initial_mass
        );

        while !self.is_finished() {
            if !keep_running(self.state.step) {
                info!("run cancelled after {} steps", self.state.step);
                return Ok(RunOutcome::Cancelled {
                    steps_done: self.state.step,
                });
            }

            if let Some(report) = self.step()? {
                if self.is_log_step(report.step) {
                    on_log(&report, &self.state.grid);
                }
            }
        }

        info!(
            "run finished: final mass {:.3} of {:.3}",
            self.state.grid.mass(),
            self.initial_mass
        );
        Ok(RunOutcome::Completed)
    }
}
