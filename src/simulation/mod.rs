//! Simulation driver: configuration record and the time integrator.

mod config;
mod integrator;

pub use config::{BodyConfig, ConfigError, RunConfig, SimulationConfig};
pub use integrator::{
    GridSnapshot, MassRecord, RunOutcome, SimulationState, StepReport, TimeIntegrator,
};
