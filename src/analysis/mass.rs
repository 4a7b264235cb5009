//! Mass-loss summary statistics.

use serde::{Deserialize, Serialize};

use crate::simulation::MassRecord;

/// Summary of a mass history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassSummary {
    pub initial_mass: f64,
    pub final_mass: f64,
    pub total_loss: f64,
    /// Mass lost per executed step.
    pub avg_loss_per_step: f64,
    /// First step at which mass is at or below half the initial mass.
    pub half_mass_step: Option<u32>,
}

impl MassSummary {
    /// Returns `None` for an empty history.
    pub fn from_history(history: &[MassRecord]) -> Option<Self> {
        let first = history.first()?;
        let last = history.last()?;
        let total_loss = first.mass - last.mass;
        let steps = last.step.saturating_sub(first.step);
        let avg_loss_per_step = if steps > 0 { total_loss / steps as f64 } else { 0.0 };
        let half = first.mass / 2.0;
        let half_mass_step = history.iter().find(|r| r.mass <= half).map(|r| r.step);

        Some(Self {
            initial_mass: first.mass,
            final_mass: last.mass,
            total_loss,
            avg_loss_per_step,
            half_mass_step,
        })
    }

    /// Fraction of the initial mass still present.
    pub fn remaining_fraction(&self) -> f64 {
        if self.initial_mass > 0.0 {
            self.final_mass / self.initial_mass
        } else {
            0.0
        }
    }
}
