//! Stochastic exposure-biased erosion.
//!
//! Each step a fraction of the exposed voxels is drawn without replacement,
//! weighted by exposure, and each selected voxel loses
//! `exposure * max(0, N(mean, std))`. The random stream is owned by the model
//! and seeded once, so a fixed seed reproduces a run bit for bit.

use std::cmp::Ordering;

use glam::Vec3;
use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::erosion::StochasticParams;
use crate::error::SimulationError;
use crate::grid::{ExposureSnapshot, VoxelGrid};

/// Absorbs decimal-fraction rounding (`100 * 0.29 = 28.999...`) before flooring.
const SAMPLE_SIZE_TOLERANCE: f64 = 1e-9;

/// Weighted random erosion with a private seeded generator.
#[derive(Debug, Clone)]
pub struct StochasticErosion {
    mean: f32,
    params: StochasticParams,
    amount: Normal<f32>,
    rng: ChaCha8Rng,
}

impl StochasticErosion {
    /// Creates the model; `mean` is the configured erosion rate.
    pub fn new(mean: f32, params: StochasticParams) -> Result<Self, SimulationError> {
        let amount = Normal::new(mean, params.erosion_std).map_err(|e| {
            SimulationError::invalid("erosion_std", format!("bad normal distribution: {}", e))
        })?;

        Ok(Self {
            mean,
            params,
            amount,
            rng: ChaCha8Rng::seed_from_u64(params.seed),
        })
    }

    pub fn mean(&self) -> f32 {
        self.mean
    }

    pub fn params(&self) -> &StochasticParams {
        &self.params
    }

    /// Number of voxels eroded from `candidates` exposed voxels:
    /// `floor(candidates * erosion_fraction)`.
    pub fn sample_size(&self, candidates: usize) -> usize {
        let k = (candidates as f64 * self.params.erosion_fraction + SAMPLE_SIZE_TOLERANCE).floor();
        (k as usize).min(candidates)
    }

    /// Applies one step and returns the mass removed.
    pub fn apply(
        &mut self,
        grid: &mut VoxelGrid,
        flow_unit: Vec3,
        reference_center: Vec3,
    ) -> Result<f64, SimulationError> {
        let snapshot = ExposureSnapshot::capture(grid, flow_unit, reference_center);
        let k = self.sample_size(snapshot.exposed.len());
        if k == 0 {
            debug!(
                "stochastic step: {} exposed voxels, nothing selected",
                snapshot.exposed.len()
            );
            return Ok(0.0);
        }

        let weights = selection_weights(&snapshot.exposure);
        let selected = weighted_sample_without_replacement(&mut self.rng, &weights, k);

        let mut removed = 0.0f64;
        for &pick in &selected {
            let draw = self.amount.sample(&mut self.rng).max(0.0);
            let idx = snapshot.exposed[pick];
            removed += grid.erode(idx, snapshot.exposure[pick] * draw)? as f64;
        }

        debug!(
            "stochastic step: {} exposed voxels, {} selected, density removed {:.6}",
            snapshot.exposed.len(),
            selected.len(),
            removed
        );
        Ok(removed * grid.voxel_resolution() as f64)
    }
}

/// Normalized selection weights; uniform when every exposure is zero.
pub fn selection_weights(exposure: &[f32]) -> Vec<f64> {
    let total: f64 = exposure.iter().map(|&e| e as f64).sum();
    if total > 0.0 {
        exposure.iter().map(|&e| e as f64 / total).collect()
    } else {
        if !exposure.is_empty() {
            warn!(
                "all {} exposed voxels have zero exposure; sampling uniformly",
                exposure.len()
            );
        }
        let uniform = 1.0 / exposure.len().max(1) as f64;
        vec![uniform; exposure.len()]
    }
}

/// Draws `k` distinct positions from `weights` without replacement.
///
/// Uses exponential keys (`ln(u) / w`, largest first), which selects with the
/// same probabilities as sequential weighted draws. Zero-weight entries are
/// only chosen once every positive-weight entry is taken, in random order.
/// Positions are returned in selection order.
pub fn weighted_sample_without_replacement(
    rng: &mut ChaCha8Rng,
    weights: &[f64],
    k: usize,
) -> Vec<usize> {
    let mut keyed: Vec<(bool, f64, usize)> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            // (0, 1] so the logarithm stays finite.
            let u = 1.0 - rng.random::<f64>();
            if w > 0.0 {
                (true, u.ln() / w, i)
            } else {
                (false, u, i)
            }
        })
        .collect();

    keyed.sort_by(|a, b| match b.0.cmp(&a.0) {
        Ordering::Equal => b.1.total_cmp(&a.1),
        other => other,
    });

    keyed.into_iter().take(k).map(|(_, _, i)| i).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::shifted_center;

    const DOWN: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    fn block(dims: [usize; 3]) -> VoxelGrid {
        VoxelGrid::from_densities(dims, 1.0, vec![1.0; dims[0] * dims[1] * dims[2]]).unwrap()
    }

    fn params(std: f32, fraction: f64, seed: u64) -> StochasticParams {
        StochasticParams {
            erosion_std: std,
            erosion_fraction: fraction,
            seed,
        }
    }

    #[test]
    fn zero_fraction_is_a_no_op() {
        let mut grid = block([4, 4, 4]);
        let center = shifted_center(&grid, DOWN, 1.0).unwrap();
        let mut model = StochasticErosion::new(0.5, params(0.1, 0.0, 7)).unwrap();
        for _ in 0..5 {
            assert_eq!(model.apply(&mut grid, DOWN, center).unwrap(), 0.0);
        }
        assert_eq!(grid.mass(), 64.0);
    }

    #[test]
    fn small_fraction_rounds_down_to_nothing() {
        let model = StochasticErosion::new(0.5, params(0.1, 0.1, 7)).unwrap();
        assert_eq!(model.sample_size(9), 0);
        assert_eq!(model.sample_size(10), 1);
        assert_eq!(model.sample_size(99), 9);
    }

    #[test]
    fn sample_size_floors_decimal_fractions_exactly() {
        for (fraction, candidates, expected) in [
            (0.7, 10, 7),
            (0.9, 10, 9),
            (0.29, 100, 29),
            (0.35, 20, 7),
            (0.2, 15, 3),
            (0.5, 10, 5),
            (0.5, 9, 4),
            (0.25, 3, 0),
            (1.0, 37, 37),
        ] {
            let model = StochasticErosion::new(0.5, params(0.1, fraction, 7)).unwrap();
            assert_eq!(
                model.sample_size(candidates),
                expected,
                "fraction {} of {}",
                fraction,
                candidates
            );
        }
    }

    #[test]
    fn fraction_parses_from_yaml_without_losing_precision() {
        let cfg: crate::erosion::ErosionConfig = serde_yaml::from_str(
            "type: stochastic\nflow_vector: [0, 0, -1]\nerosion_rate: 0.1\nerosion_std: 0.0\nerosion_fraction: 0.7\n",
        )
        .unwrap();
        let crate::erosion::ErosionKind::Stochastic(p) = cfg.kind else {
            panic!("expected stochastic kind");
        };
        assert_eq!(p.erosion_fraction, 0.7);
        assert_eq!(StochasticErosion::new(0.1, p).unwrap().sample_size(10), 7);
    }

    #[test]
    fn full_fraction_without_noise_matches_deterministic() {
        use crate::erosion::DeterministicErosion;

        let mut a = block([5, 4, 3]);
        let mut b = a.clone();
        let center = shifted_center(&a, DOWN, 2.0).unwrap();

        let mut stochastic = StochasticErosion::new(0.07, params(0.0, 1.0, 3)).unwrap();
        let deterministic = DeterministicErosion::new(0.07);
        for _ in 0..4 {
            let ma = stochastic.apply(&mut a, DOWN, center).unwrap();
            let mb = deterministic.apply(&mut b, DOWN, center).unwrap();
            assert!((ma - mb).abs() < 1e-9);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn same_seed_reproduces_bit_for_bit() {
        let run = |seed| {
            let mut grid = block([6, 6, 6]);
            let center = shifted_center(&grid, DOWN, 1.0).unwrap();
            let mut model = StochasticErosion::new(0.3, params(0.2, 0.4, seed)).unwrap();
            let removed: Vec<f64> = (0..6)
                .map(|_| model.apply(&mut grid, DOWN, center).unwrap())
                .collect();
            (removed, grid)
        };

        let (r1, g1) = run(11);
        let (r2, g2) = run(11);
        assert_eq!(r1, r2);
        assert_eq!(g1, g2);

        let (_, g3) = run(12);
        assert_ne!(g1, g3);
    }

    #[test]
    fn densities_never_increase() {
        let mut grid = block([5, 5, 5]);
        let center = shifted_center(&grid, DOWN, 1.0).unwrap();
        // Wide spread makes negative draws common; they must contribute nothing.
        let mut model = StochasticErosion::new(0.0, params(1.0, 1.0, 5)).unwrap();
        let mut prev = grid.clone();
        for _ in 0..10 {
            let removed = model.apply(&mut grid, DOWN, center).unwrap();
            assert!(removed >= 0.0);
            for (after, before) in grid.densities().iter().zip(prev.densities()) {
                assert!(after <= before);
                assert!((0.0..=1.0).contains(after));
            }
            prev = grid.clone();
        }
    }

    #[test]
    fn zero_exposure_falls_back_to_uniform_without_eroding() {
        let mut grid = block([3, 3, 3]);
        // Reference point far downstream: every exposed voxel faces away.
        let center = shifted_center(&grid, DOWN, -100.0).unwrap();
        let mut model = StochasticErosion::new(0.5, params(0.0, 0.5, 1)).unwrap();
        let removed = model.apply(&mut grid, DOWN, center).unwrap();
        assert_eq!(removed, 0.0);
        assert_eq!(grid.mass(), 27.0);
    }

    #[test]
    fn selection_weights_normalize_or_fall_back() {
        let w = selection_weights(&[1.0, 3.0]);
        assert_eq!(w, vec![0.25, 0.75]);
        let w = selection_weights(&[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(w, vec![0.25; 4]);
        assert!(selection_weights(&[]).is_empty());
    }

    #[test]
    fn sample_is_distinct_and_prefers_positive_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let weights = [0.0, 0.5, 0.0, 0.5, 0.0];
        let picks = weighted_sample_without_replacement(&mut rng, &weights, 2);
        let mut sorted = picks.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 3]);

        let picks = weighted_sample_without_replacement(&mut rng, &weights, 5);
        let mut sorted = picks.clone();
        sorted.sort();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn heavier_weights_are_picked_more_often() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let weights = [0.9, 0.1];
        let first_heavy = (0..2000)
            .filter(|_| weighted_sample_without_replacement(&mut rng, &weights, 1)[0] == 0)
            .count();
        assert!(first_heavy > 1600, "heavy picked {} / 2000", first_heavy);
    }
}
