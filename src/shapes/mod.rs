//! Parametric initial shapes.
//!
//! Each generator fills a grid with 1.0 inside the shape and 0.0 outside.
//! Voxel centers are mapped to `[-1, 1]` along every axis so shapes always
//! span the full grid.

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::grid::VoxelGrid;

/// Supported initial body shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    /// Solid block filling the grid.
    #[default]
    Cuboid,
    /// Ellipsoid inscribed in the grid.
    Ellipsoid,
    /// Axis-aligned cylinder inscribed in the grid.
    Cylinder,
    /// Superellipsoid: a block with softened edges and corners.
    RoundedCuboid,
}

impl GeometryKind {
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Cuboid => "cuboid",
            GeometryKind::Ellipsoid => "ellipsoid",
            GeometryKind::Cylinder => "cylinder",
            GeometryKind::RoundedCuboid => "rounded_cuboid",
        }
    }
}

/// Grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

impl Axis {
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Shape-specific knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeOptions {
    /// Cylinder axis.
    pub cylinder_axis: Axis,
    /// Superellipsoid exponent for `RoundedCuboid`; higher is boxier.
    pub roundness_exponent: f32,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            cylinder_axis: Axis::Z,
            roundness_exponent: 6.0,
        }
    }
}

/// Maps voxel `i` of `n` onto `[-1, 1]`. A single-voxel axis maps to 0.
#[inline]
fn unit_coord(i: usize, n: usize) -> f32 {
    if n <= 1 {
        0.0
    } else {
        -1.0 + 2.0 * i as f32 / (n - 1) as f32
    }
}

/// Generates a `{0, 1}` density field of `kind` in x-major order.
pub fn generate_shape(kind: GeometryKind, dims: [usize; 3], options: &ShapeOptions) -> Vec<f32> {
    let [nx, ny, nz] = dims;
    let mut out = Vec::with_capacity(nx * ny * nz);
    let e = options.roundness_exponent;
    let axis = options.cylinder_axis.index();

    for x in 0..nx {
        let u = unit_coord(x, nx);
        for y in 0..ny {
            let v = unit_coord(y, ny);
            for z in 0..nz {
                let w = unit_coord(z, nz);
                let inside = match kind {
                    GeometryKind::Cuboid => true,
                    GeometryKind::Ellipsoid => u * u + v * v + w * w <= 1.0,
                    GeometryKind::Cylinder => {
                        let p = [u, v, w];
                        let (a, b) = match axis {
                            0 => (p[1], p[2]),
                            1 => (p[0], p[2]),
                            _ => (p[0], p[1]),
                        };
                        a * a + b * b <= 1.0
                    }
                    GeometryKind::RoundedCuboid => {
                        u.abs().powf(e) + v.abs().powf(e) + w.abs().powf(e) <= 1.0
                    }
                };
                out.push(if inside { 1.0 } else { 0.0 });
            }
        }
    }

    out
}

/// Builds a ready-to-run grid holding the requested shape.
pub fn build_grid(
    kind: GeometryKind,
    dims: [usize; 3],
    voxel_resolution: f32,
    options: &ShapeOptions,
) -> Result<VoxelGrid, SimulationError> {
    if !(options.roundness_exponent.is_finite() && options.roundness_exponent > 0.0) {
        return Err(SimulationError::invalid(
            "roundness_exponent",
            format!("must be positive, got {}", options.roundness_exponent),
        ));
    }
    if dims.iter().any(|&d| d == 0) {
        return Err(SimulationError::invalid(
            "size",
            format!("all grid dimensions must be positive, got {:?}", dims),
        ));
    }
    VoxelGrid::from_densities(dims, voxel_resolution, generate_shape(kind, dims, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(field: &[f32]) -> usize {
        field.iter().filter(|&&d| d > 0.0).count()
    }

    #[test]
    fn cuboid_is_full() {
        let f = generate_shape(GeometryKind::Cuboid, [4, 3, 2], &ShapeOptions::default());
        assert_eq!(f.len(), 24);
        assert!(f.iter().all(|&d| d == 1.0));
    }

    #[test]
    fn ellipsoid_excludes_corners_and_keeps_center() {
        let dims = [9, 9, 9];
        let grid = build_grid(GeometryKind::Ellipsoid, dims, 1.0, &ShapeOptions::default()).unwrap();
        assert_eq!(grid.density(0, 0, 0), 0.0);
        assert_eq!(grid.density(8, 8, 8), 0.0);
        assert_eq!(grid.density(4, 4, 4), 1.0);
        // Axis tips lie exactly on the unit sphere.
        assert_eq!(grid.density(0, 4, 4), 1.0);
        let n = grid.active_voxel_count();
        assert!(n > 0 && n < 729);
    }

    #[test]
    fn cylinder_is_extruded_along_its_axis() {
        let dims = [7, 7, 5];
        let opts = ShapeOptions::default();
        let f = generate_shape(GeometryKind::Cylinder, dims, &opts);
        let grid = VoxelGrid::from_densities(dims, 1.0, f).unwrap();
        for z in 0..5 {
            assert_eq!(grid.density(3, 3, z), 1.0);
            assert_eq!(grid.density(0, 0, z), 0.0);
        }
        let layer = (0..7)
            .flat_map(|x| (0..7).map(move |y| (x, y)))
            .filter(|&(x, y)| grid.density(x, y, 0) > 0.0)
            .count();
        assert_eq!(grid.active_voxel_count(), layer * 5);

        let along_x = ShapeOptions { cylinder_axis: Axis::X, ..opts };
        let f = generate_shape(GeometryKind::Cylinder, dims, &along_x);
        let grid = VoxelGrid::from_densities(dims, 1.0, f).unwrap();
        for x in 0..7 {
            assert_eq!(grid.density(x, 3, 2), 1.0);
            assert_eq!(grid.density(x, 0, 0), 0.0);
        }
    }

    #[test]
    fn rounded_cuboid_sits_between_ellipsoid_and_cuboid() {
        let dims = [11, 11, 11];
        let opts = ShapeOptions::default();
        let rounded = count(&generate_shape(GeometryKind::RoundedCuboid, dims, &opts));
        let ellipsoid = count(&generate_shape(GeometryKind::Ellipsoid, dims, &opts));
        assert!(rounded > ellipsoid);
        assert!(rounded < 11 * 11 * 11);
    }

    #[test]
    fn single_voxel_axis_maps_to_center() {
        let f = generate_shape(GeometryKind::Ellipsoid, [1, 1, 1], &ShapeOptions::default());
        assert_eq!(f, vec![1.0]);
    }

    #[test]
    fn build_grid_validates_options() {
        let bad = ShapeOptions { roundness_exponent: 0.0, ..Default::default() };
        assert!(build_grid(GeometryKind::RoundedCuboid, [3, 3, 3], 1.0, &bad).is_err());
        assert!(build_grid(GeometryKind::Cuboid, [3, 0, 3], 1.0, &ShapeOptions::default()).is_err());
    }
}
