//! Per-voxel erosion maps and 2D projections of scalar voxel fields.

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::shapes::Axis;

/// Material lost per voxel between two density states, clipped at zero.
pub fn erosion_map(before: &[f32], after: &[f32]) -> Result<Vec<f32>, SimulationError> {
    if before.len() != after.len() {
        return Err(SimulationError::invalid(
            "density",
            format!("grid sizes differ: {} vs {}", before.len(), after.len()),
        ));
    }
    Ok(before
        .iter()
        .zip(after)
        .map(|(&b, &a)| (b - a).max(0.0))
        .collect())
}

/// How values are combined along the projection axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Column sum (e.g. remaining material thickness).
    #[default]
    Sum,
    /// Column maximum.
    Max,
}

/// Collapses an x-major voxel field along `axis` into a row-major 2D plane.
///
/// Returns `(width, height, values)`. The plane axes are the two remaining
/// grid axes in x, y, z order: projecting along z gives an `nx * ny` image.
pub fn project(
    field: &[f32],
    dims: [usize; 3],
    axis: Axis,
    mode: Projection,
) -> Result<(usize, usize, Vec<f32>), SimulationError> {
    let [nx, ny, nz] = dims;
    if field.len() != nx * ny * nz {
        return Err(SimulationError::invalid(
            "density",
            format!("expected {} values for {:?}, got {}", nx * ny * nz, dims, field.len()),
        ));
    }

    let (width, height) = match axis {
        Axis::X => (ny, nz),
        Axis::Y => (nx, nz),
        Axis::Z => (nx, ny),
    };
    let init = match mode {
        Projection::Sum => 0.0,
        Projection::Max => f32::NEG_INFINITY,
    };
    let mut plane = vec![init; width * height];

    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                let v = field[(x * ny + y) * nz + z];
                let (u, w) = match axis {
                    Axis::X => (y, z),
                    Axis::Y => (x, z),
                    Axis::Z => (x, y),
                };
                let p = &mut plane[w * width + u];
                match mode {
                    Projection::Sum => *p += v,
                    Projection::Max => *p = p.max(v),
                }
            }
        }
    }

    Ok((width, height, plane))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erosion_map_clips_gains() {
        let map = erosion_map(&[1.0, 0.5, 0.0], &[0.25, 0.75, 0.0]).unwrap();
        assert_eq!(map, vec![0.75, 0.0, 0.0]);
        assert!(erosion_map(&[1.0], &[1.0, 1.0]).is_err());
    }

    #[test]
    fn projection_along_z_sums_columns() {
        // 2 x 1 x 3 grid: x = 0 column holds 1, 2, 3; x = 1 column holds 4, 5, 6.
        let field = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let (w, h, plane) = project(&field, [2, 1, 3], Axis::Z, Projection::Sum).unwrap();
        assert_eq!((w, h), (2, 1));
        assert_eq!(plane, vec![6.0, 15.0]);

        let (_, _, plane) = project(&field, [2, 1, 3], Axis::Z, Projection::Max).unwrap();
        assert_eq!(plane, vec![3.0, 6.0]);
    }

    #[test]
    fn projection_along_x_keeps_y_and_z() {
        let field = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let (w, h, plane) = project(&field, [2, 1, 3], Axis::X, Projection::Sum).unwrap();
        assert_eq!((w, h), (1, 3));
        assert_eq!(plane, vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn projection_rejects_wrong_length() {
        assert!(project(&[1.0; 5], [2, 1, 3], Axis::Y, Projection::Sum).is_err());
    }
}
