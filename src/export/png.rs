//! PNG export of projected voxel fields.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Luma};
use thiserror::Error;

use crate::analysis::{project, Projection};
use crate::grid::VoxelGrid;
use crate::shapes::Axis;

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid value range: min ({0}) >= max ({1})")]
    InvalidRange(f32, f32),
    #[error("Data length {actual} does not match {width}x{height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },
    #[error("Projection failed: {0}")]
    Projection(#[from] crate::error::SimulationError),
}

/// Options for projected PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// Axis the field is collapsed along.
    pub axis: Axis,
    /// Column reduction.
    pub projection: Projection,
    /// Fixed value range; `None` uses the plane's own min/max.
    pub range: Option<(f32, f32)>,
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            axis: Axis::Z,
            projection: Projection::Sum,
            range: None,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

/// Min/max of a plane, widened so the range is never empty.
fn auto_range(values: &[f32]) -> (f32, f32) {
    let mut min_v = f32::MAX;
    let mut max_v = f32::MIN;
    for &v in values {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    let min_v = if min_v.is_finite() { min_v } else { 0.0 };
    let max_v = if max_v.is_finite() && max_v > min_v { max_v } else { min_v + 1e-6 };
    (min_v, max_v)
}

/// Writes a row-major scalar plane as a 16-bit grayscale PNG.
pub fn export_plane_png_f32(
    width: usize,
    height: usize,
    data: &[f32],
    path: &Path,
    min_value: f32,
    max_value: f32,
    compression: CompressionType,
    filter: FilterType,
) -> Result<(), PngExportError> {
    if min_value >= max_value {
        return Err(PngExportError::InvalidRange(min_value, max_value));
    }
    if data.len() != width * height {
        return Err(PngExportError::DimensionMismatch {
            width,
            height,
            actual: data.len(),
        });
    }

    let (w, h) = (width as u32, height as u32);
    let range = max_value - min_value;
    let mut img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = data[(y * w + x) as usize];
            let normalized = ((v - min_value) / range).clamp(0.0, 1.0);
            img.put_pixel(x, y, Luma([(normalized * 65535.0) as u16]));
        }
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, compression, filter);
    let byte_slice: &[u8] = bytemuck::cast_slice(img.as_raw());
    encoder.write_image(byte_slice, w, h, image::ExtendedColorType::L16)?;
    Ok(())
}

/// Projects an x-major voxel field along `options.axis` and writes it as PNG.
pub fn export_field_png(
    field: &[f32],
    dims: [usize; 3],
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    let (width, height, plane) = project(field, dims, options.axis, options.projection)?;
    let (min_v, max_v) = options.range.unwrap_or_else(|| auto_range(&plane));
    export_plane_png_f32(
        width,
        height,
        &plane,
        path,
        min_v,
        max_v,
        options.compression,
        options.filter,
    )
}

/// Exports the grid's density projection.
pub fn export_grid_png(
    grid: &VoxelGrid,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    export_field_png(grid.densities(), grid.dims(), path, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_grid_png() {
        let mut density = vec![1.0; 8 * 6 * 4];
        density[0] = 0.0;
        let grid = VoxelGrid::from_densities([8, 6, 4], 1.0, density).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("density.png");
        export_grid_png(&grid, &path, &PngExportOptions::default()).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[test]
    fn test_each_axis_has_matching_image_size() {
        let grid = VoxelGrid::from_densities([5, 3, 2], 1.0, vec![0.5; 30]).unwrap();
        let dir = tempdir().unwrap();
        for (axis, size) in [(Axis::X, (3, 2)), (Axis::Y, (5, 2)), (Axis::Z, (5, 3))] {
            let path = dir.path().join(format!("{:?}.png", axis));
            let options = PngExportOptions {
                axis,
                projection: Projection::Max,
                ..Default::default()
            };
            export_grid_png(&grid, &path, &options).unwrap();
            let img = image::open(&path).unwrap();
            assert_eq!((img.width(), img.height()), size);
        }
    }

    #[test]
    fn test_invalid_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let result = export_plane_png_f32(
            2,
            2,
            &[0.0; 4],
            &path,
            1.0,
            -1.0,
            CompressionType::Default,
            FilterType::Adaptive,
        );
        assert!(matches!(result, Err(PngExportError::InvalidRange(..))));
    }

    #[test]
    fn test_dimension_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        let result = export_plane_png_f32(
            3,
            2,
            &[0.0; 4],
            &path,
            0.0,
            1.0,
            CompressionType::Default,
            FilterType::Adaptive,
        );
        assert!(matches!(result, Err(PngExportError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_auto_range_never_empty() {
        assert_eq!(auto_range(&[2.0, 5.0]), (2.0, 5.0));
        let (lo, hi) = auto_range(&[3.0, 3.0]);
        assert!(hi > lo);
    }
}
