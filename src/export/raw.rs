//! RAW density dumps for external volume viewers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::grid::VoxelGrid;
use crate::simulation::GridSnapshot;

/// Errors that can occur during RAW export.
#[derive(Error, Debug)]
pub enum RawExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes densities as 32-bit little-endian floats in x-major order.
pub fn export_density_raw(density: &[f32], path: &Path) -> Result<(), RawExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for &d in density {
        writer.write_all(&d.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Exports the current grid state.
pub fn export_grid_raw(grid: &VoxelGrid, path: &Path) -> Result<(), RawExportError> {
    export_density_raw(grid.densities(), path)
}

/// Exports every snapshot as `{base_name}_step{NNNNN}.raw` into `output_dir`.
pub fn export_snapshots_raw(
    snapshots: &[GridSnapshot],
    output_dir: &Path,
    base_name: &str,
) -> Result<usize, RawExportError> {
    std::fs::create_dir_all(output_dir)?;

    for snapshot in snapshots {
        let filename = format!("{}_step{:05}.raw", base_name, snapshot.step);
        export_density_raw(&snapshot.density, &output_dir.join(filename))?;
    }

    Ok(snapshots.len())
}

/// Expected byte size of a RAW dump for `dims`.
pub fn expected_file_size(dims: [usize; 3]) -> u64 {
    (dims[0] * dims[1] * dims[2]) as u64 * 4
}
