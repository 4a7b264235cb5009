//! Export of simulation results for external viewers and analysis.
//!
//! Supports 16-bit PNG projections of voxel fields, RAW f32 density dumps,
//! and JSON mass histories.

mod png;
mod raw;
mod history;

pub use png::{
    export_field_png,
    export_grid_png,
    export_plane_png_f32,
    PngExportError,
    PngExportOptions,
};
pub use raw::{
    export_density_raw,
    export_grid_raw,
    export_snapshots_raw,
    expected_file_size,
    RawExportError,
};
pub use history::{export_mass_history_json, HistoryExportError};
