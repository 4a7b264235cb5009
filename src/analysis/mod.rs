//! Post-run analysis of mass histories and density grids.

mod mass;
mod erosion_map;

pub use mass::MassSummary;
pub use erosion_map::{erosion_map, project, Projection};
