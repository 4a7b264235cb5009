//! voxerode CLI - voxel erosion simulator.
//!
//! Loads a YAML run configuration, erodes the configured body for the
//! requested number of steps and exports mass history and density maps.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

use voxerode::analysis::{erosion_map, MassSummary, Projection};
use voxerode::erosion::{ErosionConfig, ErosionKind, StochasticParams};
use voxerode::export::{
    export_field_png, export_grid_png, export_grid_raw, export_mass_history_json,
    export_snapshots_raw, PngExportOptions,
};
use voxerode::shapes::Axis;
use voxerode::simulation::{SimulationConfig, TimeIntegrator};

/// Voxel erosion simulator.
#[derive(Parser)]
#[command(name = "voxerode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a YAML configuration file.
    Run {
        /// Path to the run configuration (YAML).
        #[arg(short, long, default_value = "parameters.yaml")]
        config: PathBuf,

        /// Output directory for exported files.
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Override the number of steps.
        #[arg(long)]
        steps: Option<u32>,

        /// Override the reporting interval.
        #[arg(long)]
        log_interval: Option<u32>,

        /// Override the erosion model.
        #[arg(long)]
        model: Option<ModelArg>,

        /// Override the stochastic model seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Axis that density and erosion maps are projected along.
        #[arg(long, default_value = "z")]
        axis: AxisArg,

        /// Export a density projection of the final grid.
        #[arg(long)]
        density_map: bool,

        /// Export a projection of the material lost over the run.
        #[arg(long)]
        erosion_map: bool,

        /// Export the final grid as RAW f32.
        #[arg(long)]
        raw: bool,

        /// Keep and export RAW snapshots at every logged step.
        #[arg(long)]
        snapshots: bool,
    },

    /// Write a starter configuration file.
    InitConfig {
        /// Destination path.
        #[arg(short, long, default_value = "parameters.yaml")]
        output: PathBuf,

        /// Use the stochastic model instead of the deterministic one.
        #[arg(long)]
        stochastic: bool,
    },

    /// Validate a configuration and describe the initial state.
    Info {
        /// Path to the run configuration (YAML).
        #[arg(short, long, default_value = "parameters.yaml")]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Deterministic,
    Stochastic,
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
    X,
    Y,
    Z,
}

impl From<AxisArg> for Axis {
    fn from(a: AxisArg) -> Self {
        match a {
            AxisArg::X => Axis::X,
            AxisArg::Y => Axis::Y,
            AxisArg::Z => Axis::Z,
        }
    }
}

/// Command-line overrides applied on top of the loaded configuration.
struct RunOverrides {
    steps: Option<u32>,
    log_interval: Option<u32>,
    model: Option<ModelArg>,
    seed: Option<u64>,
}

impl RunOverrides {
    fn apply(&self, cfg: &mut SimulationConfig) {
        if let Some(steps) = self.steps {
            cfg.simulation.steps = steps;
        }
        if let Some(interval) = self.log_interval {
            cfg.simulation.log_interval = interval;
        }
        match (self.model, cfg.erosion_model.kind) {
            (Some(ModelArg::Deterministic), _) => {
                cfg.erosion_model.kind = ErosionKind::Deterministic;
            }
            (Some(ModelArg::Stochastic), ErosionKind::Deterministic) => {
                cfg.erosion_model.kind = ErosionKind::Stochastic(StochasticParams::default());
            }
            _ => {}
        }
        if let Some(seed) = self.seed {
            match &mut cfg.erosion_model.kind {
                ErosionKind::Stochastic(p) => p.seed = seed,
                ErosionKind::Deterministic => {
                    eprintln!("Warning: --seed ignored for the deterministic model");
                }
            }
        }
    }
}

/// Flags controlling what `run` writes to disk.
struct RunExports {
    axis: Axis,
    density_map: bool,
    erosion_map: bool,
    raw: bool,
    snapshots: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            steps,
            log_interval,
            model,
            seed,
            axis,
            density_map,
            erosion_map,
            raw,
            snapshots,
        } => {
            let exports = RunExports {
                axis: axis.into(),
                density_map,
                erosion_map,
                raw,
                snapshots,
            };
            let overrides = RunOverrides {
                steps,
                log_interval,
                model,
                seed,
            };
            run_simulation(&config, &output, &overrides, &exports);
        }
        Commands::InitConfig { output, stochastic } => {
            run_init_config(&output, stochastic);
        }
        Commands::Info { config } => {
            run_info(&config);
        }
    }
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("Error {}: {}", context, err);
    std::process::exit(1);
}

fn load_config(path: &Path) -> SimulationConfig {
    SimulationConfig::load(path).unwrap_or_else(|e| fail("loading configuration", e))
}

fn print_config_summary(cfg: &SimulationConfig) {
    let em = &cfg.erosion_model;
    println!("Body size (voxels): {:?}", cfg.body.size);
    println!("Geometry: {}", cfg.body.geometry.name());
    println!("Voxel resolution: {}", cfg.body.voxel_resolution);
    println!("Erosion model: {}", em.kind.name());
    println!("  Flow vector: {:?}", em.flow_vector);
    println!("  Erosion rate: {}", em.erosion_rate);
    println!("  Water source offset: {}", em.water_source_offset);
    if let ErosionKind::Stochastic(p) = &em.kind {
        println!("  Std dev: {}", p.erosion_std);
        println!("  Fraction of surface affected: {}", p.erosion_fraction);
        println!("  Seed: {}", p.seed);
    }
    println!("Steps: {}", cfg.simulation.steps);
    println!("Log interval: {}", cfg.simulation.log_interval);
}

fn run_simulation(
    config_path: &Path,
    output: &Path,
    overrides: &RunOverrides,
    exports: &RunExports,
) {
    let mut cfg = load_config(config_path);
    overrides.apply(&mut cfg);
    cfg.simulation.keep_snapshots |= exports.snapshots;

    println!("voxerode - Voxel Erosion Simulator");
    println!("==================================");
    print_config_summary(&cfg);
    println!("Output: {}", output.display());

    let start = Instant::now();

    let mut sim = TimeIntegrator::from_config(&cfg).unwrap_or_else(|e| fail("in configuration", e));
    let initial = sim.grid().densities().to_vec();
    println!(
        "\nInitial mass: {:.3} ({} active voxels)",
        sim.initial_mass(),
        sim.grid().active_voxel_count()
    );

    println!("Running {} steps...", cfg.simulation.steps);
    sim.run_with_callbacks(
        |report, grid| {
            println!(
                "  Step {:4}: Mass = {:.3} ({:.1}%), active voxels = {}",
                report.step,
                report.mass,
                report.mass_fraction * 100.0,
                grid.active_voxel_count()
            );
        },
        |_| true,
    )
    .unwrap_or_else(|e| fail("during simulation", e));

    println!("Simulation completed in {:.2?}", start.elapsed());

    if let Some(summary) = MassSummary::from_history(sim.mass_history()) {
        println!("\nInitial mass: {:.4}", summary.initial_mass);
        println!("Final mass: {:.4}", summary.final_mass);
        println!("Total loss: {:.4}", summary.total_loss);
        println!("Average loss per step: {:.6}", summary.avg_loss_per_step);
        match summary.half_mass_step {
            Some(step) => println!("Half mass reached at step: {}", step),
            None => println!("Half mass not reached"),
        }
    }

    let densities = sim.grid().densities();
    let min_d = densities.iter().copied().fold(f32::MAX, f32::min);
    let max_d = densities.iter().copied().fold(f32::MIN, f32::max);
    println!("Final grid density range: [{:.4}, {:.4}]", min_d, max_d);

    // Export
    println!("\nExporting results...");
    std::fs::create_dir_all(output).unwrap_or_else(|e| fail("creating output directory", e));
    let name = cfg.label();

    let history_path = output.join(format!("{}_mass.json", name));
    export_mass_history_json(sim.mass_history(), &name, &history_path)
        .unwrap_or_else(|e| fail("exporting mass history", e));
    println!("  Exported mass history: {}", history_path.display());

    let png_options = PngExportOptions {
        axis: exports.axis,
        projection: Projection::Sum,
        ..Default::default()
    };

    if exports.density_map {
        let path = output.join(format!("{}_density.png", name));
        export_grid_png(sim.grid(), &path, &png_options)
            .unwrap_or_else(|e| fail("exporting density map", e));
        println!("  Exported density map: {}", path.display());
    }

    if exports.erosion_map {
        let lost = erosion_map(&initial, sim.grid().densities())
            .unwrap_or_else(|e| fail("computing erosion map", e));
        let path = output.join(format!("{}_erosion.png", name));
        export_field_png(&lost, sim.grid().dims(), &path, &png_options)
            .unwrap_or_else(|e| fail("exporting erosion map", e));
        println!("  Exported erosion map: {}", path.display());
    }

    if exports.raw {
        let path = output.join(format!("{}_final.raw", name));
        export_grid_raw(sim.grid(), &path).unwrap_or_else(|e| fail("exporting RAW grid", e));
        println!("  Exported final grid (R32 float): {}", path.display());
    }

    if exports.snapshots {
        let dir = output.join(format!("{}_frames", name));
        let count = export_snapshots_raw(sim.snapshots(), &dir, &name)
            .unwrap_or_else(|e| fail("exporting snapshots", e));
        println!("  Exported {} snapshots: {}", count, dir.display());
    }

    println!("\nTotal time: {:.2?}", start.elapsed());
    println!("Done!");
}

fn run_init_config(output: &Path, stochastic: bool) {
    let mut cfg = SimulationConfig::default();
    if stochastic {
        cfg.erosion_model = ErosionConfig::stochastic(
            [0.0, 0.0, -1.0],
            0.05,
            StochasticParams {
                erosion_std: 0.02,
                erosion_fraction: 0.2,
                seed: 42,
            },
        );
    }

    cfg.save(output).unwrap_or_else(|e| fail("writing configuration", e));
    println!("Wrote {} configuration to {}", cfg.erosion_model.kind.name(), output.display());
}

fn run_info(config_path: &Path) {
    let cfg = load_config(config_path);
    let sim = TimeIntegrator::from_config(&cfg).unwrap_or_else(|e| fail("in configuration", e));
    let grid = sim.grid();
    let exposure = sim.exposure_snapshot();

    let voxels = grid.len() as u64;
    let bytes_density = voxels * 4;

    println!("voxerode - Configuration Info");
    println!("=============================");
    println!();
    print_config_summary(&cfg);
    println!();
    println!("Grid:");
    println!("  Total voxels:    {:>12}", voxels);
    println!("  Active voxels:   {:>12}", grid.active_voxel_count());
    println!("  Surface voxels:  {:>12}", exposure.surface_count());
    println!("  Exposed voxels:  {:>12}", exposure.exposed.len());
    println!("  Initial mass:    {:>12.3}", sim.initial_mass());
    println!();
    println!(
        "Reference center: [{:.3}, {:.3}, {:.3}]",
        exposure.center.x, exposure.center.y, exposure.center.z
    );
    println!(
        "Flow direction:   [{:.3}, {:.3}, {:.3}]",
        exposure.flow_unit.x, exposure.flow_unit.y, exposure.flow_unit.z
    );
    println!();
    println!("Memory usage (in-memory):");
    println!(
        "  Density:         {:>12} bytes ({:.2} MB)",
        bytes_density,
        bytes_density as f64 / 1024.0 / 1024.0
    );
    let snapshot_count = (cfg.simulation.steps / cfg.simulation.log_interval) as u64 + 2;
    let bytes_snapshots = snapshot_count * bytes_density;
    println!(
        "  Snapshots (max): {:>12} bytes ({:.2} MB) - {} grids",
        bytes_snapshots,
        bytes_snapshots as f64 / 1024.0 / 1024.0,
        snapshot_count
    );
}
