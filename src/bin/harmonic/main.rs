//! Harmonic CLI - harmonic weight maps from the command line.
//!
//! Usage: harmonic <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `harmonic --help` for available commands. Set `RUST_LOG=debug` for
//! pipeline diagnostics.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use harmonic::algo::colormap;
use harmonic::algo::harmonic::{harmonic_map_with_progress, AssemblyPreference, HarmonicOptions};
use harmonic::algo::laplacian::Normalization;
use harmonic::algo::selector::{select_boundaries, BoundaryPreset, DEFAULT_CONE_LENGTH, DEFAULT_STRIP_LENGTH};
use harmonic::algo::solver::{DenseLu, SolverKind, SparseLu};
use harmonic::algo::Progress;
use harmonic::io::{self, Format};
use harmonic::mesh::{RingSet, VertexFaceMap};

#[derive(Parser)]
#[command(name = "harmonic")]
#[command(author, version, about = "Harmonic weight maps on triangle meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Solve for harmonic weights
    Solve {
        /// Input mesh file
        input: PathBuf,

        /// Output file (.off/.ply mesh, or .txt/.csv weights)
        output: PathBuf,

        /// How pinned vertices are chosen
        #[arg(short, long, value_enum, default_value = "strip")]
        preset: PresetKind,

        /// Band width of the preset (default depends on the preset)
        #[arg(short, long)]
        length: Option<f64>,

        /// Topology used to assemble the Laplacian
        #[arg(short, long, value_enum, default_value = "rings")]
        assembly: AssemblyKind,

        /// Linear solver
        #[arg(short, long, value_enum, default_value = "sparse")]
        solver: SolverChoice,

        /// Scale rows by the inverse mixed Voronoi area
        #[arg(long)]
        normalize: bool,

        /// How weights are rendered into a mesh output
        #[arg(short, long, value_enum, default_value = "heat")]
        view: ViewMode,

        /// Draw iso-lines at multiples of 1/SCALE instead of a heat map
        #[arg(long)]
        levels: Option<f64>,

        /// Height of the deformation for `--view deform`
        #[arg(long, default_value = "0.5")]
        height: f64,

        /// Use sequential processing (disable parallelism)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetKind {
    /// Ramp between bottom and top bands
    Strip,
    /// Sides pinned low, central disc pinned high
    Cone,
}

#[derive(Clone, Copy, ValueEnum)]
enum AssemblyKind {
    /// Ordered vertex rings
    Rings,
    /// Triangle edges
    Triangles,
}

#[derive(Clone, Copy, ValueEnum)]
enum SolverChoice {
    /// Sparse LU with RCM ordering
    Sparse,
    /// Dense LU
    Dense,
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewMode {
    /// Color vertices by weight
    Heat,
    /// Lift vertices along z by weight, shaded by normal
    Deform,
    /// Write the mesh unchanged
    None,
}

fn main() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&directives))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log filter from `RUST_LOG`-style directives, warnings only when none are given.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Solve {
            input,
            output,
            preset,
            length,
            assembly,
            solver,
            normalize,
            view,
            levels,
            height,
            sequential,
        } => {
            let preset = match preset {
                PresetKind::Strip => BoundaryPreset::Strip {
                    length: length.unwrap_or(DEFAULT_STRIP_LENGTH),
                },
                PresetKind::Cone => BoundaryPreset::Cone {
                    length: length.unwrap_or(DEFAULT_CONE_LENGTH),
                },
            };

            let mut options = HarmonicOptions::default()
                .with_assembly(match assembly {
                    AssemblyKind::Rings => AssemblyPreference::Rings,
                    AssemblyKind::Triangles => AssemblyPreference::Triangles,
                })
                .with_solver(match solver {
                    SolverChoice::Sparse => SolverKind::SparseLu(SparseLu::default()),
                    SolverChoice::Dense => SolverKind::DenseLu(DenseLu::default()),
                })
                .with_parallel(!sequential);
            if normalize {
                options = options.with_normalization(Normalization::MixedVoronoi);
            }

            cmd_solve(&input, &output, &preset, &options, view, levels, height)?;
        }
    }

    Ok(())
}

/// Create a progress callback that prints to stderr.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Monotonic: stages never move the bar backwards
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (raw_percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {:<24}", bar, space, raw_percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Triangles: {}", mesh.num_triangles());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    let faces = VertexFaceMap::build(&mesh);
    let rings = RingSet::build(&mesh, &faces, &Default::default());

    let boundary = rings.boundary_vertices();
    if boundary.is_empty() {
        println!("Topology: Closed (no boundary)");
    } else {
        println!("Topology: Open ({} boundary vertices)", boundary.len());
    }

    let non_manifold = rings.non_manifold_vertices();
    if non_manifold.is_empty() {
        println!("Manifold: yes");
    } else {
        println!("Manifold: no ({} non-manifold vertices)", non_manifold.len());
    }

    let disconnected = faces.disconnected_vertices();
    if !disconnected.is_empty() {
        println!("Disconnected vertices: {}", disconnected.len());
    }

    Ok(())
}

fn cmd_solve(
    input: &Path,
    output: &Path,
    preset: &BoundaryPreset,
    options: &HarmonicOptions,
    view: ViewMode,
    levels: Option<f64>,
    height: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = io::load(input)?;
    println!("Loaded: {} vertices, {} triangles", mesh.num_vertices(), mesh.num_triangles());

    let pins = select_boundaries(&mesh, preset)?;
    println!("Pinned: {} vertices", pins.len());

    let start = Instant::now();
    let progress = create_progress();
    let result = harmonic_map_with_progress(&mesh, &pins, options, &progress)?;
    progress.report(1, 1, "done");
    let elapsed = start.elapsed();

    if !result.non_manifold_vertices.is_empty() {
        println!("Warning: {} non-manifold vertices", result.non_manifold_vertices.len());
    }
    if let Some((lo, hi)) = result.weights.range() {
        println!("Weights: [{:.6}, {:.6}]", lo, hi);
    }

    let is_weight_file = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "txt" | "csv"))
        .unwrap_or(false);

    if is_weight_file {
        io::save_weights(&result.weights, output)?;
    } else {
        match view {
            ViewMode::Heat => {
                let colors: Vec<[u8; 3]> = colormap::weight_colors(&result.weights, levels)
                    .into_iter()
                    .map(colormap::to_rgb8)
                    .collect();
                io::save_with_colors(&mesh, &colors, output)?;
            }
            ViewMode::Deform => {
                let deformed = colormap::deform_along_z(&mesh, &result.weights, height)?;
                if Format::from_path(output).is_some_and(Format::supports_colors) {
                    let normals = colormap::vertex_normals(&deformed);
                    let colors: Vec<[u8; 3]> = colormap::normal_colors(&normals)
                        .into_iter()
                        .map(colormap::to_rgb8)
                        .collect();
                    io::save_with_colors(&deformed, &colors, output)?;
                } else {
                    io::save(&deformed, output)?;
                }
            }
            ViewMode::None => {
                io::save(&mesh, output)?;
            }
        }
    }

    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}
