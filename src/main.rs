use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{debug, info};
use nalgebra::{Matrix3, Vector3};
use spot_predict::geometry::axis_angle_matrix;
use spot_predict::reeke::ReekeIndexGenerator;
use spot_predict::Result;

#[derive(Parser)]
#[command(name = "spot-predict")]
#[command(about = "Reflection prediction for single-crystal diffraction scans")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate the reflections of one oscillation step for a cubic cell
    Generate {
        /// Cell edge in Angstrom
        #[arg(short, long, default_value = "50.0")]
        cell: f64,

        /// Resolution limit in Angstrom
        #[arg(short, long, default_value = "2.0")]
        dmin: f64,

        /// Oscillation step in degrees
        #[arg(short, long, default_value = "1.0")]
        oscillation: f64,

        /// Index margin around the computed limits
        #[arg(short, long, default_value = "1")]
        margin: i32,
    },
    /// Per-frame reflection counts over a multi-frame scan
    Sweep {
        /// Cell edge in Angstrom
        #[arg(short, long, default_value = "50.0")]
        cell: f64,

        /// Resolution limit in Angstrom
        #[arg(short, long, default_value = "2.0")]
        dmin: f64,

        /// Oscillation step in degrees
        #[arg(short, long, default_value = "1.0")]
        oscillation: f64,

        /// Number of frames
        #[arg(short, long, default_value = "10")]
        frames: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("Starting spot-predict v{}", spot_predict::VERSION);

    match cli.command {
        Commands::Generate {
            cell,
            dmin,
            oscillation,
            margin,
        } => generate(cell, dmin, oscillation, margin),
        Commands::Sweep {
            cell,
            dmin,
            oscillation,
            frames,
        } => sweep(cell, dmin, oscillation, frames),
    }
}

fn beamline() -> (Vector3<f64>, Vector3<f64>) {
    // 1 A beam along +z, rotation about +x
    (Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0))
}

fn generate(cell: f64, dmin: f64, oscillation: f64, margin: i32) -> Result<()> {
    let (s0, axis) = beamline();
    let ub_beg = Matrix3::identity() / cell;
    let ub_end = axis_angle_matrix(&axis, oscillation.to_radians()) * ub_beg;

    info!(
        "Generating indices for a {} A cubic cell to {} A over {} deg",
        cell, dmin, oscillation
    );
    let mut generator = ReekeIndexGenerator::new(&ub_beg, &ub_end, &axis, &s0, dmin, margin)?;
    let indices = generator.to_vec();
    for h in &indices {
        debug!("({}, {}, {})", h.x, h.y, h.z);
    }
    println!("{} indices generated", indices.len());
    Ok(())
}

fn sweep(cell: f64, dmin: f64, oscillation: f64, frames: usize) -> Result<()> {
    let (s0, axis) = beamline();
    let ub = Matrix3::identity() / cell;
    let step = oscillation.to_radians();

    info!("Sweeping {} frames of {} deg", frames, oscillation);
    let mut total = 0;
    for frame in 0..frames {
        let ub_beg = axis_angle_matrix(&axis, frame as f64 * step) * ub;
        let ub_end = axis_angle_matrix(&axis, (frame + 1) as f64 * step) * ub;
        let count = ReekeIndexGenerator::new(&ub_beg, &ub_end, &axis, &s0, dmin, 1)?.count();
        total += count;
        println!("frame {:>4}: {} indices", frame, count);
    }
    println!("{} indices over {} frames", total, frames);
    Ok(())
}
