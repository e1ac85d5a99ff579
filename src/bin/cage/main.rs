//! Cage CLI - control mesh inspection tool.
//!
//! Usage: cage <COMMAND> <INPUT>
//!
//! Run `cage --help` for available commands.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};

use cage::diagnostics::{self, Mode};
use cage::io;
use cage::render::RenderIndices;

#[derive(Parser)]
#[command(name = "cage")]
#[command(author, version, about = "Control mesh inspection CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Collect and print operation timings
    #[arg(long, global = true)]
    timings: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh statistics
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Recompute vertex normals before reporting
        #[arg(long)]
        normals: bool,
    },

    /// Check every structural invariant and report violations
    Validate {
        /// Input mesh file
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    diagnostics::enable(if cli.timings {
        Mode::ErrorsAndTiming
    } else {
        Mode::ErrorsOnly
    });

    let result = match cli.command {
        Commands::Info { input, normals } => cmd_info(&input, normals),
        Commands::Validate { input } => cmd_validate(&input),
    };

    if cli.timings {
        println!("\nTimings:\n{}", diagnostics::timing_summary());
    }

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_info(input: &PathBuf, normals: bool) -> cage::error::Result<ExitCode> {
    let start = Instant::now();
    let mut mesh = io::load(input)?;
    let load_ms = start.elapsed().as_secs_f64() * 1e3;

    if normals {
        mesh.compute_normals();
    }

    let start = Instant::now();
    mesh.build_cache();
    let cache_ms = start.elapsed().as_secs_f64() * 1e3;

    let indices = RenderIndices::build(&mut mesh);

    println!("{}", input.display());
    println!("  vertices:     {}", mesh.num_vertices());
    println!("  half-edges:   {}", mesh.num_half_edges());
    println!("  edges:        {}", mesh.num_edges());
    println!("  faces:        {}", mesh.num_faces());
    println!(
        "  boundary:     {} vertices, {} edges",
        mesh.cache().num_boundary_vertices(),
        mesh.cache().num_boundary_edges()
    );
    println!("  triangles:    {}", indices.triangle_count());
    println!("  wire lines:   {}", indices.segment_count());
    println!(
        "  memory:       {} bytes mesh, {} bytes indices",
        mesh.memory_usage(),
        indices.memory_usage()
    );
    println!(
        "  buffers:      {} B positions, {} B normals, {} B uvs, {} B one-rings",
        mesh.positions_bytes().len(),
        mesh.normals_bytes().len(),
        mesh.uvs_bytes().len(),
        mesh.one_rings_bytes().len()
    );
    println!("  load: {load_ms:.2} ms, cache: {cache_ms:.2} ms");

    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(input: &PathBuf) -> cage::error::Result<ExitCode> {
    let mesh = io::load(input)?;
    let valid = mesh.validate();

    if valid {
        println!("{}: OK", input.display());
        if diagnostics::has_warnings() {
            println!("{}", diagnostics::error_summary());
        }
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{}: INVALID", input.display());
        println!("{}", diagnostics::error_summary());
        Ok(ExitCode::FAILURE)
    }
}
