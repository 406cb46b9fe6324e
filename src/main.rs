//! GemmForge CLI - Build Planning for GPU GEMM Solver Extensions
//!
//! Resolves the extension build configuration and emits the plan the
//! native build orchestrator consumes.

use clap::Parser;
use gemmforge::config::{CliArgs, Commands, ForgeConfig};
use gemmforge::error::Result;
use gemmforge::plan::BuildPlan;
use gemmforge::staging::{ensure_build_dirs, rename_cpp_to_cu, stage_meta_tree};
use gemmforge::system::{compute_job_limit, JobPolicy, ResourceSnapshot};
use gemmforge::toolchain::{assemble_device_flags, validate_archs, HipToolchain};
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    // Parse CLI arguments
    let args = CliArgs::parse();

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = ForgeConfig::from_cli(&args)
        .map_err(gemmforge::error::GemmForgeError::ConfigError)?;

    match args.command.as_ref().unwrap_or(&Commands::Plan) {
        Commands::Plan => cmd_plan(&args, &config),
        Commands::Analyze => cmd_analyze(&config),
        Commands::Stage => cmd_stage(&args, &config),
        Commands::Flags => cmd_flags(&config),
    }
}

fn cmd_plan(args: &CliArgs, config: &ForgeConfig) -> Result<()> {
    let plan = BuildPlan::assemble(config)?;

    match &args.output {
        Some(path) => {
            plan.write_to(path)?;
            if !args.quiet {
                println!("Plan written to {}", path.display());
            }
        }
        None => println!("{}", plan.to_json()?),
    }

    if args.verbose > 0 {
        plan.print_summary();
    }

    Ok(())
}

fn cmd_analyze(config: &ForgeConfig) -> Result<()> {
    let snapshot = ResourceSnapshot::collect();
    snapshot.print_summary();

    let policy = JobPolicy::default();
    let jobs = compute_job_limit(config.requested_jobs, &snapshot, &policy)?;

    println!("\n=== Build Sizing ===");
    println!("Requested jobs: {}", config.requested_jobs);
    println!("CPU ceiling:    {}", policy.cpu_ceiling(&snapshot));
    println!("Memory ceiling: {}", policy.memory_ceiling(&snapshot));
    println!("Final jobs:     {}", jobs);

    match HipToolchain::detect() {
        Some(hip) => println!(
            "\nHIP toolchain:  {} at {}",
            hip.version,
            hip.root.display()
        ),
        None => println!("\nHIP toolchain:  not detected"),
    }

    Ok(())
}

fn cmd_stage(args: &CliArgs, config: &ForgeConfig) -> Result<()> {
    ensure_build_dirs(&config.build_dir)?;
    let renamed = rename_cpp_to_cu(
        std::slice::from_ref(&config.solver_src_dir),
        &config.build_dir,
    )?;
    let stats = stage_meta_tree(&config.root, &config.meta_dir)?;

    if !args.quiet {
        println!(
            "Staged {} files ({}) into {}",
            stats.files_staged,
            humansize::format_size(stats.bytes_staged, humansize::BINARY),
            config.meta_dir.display()
        );
        println!(
            "Renamed {} translation units into {}",
            renamed.len(),
            config.build_dir.display()
        );
    }

    Ok(())
}

fn cmd_flags(config: &ForgeConfig) -> Result<()> {
    validate_archs(&config.archs)?;

    let version = match config.toolkit_version {
        Some(version) => version,
        None => {
            HipToolchain::detect()
                .map(|hip| hip.version)
                .ok_or_else(|| {
                    gemmforge::error::GemmForgeError::config(
                        "toolkit version unknown: no HIP toolchain detected and no --toolkit-version given",
                    )
                })?
        }
    };

    for flag in assemble_device_flags(&config.archs, version) {
        println!("{}", flag);
    }

    Ok(())
}
