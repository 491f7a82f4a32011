mod config;
mod registry;

use clap::{Args, Parser, Subcommand};
use config::{ConfigError, OptionArgs};
use registry::{init_run_logging, start_run, RunContext};
use subsim_core::DATASET_VERSION;
use subsim_generate::{GenerationEngine, GenerationError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

#[derive(Parser, Debug)]
#[command(name = "subsim", version, about = "Synthetic subscription dataset generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a dataset into a new run directory.
    Generate(GenerateArgs),
    /// Resolve and validate settings, then print them as TOML.
    ValidateConfig(GenerateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    options: OptionArgs,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::ValidateConfig(args) => run_validate_config(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let options = args.options.resolve()?;
    options.validate()?;

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        dataset_version: DATASET_VERSION.to_string(),
        options: options.clone(),
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(event = "run_started", run_id = %run_id, seed = options.seed);

    let engine = GenerationEngine::new(options);
    let report = engine.run_in(&run_paths.run_dir, &run_id)?;

    tracing::info!(
        event = "run_finished",
        run_id = %run_id,
        duration_ms = report.duration_ms,
        bytes_written = report.bytes_written
    );

    println!("run_id={run_id}");
    println!("run_dir={}", run_paths.run_dir.display());
    println!("config={}", run_paths.config_path.display());
    for table in &report.tables {
        println!("{}={} rows", table.table, table.rows);
    }

    Ok(())
}

fn run_validate_config(args: GenerateArgs) -> Result<(), CliError> {
    let options = args.options.resolve()?;
    options.validate()?;
    print!("{}", toml::to_string_pretty(&options)?);
    Ok(())
}
