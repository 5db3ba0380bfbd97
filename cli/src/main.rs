// strata-cli/src/main.rs

mod commands;
mod config;
mod errors;
mod logging;
mod manifest;
mod pipelines;

use crate::config::{parse_timeout, StrataConfig};
use crate::errors::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
  name = "strata",
  version,
  about = "Runs the DeFi security dataset pipeline and resolves its canonical datasets"
)]
struct Cli {
  #[command(subcommand)]
  command: Option<Commands>,

  // Used when no subcommand is given.
  #[command(flatten)]
  run: RunArgs,

  /// Log level (error, warn, info, debug, trace)
  #[arg(long, default_value = "info", global = true)]
  log_level: String,

  /// Root the dataset catalog is resolved against; stages run here
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,
}

#[derive(Args)]
struct RunArgs {
  /// Run only these stages (comma-separated), keeping pipeline order
  #[arg(long, value_delimiter = ',')]
  only: Vec<String>,
  /// Parent directory for per-run logs
  #[arg(long)]
  log_dir: Option<PathBuf>,
  /// Parent directory for per-run outputs
  #[arg(long)]
  output_dir: Option<PathBuf>,
  /// JSON stage manifest replacing the built-in pipeline
  #[arg(long)]
  manifest: Option<PathBuf>,
  /// Default per-stage timeout in seconds
  #[arg(long)]
  timeout: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the pipeline (the default)
  Run(RunArgs),
  /// Resolve one logical dataset to its canonical file
  Resolve {
    dataset: String,
    /// Refuse datasets that cannot join the panel
    #[arg(long)]
    panel: bool,
    /// Also write the selection as JSON to this file
    #[arg(long)]
    write: Option<PathBuf>,
  },
  /// Resolve every panel-joinable dataset
  Panel {
    #[arg(long)]
    write: Option<PathBuf>,
  },
  /// List the dataset catalog
  Catalog {
    #[arg(long)]
    json: bool,
  },
  /// List pipeline stages and collaborator availability
  Stages {
    #[arg(long)]
    manifest: Option<PathBuf>,
  },
}

#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  logging::init(&cli.log_level);

  match dispatch(cli).await {
    Ok(code) => ExitCode::from(code),
    Err(e) => {
      tracing::error!(error = %e, "Command failed.");
      eprintln!("error: {}", e);
      ExitCode::from(e.exit_code())
    }
  }
}

async fn dispatch(cli: Cli) -> Result<u8> {
  let mut config = StrataConfig::from_env()?;
  if let Some(data_dir) = cli.data_dir {
    config.data_dir = data_dir;
  }

  match cli.command {
    None => run(config, cli.run).await,
    Some(Commands::Run(args)) => run(config, args).await,
    Some(Commands::Resolve { dataset, panel, write }) => {
      commands::resolve::execute(&config, &dataset, panel, write.as_deref())?;
      Ok(0)
    }
    Some(Commands::Panel { write }) => {
      commands::panel::execute(&config, write.as_deref())?;
      Ok(0)
    }
    Some(Commands::Catalog { json }) => {
      commands::catalog::execute(json)?;
      Ok(0)
    }
    Some(Commands::Stages { manifest }) => {
      commands::stages::execute(&config, manifest.as_deref())?;
      Ok(0)
    }
  }
}

async fn run(mut config: StrataConfig, args: RunArgs) -> Result<u8> {
  if let Some(log_dir) = args.log_dir {
    config.log_dir = log_dir;
  }
  if let Some(output_dir) = args.output_dir {
    config.output_dir = output_dir;
  }
  if let Some(raw) = args.timeout.as_deref() {
    config.stage_timeout = Some(parse_timeout(raw)?);
  }
  commands::run::execute(&config, args.manifest.as_deref(), &args.only).await
}
