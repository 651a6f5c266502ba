mod cmd;
mod output;
mod prompts;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kiln_lib::consts::ENV_LOG;

use cmd::{BuildArgs, CleanArgs, ManifestArgs, PlanArgs, ResolveArgs};
use output::print_error;

/// kiln - incremental builds for native C/C++ projects
#[derive(Parser)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build every stale target of the active backend
  Build(BuildArgs),

  /// Show what a build would do without running anything
  Plan(PlanArgs),

  /// Resolve packages for the active backend and print what was found
  Resolve(ResolveArgs),

  /// List the backends declared in the build description
  Backends {
    #[command(flatten)]
    manifest: ManifestArgs,

    /// Print as JSON
    #[arg(long)]
    json: bool,
  },

  /// Remove every output recorded for the active backend
  Clean(CleanArgs),
}

fn init_tracing(verbose: u8) {
  let fallback = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(fallback));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);
  let verbose = cli.verbose > 0;

  let result = match cli.command {
    Commands::Build(args) => cmd::cmd_build(&args, verbose),
    Commands::Plan(args) => cmd::cmd_plan(&args, verbose),
    Commands::Resolve(args) => cmd::cmd_resolve(&args),
    Commands::Backends { manifest, json } => cmd::cmd_backends(&manifest, json),
    Commands::Clean(args) => cmd::cmd_clean(&args),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}
