mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use drvpipe_lib::consts::CONFIG_FILENAME;
use drvpipe_lib::platform::Platform;
use drvpipe_lib::shell::Shell;

use crate::output::OutputFormat;

/// Declarative multi-platform package builds
#[derive(Parser)]
#[command(name = "drvpipe")]
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
  /// Build, augment and publish the default output
  Build {
    /// Path to the configuration file
    #[arg(default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// Platform to build (repeatable, defaults to the host)
    #[arg(short, long = "platform", conflicts_with = "all")]
    platforms: Vec<Platform>,

    /// Build every platform the configuration lists
    #[arg(long)]
    all: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Evaluate outputs without building anything
  Show {
    /// Path to the configuration file
    #[arg(default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// Platform to evaluate (repeatable, defaults to the host)
    #[arg(short, long = "platform", conflicts_with = "all")]
    platforms: Vec<Platform>,

    /// Evaluate every platform the configuration lists
    #[arg(long)]
    all: bool,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Enter the development environment
  Develop {
    /// Path to the configuration file
    #[arg(default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// Shell to spawn or render for (detected from $SHELL if not specified)
    #[arg(short, long)]
    shell: Option<Shell>,

    /// Print the activation script instead of spawning a shell
    #[arg(long)]
    print: bool,

    /// Platform whose package set to use (defaults to the host)
    #[arg(short, long)]
    platform: Option<Platform>,
  },

  /// Recheck published outputs against their completion markers
  Verify {
    /// Output directories or hashes (defaults to everything in the store)
    outputs: Vec<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show platform and store information
  Info,

  /// Generate shell completions for drvpipe
  Completions {
    /// Shell to generate completions for
    shell: clap_complete::Shell,
  },
}

fn main() {
  // COMPLETE=<shell> prints this binary's own completion script.
  if cmd::completions::complete_from_env() {
    return;
  }

  let cli = Cli::parse();
  init_tracing(cli.verbose);

  if let Err(e) = run(cli) {
    output::print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}

fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .without_time()
    .with_writer(std::io::stderr)
    .init();
}

fn run(cli: Cli) -> Result<()> {
  match cli.command {
    Commands::Build {
      config,
      platforms,
      all,
      output,
    } => cmd::cmd_build(&config, &platforms, all, output),
    Commands::Show {
      config,
      platforms,
      all,
      output,
    } => cmd::cmd_show(&config, &platforms, all, output),
    Commands::Develop {
      config,
      shell,
      print,
      platform,
    } => cmd::cmd_develop(&config, shell, print, platform),
    Commands::Verify { outputs, output } => cmd::cmd_verify(&outputs, output),
    Commands::Info => cmd::cmd_info(),
    Commands::Completions { shell } => cmd::cmd_completions(shell),
  }
}
