mod commands;
mod emit;
mod error;
mod model;
mod reader;

use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use propgen_core::ExitStatus;

use commands::generate::GenerateArgs;

#[derive(Parser)]
#[command(
    name = "propgen",
    version,
    about = "propgen: generate versioned property accessors and metadata tables from schema introspection"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate class sources and model projections
    Generate {
        /// Introspection endpoint directory (<family>/<version>.yaml snapshots)
        endpoint: PathBuf,

        /// Static configuration file (.yaml or .json)
        config: PathBuf,

        /// Generation fragment file
        fragments: PathBuf,

        /// Output directory
        #[arg(default_value = "generated")]
        output_dir: PathBuf,

        /// Regenerate a single class
        #[arg(long)]
        class: Option<String>,
    },

    /// Validate a static configuration and report diagnostics
    Check {
        /// Static configuration file (.yaml or .json)
        config: PathBuf,

        /// Treat reference-wiring problems as errors
        #[arg(long)]
        strict: bool,

        /// Output format: human (default) or json
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Dump property registries and version tables as JSON
    Tables {
        /// Introspection endpoint directory
        endpoint: PathBuf,

        /// Static configuration file (.yaml or .json)
        config: PathBuf,

        /// Restrict the dump to a single class
        #[arg(long)]
        class: Option<String>,
    },

    /// List the epoch timeline of each deployment family
    Epochs {
        /// Output format: human (default) or json
        #[arg(long, default_value = "human")]
        format: String,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                process::exit(ExitStatus::Usage.code());
            }
        },
    };
    init_tracing();

    match cli.command {
        Commands::Generate {
            endpoint,
            config,
            fragments,
            output_dir,
            class,
        } => {
            let args = GenerateArgs {
                endpoint: &endpoint,
                config: &config,
                fragments: &fragments,
                output_dir: &output_dir,
                class,
            };
            match commands::generate::run_generate(args) {
                Ok((output, status)) => {
                    println!("{output}");
                    if !status.is_success() {
                        process::exit(status.code());
                    }
                }
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(e.exit_status().code());
                }
            }
        }
        Commands::Check {
            config,
            strict,
            format,
        } => match commands::check::run_check(&config, strict, &format) {
            Ok((output, error_count)) => {
                println!("{output}");
                if error_count > 0 {
                    process::exit(ExitStatus::Failure.code());
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(e.exit_status().code());
            }
        },
        Commands::Tables {
            endpoint,
            config,
            class,
        } => match commands::tables::run_tables(&endpoint, &config, class) {
            Ok((json, status)) => {
                println!("{json}");
                if !status.is_success() {
                    process::exit(status.code());
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                process::exit(e.exit_status().code());
            }
        },
        Commands::Epochs { format } => match commands::epochs::run_epochs(&format) {
            Ok(output) => {
                println!("{output}");
            }
            Err(e) => {
                eprintln!("Error: JSON serialization error: {e}");
                process::exit(ExitStatus::Failure.code());
            }
        },
    }
}
