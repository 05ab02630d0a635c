use biorempp::cli::{Cli, Commands};
use biorempp::error::BioremError;
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging with BIOREMPP_LOG environment variable support
    let log_level = std::env::var("BIOREMPP_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<BioremError>() {
            Some(BioremError::Config(_)) => 2,
            Some(BioremError::Io(_)) | Some(BioremError::Write(_)) => 3,
            Some(BioremError::Input(_)) => 4,
            Some(BioremError::Catalog(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let num_threads = if cli.threads == 0 {
        num_cpus::get()
    } else {
        cli.threads
    };

    biorempp::utils::parallel::configure_thread_pool(num_threads)?;

    if cli.verbose > 0 {
        eprintln!("Using {} threads", num_threads);
    }

    match cli.command {
        Commands::Merge(args) => biorempp::cli::commands::merge::run(args),
        Commands::Databases(args) => biorempp::cli::commands::database::run(args),
    }
}
