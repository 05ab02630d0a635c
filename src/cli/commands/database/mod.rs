pub mod info;
pub mod list;

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args)]
pub struct DatabaseArgs {
    #[command(subcommand)]
    pub command: DatabaseCommands,

    /// Directory holding the reference tables
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "BIOREMPP_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum DatabaseCommands {
    /// List the reference databases and whether they are available
    List(list::ListArgs),

    /// Show the schema and size of one reference database
    Info(info::InfoArgs),
}

pub fn run(args: DatabaseArgs) -> anyhow::Result<()> {
    let config = super::load_settings(args.config.as_deref(), args.data_dir)?;
    match args.command {
        DatabaseCommands::List(list_args) => list::run(list_args, &config),
        DatabaseCommands::Info(info_args) => info::run(info_args, &config),
    }
}
