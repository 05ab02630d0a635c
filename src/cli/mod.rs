pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "biorempp",
    version,
    about = "Bioremediation potential profiling of KEGG Orthology sample lists",
    long_about = "BioRemPP joins sample lists of KEGG Orthology identifiers against the BioRemPP, \
                  KEGG, HADEG and ToxCSM reference tables, writing one delimited result file \
                  per database and optionally a combined, source-tagged file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge a sample list against one or more reference databases
    Merge(commands::merge::MergeArgs),

    /// Inspect the reference databases
    Databases(commands::database::DatabaseArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_arguments() {
        let cli = Cli::parse_from([
            "biorempp", "merge", "-i", "samples.txt", "-d", "kegg", "-d", "hadeg", "--combine",
            "--suffix", "run1", "-j", "2",
        ]);
        assert_eq!(cli.threads, 2);
        match cli.command {
            Commands::Merge(args) => {
                assert_eq!(args.databases, vec!["kegg", "hadeg"]);
                assert!(args.combine);
                assert_eq!(args.suffix.as_deref(), Some("run1"));
                assert!(!args.strict);
            }
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn test_databases_info_arguments() {
        let cli = Cli::parse_from(["biorempp", "databases", "info", "toxcsm", "--data-dir", "/refs"]);
        match cli.command {
            Commands::Databases(args) => {
                assert_eq!(args.data_dir.as_deref(), Some(std::path::Path::new("/refs")));
                assert!(matches!(
                    args.command,
                    commands::database::DatabaseCommands::Info(ref info) if info.database == "toxcsm"
                ));
            }
            _ => panic!("expected databases"),
        }
    }
}
