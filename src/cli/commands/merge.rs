use crate::cli::commands::{load_settings, parse_databases};
use crate::cli::output;
use crate::core::cancellation::CancellationToken;
use crate::core::catalog::ReferenceCatalog;
use crate::core::database::resolve_requested;
use crate::core::orchestrator::{MergeOrchestrator, OrchestratorContext};
use crate::core::validator::MalformedPolicy;
use crate::error::{BioremError, FailureCause};
use crate::report::text::generate_text_report;
use crate::utils::progress::create_spinner;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct MergeArgs {
    /// Input file: '>' sample headers, each followed by KO identifiers
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Database to merge against (repeatable, comma-separated, or "all")
    #[arg(short = 'd', long = "database", value_name = "DB")]
    pub databases: Vec<String>,

    /// Directory for result files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output column delimiter
    #[arg(long)]
    pub delimiter: Option<String>,

    /// Add a timestamp to output file names
    #[arg(long)]
    pub timestamp: bool,

    /// Extra tag appended to output file names
    #[arg(long)]
    pub suffix: Option<String>,

    /// Also write one source-tagged file with every database's rows
    #[arg(long)]
    pub combine: bool,

    /// Configuration file (TOML)
    #[arg(long, env = "BIOREMPP_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the reference tables
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Fail on the first malformed identifier instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Write the processing summary as JSON
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// Write a plain-text run report
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Stop starting new databases after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Suppress the spinner and summary table
    #[arg(short, long)]
    pub quiet: bool,
}

pub fn run(args: MergeArgs) -> anyhow::Result<()> {
    let mut config = load_settings(args.config.as_deref(), args.data_dir.clone())?;

    if let Some(dir) = args.output_dir {
        config.output.directory = dir;
    }
    if let Some(delimiter) = args.delimiter {
        config.output.delimiter = delimiter;
    }
    if args.timestamp {
        config.output.add_timestamp = true;
    }
    if args.suffix.is_some() {
        config.output.suffix = args.suffix;
    }
    if args.combine {
        config.output.combine = true;
    }
    if args.strict {
        config.input.malformed_policy = MalformedPolicy::Reject;
    }
    if !args.databases.is_empty() {
        config.databases = parse_databases(&args.databases)?;
    }

    let mut context = OrchestratorContext::from_config(&config)?;
    if let Some(secs) = args.timeout {
        context = context.with_cancellation(CancellationToken::with_timeout(Duration::from_secs(secs)));
    }

    let raw_text = std::fs::read_to_string(&args.input).map_err(BioremError::from)?;

    let databases = resolve_requested(&config.databases);
    let spinner = create_spinner("Loading reference tables...", args.quiet);
    let sources = config.reference_sources()?;
    let catalog = ReferenceCatalog::load_available(&sources, &databases);
    spinner.set_message(format!("Merging against {} database(s)...", databases.len()));

    let orchestrator = MergeOrchestrator::new(&catalog, context);
    let outcome = orchestrator.run(
        &raw_text,
        &databases,
        &config.output.directory,
        config.output.combine,
    );
    spinner.finish_and_clear();

    let (summary, errors) = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            output::input_failure(&err);
            return Err(BioremError::Input(err).into());
        }
    };

    if !args.quiet {
        output::print_summary(&summary, &errors);
    }

    if let Some(path) = &args.summary_json {
        summary.write_json(path)?;
        if !args.quiet {
            output::success(&format!("Summary written to {}", path.display()));
        }
    }

    if let Some(path) = &args.report {
        let report = generate_text_report(&summary, &errors)?;
        std::fs::write(path, report).map_err(BioremError::from)?;
    }

    if summary.per_database.is_empty() {
        if let Some(FailureCause::Catalog(err)) = errors.first().map(|e| &e.cause) {
            return Err(BioremError::Catalog(err.clone()).into());
        }
        anyhow::bail!("no database produced results");
    }

    Ok(())
}
