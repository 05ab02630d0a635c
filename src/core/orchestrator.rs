//! Fan-out of one validated input across the requested databases
//!
//! Each database runs `Pending -> Merging -> Optimizing -> Writing -> Done`
//! on its own. A failure at any stage is recorded as a [`PerDatabaseError`]
//! and never stops the other databases.

use crate::bio::identifier::IdentifierPattern;
use crate::bio::record::InputRecord;
use crate::bio::sample_input::{self, ParseOptions};
use crate::core::cancellation::CancellationToken;
use crate::core::catalog::ReferenceCatalog;
use crate::core::config::{delimiter_byte, Config};
use crate::core::database::{resolve_requested, Database};
use crate::core::frame::Frame;
use crate::core::merger::{self, MergeResult};
use crate::core::optimizer::{OptimizerSettings, TypeOptimizer};
use crate::core::validator::{RecordValidator, ValidationPolicy, ValidationReport};
use crate::error::{BioremError, FailureCause, InputError, PerDatabaseError};
use crate::report::{DatabaseStats, InputStats, ProcessingSummary};
use crate::storage::writer::{NamingPolicy, ResultWriter, DEFAULT_OUTPUT_DELIMITER};
use crate::utils::parallel::{build_pool, worker_count};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const SOURCE_COLUMN: &str = "database_source";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStage {
    Pending,
    Merging,
    Optimizing,
    Writing,
    Done,
    /// Building the source-tagged combined dataset after every database ran.
    Combining,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Pending => "pending",
            PipelineStage::Merging => "merging",
            PipelineStage::Optimizing => "optimizing",
            PipelineStage::Writing => "writing",
            PipelineStage::Done => "done",
            PipelineStage::Combining => "combining",
        };
        f.write_str(name)
    }
}

/// Which output a pipeline failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutputTarget {
    Database(Database),
    Combined,
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Database(db) => write!(f, "{}", db),
            OutputTarget::Combined => f.write_str("combined output"),
        }
    }
}

/// Everything a run needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct OrchestratorContext {
    pub parse: ParseOptions,
    pub validation: ValidationPolicy,
    pub optimizer: OptimizerSettings,
    pub output_delimiter: u8,
    pub extension: String,
    pub add_timestamp: bool,
    pub suffix: Option<String>,
    pub parallel: bool,
    pub max_workers: usize,
    pub cancellation: CancellationToken,
}

impl Default for OrchestratorContext {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            validation: ValidationPolicy::default(),
            optimizer: OptimizerSettings::default(),
            output_delimiter: DEFAULT_OUTPUT_DELIMITER,
            extension: "txt".to_string(),
            add_timestamp: false,
            suffix: None,
            parallel: true,
            max_workers: 4,
            cancellation: CancellationToken::default(),
        }
    }
}

impl OrchestratorContext {
    pub fn from_config(config: &Config) -> Result<Self, BioremError> {
        let pattern = IdentifierPattern::new(&config.input.identifier_pattern).map_err(|e| {
            BioremError::Config(format!(
                "invalid identifier pattern {:?}: {}",
                config.input.identifier_pattern, e
            ))
        })?;
        let max_input_bytes = match config.input.max_input_bytes {
            0 => None,
            limit => Some(limit),
        };

        Ok(Self {
            parse: ParseOptions {
                comment_prefix: config.input.comment_prefix.clone(),
                max_input_bytes,
            },
            validation: ValidationPolicy {
                pattern,
                malformed: config.input.malformed_policy,
            },
            optimizer: config.optimizer.clone(),
            output_delimiter: delimiter_byte(&config.output.delimiter)?,
            extension: config.output.extension.clone(),
            add_timestamp: config.output.add_timestamp,
            suffix: config.output.suffix.clone(),
            parallel: config.performance.parallel,
            max_workers: config.performance.max_workers,
            cancellation: CancellationToken::default(),
        })
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// File naming for one run; the timestamp is taken once here.
    pub fn naming(&self) -> NamingPolicy {
        let mut naming = NamingPolicy::new(self.extension.clone());
        if self.add_timestamp {
            naming = naming.with_timestamp(&chrono::Local::now());
        }
        if let Some(suffix) = &self.suffix {
            naming = naming.with_suffix(suffix.clone());
        }
        naming
    }
}

type PipelineOutcome = Result<(MergeResult, Duration), PerDatabaseError>;

pub struct MergeOrchestrator<'a> {
    catalog: &'a ReferenceCatalog,
    context: OrchestratorContext,
    validator: RecordValidator,
    optimizer: TypeOptimizer,
    writer: ResultWriter,
}

impl<'a> MergeOrchestrator<'a> {
    pub fn new(catalog: &'a ReferenceCatalog, context: OrchestratorContext) -> Self {
        Self {
            catalog,
            validator: RecordValidator::new(context.validation.clone()),
            optimizer: TypeOptimizer::new(context.optimizer.clone()),
            writer: ResultWriter::new(context.output_delimiter),
            context,
        }
    }

    pub fn context(&self) -> &OrchestratorContext {
        &self.context
    }

    /// Parse and validate raw input text. Nothing database-specific happens
    /// until this succeeds.
    pub fn prepare_input(
        &self,
        raw_text: &str,
    ) -> Result<(Vec<InputRecord>, ValidationReport), InputError> {
        let (records, parse_report) = sample_input::parse_with(raw_text, &self.context.parse)?;
        let validated = self.validator.validate(records, &parse_report)?;
        Ok(validated)
    }

    /// Run every requested database (all of them when `requested` is empty)
    /// and optionally write the combined dataset.
    pub fn run(
        &self,
        raw_text: &str,
        requested: &[Database],
        output_dir: &Path,
        combine: bool,
    ) -> Result<(ProcessingSummary, Vec<PerDatabaseError>), InputError> {
        let started = Instant::now();
        let (records, validation) = self.prepare_input(raw_text)?;
        let databases = resolve_requested(requested);
        let naming = self.context.naming();

        info!(
            samples = validation.sample_count(),
            identifiers = records.len(),
            databases = databases.len(),
            "starting merge run"
        );

        let outcomes = self.run_pipelines(&databases, &records, output_dir, &naming);

        let mut summary = ProcessingSummary {
            input: InputStats::from(&validation),
            ..ProcessingSummary::default()
        };
        let mut errors = Vec::new();
        let mut successes = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok((result, elapsed)) => {
                    summary.total_matches += result.match_count;
                    summary
                        .per_database
                        .insert(result.database, DatabaseStats::from_result(&result, elapsed));
                    if combine {
                        successes.push(result);
                    }
                }
                Err(err) => {
                    if let (Some(db), FailureCause::Catalog(_)) = (err.database(), &err.cause) {
                        summary.unavailable.push(db);
                    }
                    warn!(error = %err, "database pipeline failed");
                    errors.push(err);
                }
            }
        }

        if combine && !successes.is_empty() {
            match self.write_combined(&successes, output_dir, &naming) {
                Ok((path, rows)) => {
                    summary.combined_output_path = Some(path);
                    summary.combined_rows = Some(rows);
                }
                Err(err) => {
                    warn!(error = %err, "combined output failed");
                    errors.push(err);
                }
            }
        } else if combine {
            debug!("no database succeeded, skipping combined output");
        }

        summary.total_time = started.elapsed();
        info!(
            succeeded = summary.per_database.len(),
            failed = errors.len(),
            total_matches = summary.total_matches,
            elapsed_ms = summary.total_time.as_millis() as u64,
            "merge run finished"
        );
        Ok((summary, errors))
    }

    /// Outcomes come back in `databases` order whether or not they ran in
    /// parallel.
    fn run_pipelines(
        &self,
        databases: &[Database],
        records: &[InputRecord],
        output_dir: &Path,
        naming: &NamingPolicy,
    ) -> Vec<PipelineOutcome> {
        let run_one = |db: &Database| self.run_pipeline(*db, records, output_dir, naming);

        if self.context.parallel && databases.len() > 1 {
            let threads = worker_count(self.context.max_workers, databases.len());
            match build_pool(threads) {
                Ok(pool) => {
                    debug!(threads, "running database pipelines in parallel");
                    return pool.install(|| databases.par_iter().map(run_one).collect());
                }
                Err(e) => warn!(error = %e, "worker pool unavailable, running sequentially"),
            }
        }
        databases.iter().map(run_one).collect()
    }

    fn run_pipeline(
        &self,
        database: Database,
        records: &[InputRecord],
        output_dir: &Path,
        naming: &NamingPolicy,
    ) -> PipelineOutcome {
        let target = OutputTarget::Database(database);
        let started = Instant::now();

        if self.context.cancellation.is_cancelled() {
            return Err(PerDatabaseError::new(
                target,
                PipelineStage::Pending,
                FailureCause::Cancelled,
            ));
        }

        let table = self
            .catalog
            .get(database)
            .map_err(|e| PerDatabaseError::new(target, PipelineStage::Pending, e))?;

        debug!(database = %database, stage = %PipelineStage::Merging, "stage transition");
        let result = merger::merge(records, table);

        debug!(database = %database, stage = %PipelineStage::Optimizing, "stage transition");
        let mut result = self.optimizer.optimize(result);

        debug!(database = %database, stage = %PipelineStage::Writing, "stage transition");
        let path = self
            .writer
            .write(&mut result, output_dir, naming)
            .map_err(|e| PerDatabaseError::new(target, PipelineStage::Writing, e))?;

        let elapsed = started.elapsed();
        info!(
            database = %database,
            stage = %PipelineStage::Done,
            matches = result.match_count,
            path = %path.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "database finished"
        );
        Ok((result, elapsed))
    }

    fn write_combined(
        &self,
        results: &[MergeResult],
        output_dir: &Path,
        naming: &NamingPolicy,
    ) -> Result<(std::path::PathBuf, usize), PerDatabaseError> {
        let fail = |cause: FailureCause| {
            PerDatabaseError::new(OutputTarget::Combined, PipelineStage::Combining, cause)
        };

        if self.context.cancellation.is_cancelled() {
            return Err(fail(FailureCause::Cancelled));
        }

        debug!(stage = %PipelineStage::Combining, parts = results.len(), "stage transition");
        let combined = Frame::concat_tagged(
            SOURCE_COLUMN,
            results
                .iter()
                .map(|r| (r.database.display_name(), &r.frame)),
        );
        let path = self
            .writer
            .write_combined(&combined, output_dir, naming)
            .map_err(|e| fail(e.into()))?;
        Ok((path, combined.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::ReferenceTable;
    use crate::error::ErrorCategory;
    use std::fs;
    use tempfile::TempDir;

    fn kegg_catalog() -> ReferenceCatalog {
        let data = "ko;pathname;genesymbol\nK00031;Benzoate degradation;IDH1\nK00031;Toluene degradation;IDH1\nK00032;Xylene degradation;IDH2\n";
        let table =
            ReferenceTable::from_reader(Database::Kegg, data.as_bytes(), b';', Path::new("kegg"))
                .unwrap();
        ReferenceCatalog::from_tables([table])
    }

    const INPUT: &str = ">S1\nK00031\n>S2\nK00031\nK00032\n";

    #[test]
    fn test_stage_and_target_display() {
        assert_eq!(PipelineStage::Optimizing.to_string(), "optimizing");
        assert_eq!(OutputTarget::Database(Database::ToxCsm).to_string(), "ToxCSM");
        assert_eq!(OutputTarget::Combined.to_string(), "combined output");
    }

    #[test]
    fn test_single_database_run() {
        let dir = TempDir::new().unwrap();
        let catalog = kegg_catalog();
        let orchestrator = MergeOrchestrator::new(&catalog, OrchestratorContext::default());

        let (summary, errors) = orchestrator
            .run(INPUT, &[Database::Kegg], dir.path(), false)
            .unwrap();

        assert!(errors.is_empty());
        assert_eq!(summary.total_matches, 5);
        let stats = &summary.per_database[&Database::Kegg];
        assert_eq!(stats.input_gene_count, 3);
        assert!(stats.bytes_before.is_some());
        assert!(dir.path().join("KEGG_Results.txt").exists());
        assert_eq!(summary.input.samples, 2);
    }

    #[test]
    fn test_unavailable_databases_are_isolated() {
        let dir = TempDir::new().unwrap();
        let catalog = kegg_catalog();
        let orchestrator = MergeOrchestrator::new(&catalog, OrchestratorContext::default());

        let (summary, errors) = orchestrator.run(INPUT, &[], dir.path(), true).unwrap();

        assert_eq!(summary.successful_databases(), vec![Database::Kegg]);
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|e| e.stage == PipelineStage::Pending && e.category() == ErrorCategory::MissingData));
        assert_eq!(summary.unavailable.len(), 3);
        assert_eq!(summary.combined_rows, Some(5));

        let combined = fs::read_to_string(dir.path().join("BioRemPP_Combined_Results.txt")).unwrap();
        assert!(combined.starts_with("database_source;sample;ko;pathname;genesymbol\n"));
        assert!(combined.contains("KEGG;S2;K00032;Xylene degradation;IDH2\n"));
    }

    #[test]
    fn test_input_errors_abort_before_databases() {
        let dir = TempDir::new().unwrap();
        let catalog = kegg_catalog();
        let orchestrator = MergeOrchestrator::new(&catalog, OrchestratorContext::default());

        let err = orchestrator
            .run("K00031\n", &[Database::Kegg], dir.path(), false)
            .unwrap_err();
        assert!(matches!(err, InputError::Structural(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cancelled_run_records_every_database() {
        let dir = TempDir::new().unwrap();
        let catalog = kegg_catalog();
        let token = CancellationToken::new();
        token.cancel();
        let context = OrchestratorContext::default().with_cancellation(token);
        let orchestrator = MergeOrchestrator::new(&catalog, context);

        let (summary, errors) = orchestrator
            .run(INPUT, &[Database::Kegg], dir.path(), true)
            .unwrap();
        assert!(summary.per_database.is_empty());
        assert_eq!(errors[0].cause, FailureCause::Cancelled);
        assert!(summary.combined_output_path.is_none());
    }

    #[test]
    fn test_context_from_config() {
        let mut config = Config::default();
        config.output.delimiter = "\\t".to_string();
        config.input.identifier_pattern = "(".to_string();
        assert!(OrchestratorContext::from_config(&config).is_err());

        config.input.identifier_pattern = r"^K\d{5}$".to_string();
        config.output.suffix = Some("x".to_string());
        let context = OrchestratorContext::from_config(&config).unwrap();
        assert_eq!(context.output_delimiter, b'\t');
        assert_eq!(context.naming().database_file_name(Database::Kegg), "KEGG_Results_x.txt");
    }
}
