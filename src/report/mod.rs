//! Run summaries handed to the presentation layer

use crate::core::database::Database;
use crate::core::merger::MergeResult;
use crate::core::validator::ValidationReport;
use crate::error::BioremError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod text;

fn as_seconds<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Stats kept from one successful database pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseStats {
    pub database: Database,
    pub match_count: usize,
    pub input_gene_count: usize,
    pub unique_genes_matched: usize,
    pub matched_samples: usize,
    pub columns: usize,
    pub bytes_before: Option<usize>,
    pub bytes_after: Option<usize>,
    pub output_path: Option<PathBuf>,
    #[serde(serialize_with = "as_seconds")]
    pub elapsed: Duration,
}

impl DatabaseStats {
    pub fn from_result(result: &MergeResult, elapsed: Duration) -> Self {
        Self {
            database: result.database,
            match_count: result.match_count,
            input_gene_count: result.input_gene_count,
            unique_genes_matched: result.unique_genes_matched,
            matched_samples: result.matched_samples,
            columns: result.frame.width(),
            bytes_before: result.memory.map(|m| m.bytes_before),
            bytes_after: result.memory.map(|m| m.bytes_after),
            output_path: result.output_path.clone(),
            elapsed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputStats {
    pub samples: usize,
    pub accepted_identifiers: usize,
    pub skipped_identifiers: usize,
    pub duplicates_removed: usize,
}

impl From<&ValidationReport> for InputStats {
    fn from(report: &ValidationReport) -> Self {
        Self {
            samples: report.sample_count(),
            accepted_identifiers: report.accepted,
            skipped_identifiers: report.skipped.len(),
            duplicates_removed: report.duplicates_removed,
        }
    }
}

/// Complete account of one run, together with the error list returned
/// beside it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingSummary {
    pub per_database: BTreeMap<Database, DatabaseStats>,
    pub total_matches: usize,
    #[serde(serialize_with = "as_seconds")]
    pub total_time: Duration,
    pub combined_output_path: Option<PathBuf>,
    pub combined_rows: Option<usize>,
    pub input: InputStats,
    /// Requested databases whose reference table could not be loaded.
    pub unavailable: Vec<Database>,
}

impl ProcessingSummary {
    pub fn successful_databases(&self) -> Vec<Database> {
        self.per_database.keys().copied().collect()
    }

    pub fn output_paths(&self) -> Vec<&Path> {
        self.per_database
            .values()
            .filter_map(|s| s.output_path.as_deref())
            .chain(self.combined_output_path.as_deref())
            .collect()
    }

    pub fn to_json(&self) -> Result<String, BioremError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), BioremError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
