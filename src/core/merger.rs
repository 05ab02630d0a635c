//! Inner join of validated records against one reference table

use crate::bio::record::InputRecord;
use crate::core::catalog::ReferenceTable;
use crate::core::database::Database;
use crate::core::frame::{Frame, FrameBuilder};
use std::collections::HashSet;
use std::path::PathBuf;

pub const SAMPLE_COLUMN: &str = "sample";
pub const GENE_COLUMN: &str = "ko";

/// Estimated in-memory size before and after type optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryFootprint {
    pub bytes_before: usize,
    pub bytes_after: usize,
}

#[derive(Debug, Clone)]
pub struct MergeResult {
    pub database: Database,
    pub frame: Frame,
    /// Joined rows emitted, counting one-to-many expansion.
    pub match_count: usize,
    /// Input records considered, matched or not.
    pub input_gene_count: usize,
    pub unique_genes_matched: usize,
    pub matched_samples: usize,
    pub memory: Option<MemoryFootprint>,
    pub output_path: Option<PathBuf>,
}

/// Output columns: the record fields, then every reference column except the
/// join column.
pub fn joined_schema(table: &ReferenceTable) -> Vec<String> {
    let mut names = vec![SAMPLE_COLUMN.to_string(), GENE_COLUMN.to_string()];
    names.extend(
        table
            .schema()
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != table.join_index())
            .map(|(_, name)| name.clone()),
    );
    names
}

pub fn merge(records: &[InputRecord], table: &ReferenceTable) -> MergeResult {
    let names = joined_schema(table);
    let join_index = table.join_index();

    let expected_rows: usize = records.iter().map(|r| table.lookup(&r.gene_id).len()).sum();
    let mut builder = FrameBuilder::with_capacity(names, expected_rows);
    let mut genes: HashSet<&str> = HashSet::new();
    let mut samples: HashSet<&str> = HashSet::new();

    for record in records {
        let matches = table.lookup(&record.gene_id);
        if matches.is_empty() {
            continue;
        }
        genes.insert(record.gene_id.as_str());
        samples.insert(record.sample_id.as_str());

        for &row_idx in matches {
            let row = table.row(row_idx);
            let reference_cells = row
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != join_index)
                .map(|(_, cell)| cell.as_str());
            builder.push_row(
                [record.sample_id.as_str(), record.gene_id.as_str()]
                    .into_iter()
                    .chain(reference_cells),
            );
        }
    }

    let frame = builder.finish();
    MergeResult {
        database: table.database(),
        match_count: frame.height(),
        input_gene_count: records.len(),
        unique_genes_matched: genes.len(),
        matched_samples: samples.len(),
        frame,
        memory: None,
        output_path: None,
    }
}
