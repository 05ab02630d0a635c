use crate::error::PerDatabaseError;
use crate::report::ProcessingSummary;
use std::fmt::Write;

/// Plain-text run report, suitable for saving next to the result files.
pub fn generate_text_report(
    summary: &ProcessingSummary,
    errors: &[PerDatabaseError],
) -> Result<String, std::fmt::Error> {
    let mut output = String::new();

    writeln!(&mut output, "BioRemPP Merge Report")?;
    writeln!(&mut output, "=====================")?;
    writeln!(&mut output)?;

    let input = &summary.input;
    writeln!(&mut output, "Input")?;
    writeln!(&mut output, "-----")?;
    writeln!(&mut output, "- Samples:             {:6}", input.samples)?;
    writeln!(&mut output, "- Identifiers:         {:6}", input.accepted_identifiers)?;
    writeln!(&mut output, "- Skipped (malformed): {:6}", input.skipped_identifiers)?;
    writeln!(&mut output, "- Duplicates removed:  {:6}", input.duplicates_removed)?;
    writeln!(&mut output)?;

    writeln!(&mut output, "Databases")?;
    writeln!(&mut output, "---------")?;
    for stats in summary.per_database.values() {
        writeln!(
            &mut output,
            "- {:<8} {:8} rows  {:5} genes  {:4} samples  {:.2}s",
            stats.database.display_name(),
            stats.match_count,
            stats.unique_genes_matched,
            stats.matched_samples,
            stats.elapsed.as_secs_f64()
        )?;
        if let Some(path) = &stats.output_path {
            writeln!(&mut output, "  -> {}", path.display())?;
        }
    }
    writeln!(&mut output)?;

    writeln!(&mut output, "Total matches: {}", summary.total_matches)?;
    writeln!(&mut output, "Total time:    {:.2}s", summary.total_time.as_secs_f64())?;
    if let Some(path) = &summary.combined_output_path {
        writeln!(
            &mut output,
            "Combined:      {} ({} rows)",
            path.display(),
            summary.combined_rows.unwrap_or(0)
        )?;
    }

    if !errors.is_empty() {
        writeln!(&mut output)?;
        writeln!(&mut output, "Failures")?;
        writeln!(&mut output, "--------")?;
        for error in errors {
            writeln!(&mut output, "- [{:?}] {}", error.category(), error)?;
        }
    }

    Ok(output)
}
