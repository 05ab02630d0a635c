/// Standard output utilities for consistent command formatting
use crate::error::{ErrorCategory, InputError, PerDatabaseError};
use crate::report::ProcessingSummary;
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};
use humansize::{format_size, BINARY};

/// Display a section header with optional underline
pub fn section_header(title: &str) {
    println!("\n{}", title.bold().cyan());
}

pub fn section_header_with_line(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}", "─".repeat(title.len()).dimmed());
}

/// Display a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Display an info message
pub fn info(message: &str) {
    println!("{} {}", "●".blue(), message);
}

/// Display a warning message
pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Display an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Tree structure item
pub fn tree_item(is_last: bool, label: &str, value: Option<&str>) {
    let prefix = if is_last { "└─" } else { "├─" };
    if let Some(val) = value {
        println!("{} {}: {}", prefix.dimmed(), label, val);
    } else {
        println!("{} {}", prefix.dimmed(), label);
    }
}

/// Tree section with nested items
pub fn tree_section(title: &str, items: Vec<(&str, String)>, is_last: bool) {
    tree_item(is_last, title, None);
    let continuation = if is_last { "   " } else { "│  " };

    for (i, (label, value)) in items.iter().enumerate() {
        let is_last_item = i == items.len() - 1;
        let prefix = if is_last_item { "└─" } else { "├─" };
        println!(
            "{}{} {}: {}",
            continuation.dimmed(),
            prefix.dimmed(),
            label,
            value
        );
    }
}

/// Create a standard table with our preferred styling
pub fn create_standard_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Create a standard header cell
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .fg(TableColor::Cyan)
}

/// Format a number with thousands separator
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Suggested next step for each error category
pub fn remedy(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::MalformedInput => {
            "Start each sample with a '>' header line and put one KO identifier per line below it"
        }
        ErrorCategory::EmptyInput => {
            "Add at least one valid KO identifier (e.g. K00031) under every sample header"
        }
        ErrorCategory::MissingData => {
            "Check the reference data directory (--data-dir or BIOREMPP_DATA_DIR)"
        }
        ErrorCategory::SchemaMismatch => {
            "The reference file header does not match the expected columns; restore the original file"
        }
        ErrorCategory::Permission => "Choose an output directory you can write to",
        ErrorCategory::DiskFull => "Free some disk space or write to another volume",
        ErrorCategory::InvalidPath => "Use a plain directory path and a suffix without separators",
        ErrorCategory::Cancelled => "Increase --timeout or rerun without it",
        ErrorCategory::Io => "Retry the run; the file system reported an unexpected error",
    }
}

pub fn input_failure(err: &InputError) {
    error(&err.to_string());
    println!("  {} {}", "hint:".dimmed(), remedy(err.category()));
}

/// Render a finished run: one row per database, then failures with remedies.
pub fn print_summary(summary: &ProcessingSummary, errors: &[PerDatabaseError]) {
    section_header_with_line("Merge Summary");

    let input = &summary.input;
    tree_section(
        "Input",
        vec![
            ("Samples", format_number(input.samples)),
            ("Identifiers", format_number(input.accepted_identifiers)),
            ("Skipped", format_number(input.skipped_identifiers)),
            ("Duplicates removed", format_number(input.duplicates_removed)),
        ],
        true,
    );

    if !summary.per_database.is_empty() {
        let mut table = create_standard_table();
        table.set_header(vec![
            header_cell("Database"),
            header_cell("Rows"),
            header_cell("Genes"),
            header_cell("Samples"),
            header_cell("Memory"),
            header_cell("Time"),
            header_cell("File"),
        ]);
        for stats in summary.per_database.values() {
            let memory = match (stats.bytes_before, stats.bytes_after) {
                (Some(before), Some(after)) => format!(
                    "{} → {}",
                    format_size(before, BINARY),
                    format_size(after, BINARY)
                ),
                _ => "-".to_string(),
            };
            table.add_row(vec![
                Cell::new(stats.database.display_name()),
                Cell::new(format_number(stats.match_count)),
                Cell::new(format_number(stats.unique_genes_matched)),
                Cell::new(stats.matched_samples),
                Cell::new(memory),
                Cell::new(format!("{:.2}s", stats.elapsed.as_secs_f64())),
                Cell::new(
                    stats
                        .output_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                ),
            ]);
        }
        println!("{}", table);
    }

    if let Some(path) = &summary.combined_output_path {
        success(&format!(
            "Combined {} rows into {}",
            format_number(summary.combined_rows.unwrap_or(0)),
            path.display()
        ));
    }

    for err in errors {
        warning(&err.to_string());
        println!("  {} {}", "hint:".dimmed(), remedy(err.category()));
    }

    info(&format!(
        "{} matches across {} database(s) in {:.2}s",
        format_number(summary.total_matches),
        summary.per_database.len(),
        summary.total_time.as_secs_f64()
    ));
}
