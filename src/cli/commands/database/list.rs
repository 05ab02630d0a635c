use crate::cli::output::*;
use crate::core::catalog::ReferenceCatalog;
use crate::core::config::Config;
use crate::core::database::Database;
use crate::core::paths::describe_paths;
use clap::Args;
use colored::*;
use comfy_table::Cell;

#[derive(Args)]
pub struct ListArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListArgs, config: &Config) -> anyhow::Result<()> {
    let sources = config.reference_sources()?;
    let catalog = ReferenceCatalog::load_available(&sources, &Database::ALL);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&catalog.stats())?);
        return Ok(());
    }

    section_header("Reference Databases");
    println!("{}", describe_paths(config.reference.data_dir.as_deref()).dimmed());

    let mut table = create_standard_table();
    table.set_header(vec![
        header_cell("Database"),
        header_cell("Description"),
        header_cell("Rows"),
        header_cell("KO keys"),
        header_cell("Status"),
    ]);

    for database in Database::ALL {
        let (rows, keys, status) = match catalog.get(database) {
            Ok(table) => (
                format_number(table.len()),
                format_number(table.unique_keys()),
                "available".green().to_string(),
            ),
            Err(err) => (
                "-".to_string(),
                "-".to_string(),
                format!("{:?}", err.kind()).red().to_string(),
            ),
        };
        table.add_row(vec![
            Cell::new(database.display_name()),
            Cell::new(database.description()),
            Cell::new(rows),
            Cell::new(keys),
            Cell::new(status),
        ]);
    }
    println!("{}", table);

    for (_, err) in catalog.unavailable() {
        warning(&err.to_string());
    }
    Ok(())
}
