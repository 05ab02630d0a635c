use crate::cli::output::*;
use crate::core::catalog::ReferenceTable;
use crate::core::config::Config;
use crate::core::database::Database;
use crate::error::BioremError;
use crate::utils::progress::create_spinner;
use clap::Args;

#[derive(Args)]
pub struct InfoArgs {
    /// Database name (BioRemPP, KEGG, HADEG or ToxCSM)
    pub database: String,
}

pub fn run(args: InfoArgs, config: &Config) -> anyhow::Result<()> {
    let database: Database = args.database.parse().map_err(BioremError::Config)?;
    let sources = config.reference_sources()?;
    let path = sources
        .path(database)
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| config.data_dir().join(database.default_file_name()));

    let spinner = create_spinner(&format!("Loading {}...", database), false);
    let loaded = ReferenceTable::load(database, &path, sources.delimiter());
    spinner.finish_and_clear();

    section_header("Database Information");
    tree_item(false, "Name", Some(database.display_name()));
    tree_item(false, "Description", Some(database.description()));
    tree_item(false, "Source", Some(&path.display().to_string()));

    let table = match loaded {
        Ok(table) => table,
        Err(err) => {
            tree_item(true, "Status", Some("unavailable"));
            error(&err.to_string());
            println!("  hint: {}", remedy(err.category()));
            return Err(BioremError::Catalog(err).into());
        }
    };

    tree_section(
        "Contents",
        vec![
            ("Rows", format_number(table.len())),
            ("Unique KO keys", format_number(table.unique_keys())),
            ("Join column", table.join_key().to_string()),
        ],
        false,
    );

    let required = database.required_columns();
    let columns: Vec<(&str, String)> = table
        .schema()
        .iter()
        .map(|c| {
            let marker = if required.contains(&c.as_str()) {
                "required"
            } else {
                "extra"
            };
            (c.as_str(), marker.to_string())
        })
        .collect();
    tree_section("Columns", columns, true);
    Ok(())
}
