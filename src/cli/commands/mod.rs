pub mod database;
pub mod merge;

use crate::core::config::{load_config, Config};
use crate::core::database::Database;
use crate::error::BioremError;
use std::path::{Path, PathBuf};

/// Load the config file if one was given, then apply the data directory flag.
pub fn load_settings(
    config_path: Option<&Path>,
    data_dir: Option<PathBuf>,
) -> Result<Config, BioremError> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    if data_dir.is_some() {
        config.reference.data_dir = data_dir;
    }
    Ok(config)
}

/// Parse `-d` values; `all` anywhere selects every database.
pub fn parse_databases(values: &[String]) -> Result<Vec<Database>, BioremError> {
    let mut databases = Vec::with_capacity(values.len());
    for value in values.iter().flat_map(|v| v.split(',')) {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Vec::new());
        }
        databases.push(value.parse().map_err(BioremError::Config)?);
    }
    Ok(databases)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_databases() {
        let dbs = parse_databases(&["kegg".to_string(), "HADEG,toxcsm".to_string()]).unwrap();
        assert_eq!(dbs, vec![Database::Kegg, Database::Hadeg, Database::ToxCsm]);
        assert!(parse_databases(&["kegg".to_string(), "all".to_string()])
            .unwrap()
            .is_empty());
        assert!(parse_databases(&["uniprot".to_string()]).is_err());
    }
}
