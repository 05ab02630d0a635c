//! Reference tables loaded once and shared read-only across runs

use crate::core::database::Database;
use crate::error::CatalogError;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_REFERENCE_DELIMITER: u8 = b';';

/// One loaded reference table with a join-key index.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    database: Database,
    source: PathBuf,
    schema: Vec<String>,
    join_index: usize,
    rows: Vec<Vec<String>>,
    /// Normalised join key to row indices, in table order.
    index: HashMap<String, Vec<usize>>,
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

impl ReferenceTable {
    pub fn load(database: Database, path: &Path, delimiter: u8) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::MissingSource {
                database,
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CatalogError::MissingSource {
                database,
                path: path.to_path_buf(),
            },
            _ => CatalogError::Malformed {
                database,
                path: path.to_path_buf(),
                line: None,
                message: e.to_string(),
            },
        })?;
        Self::from_reader(database, file, delimiter, path)
    }

    /// Read a delimited table with a header row. `source` is only used for
    /// error reporting.
    pub fn from_reader<R: Read>(
        database: Database,
        reader: R,
        delimiter: u8,
        source: &Path,
    ) -> Result<Self, CatalogError> {
        let malformed = |line: Option<u64>, message: String| CatalogError::Malformed {
            database,
            path: source.to_path_buf(),
            line,
            message,
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let schema: Vec<String> = csv_reader
            .headers()
            .map_err(|e| malformed(e.position().map(|p| p.line()), e.to_string()))?
            .iter()
            .map(normalize_header)
            .collect();

        let missing: Vec<String> = database
            .required_columns()
            .iter()
            .filter(|required| !schema.iter().any(|c| c == *required))
            .map(|s| s.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CatalogError::SchemaMismatch {
                database,
                path: source.to_path_buf(),
                missing,
            });
        }

        let join_index = schema
            .iter()
            .position(|c| c == database.join_column())
            .ok_or_else(|| CatalogError::SchemaMismatch {
                database,
                path: source.to_path_buf(),
                missing: vec![database.join_column().to_string()],
            })?;

        let mut rows = Vec::new();
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for record in csv_reader.records() {
            let record =
                record.map_err(|e| malformed(e.position().map(|p| p.line()), e.to_string()))?;
            let row: Vec<String> = record.iter().map(|field| field.trim().to_string()).collect();
            let key = normalize_key(&row[join_index]);
            if !key.is_empty() {
                index.entry(key).or_default().push(rows.len());
            }
            rows.push(row);
        }

        debug!(
            database = %database,
            rows = rows.len(),
            keys = index.len(),
            "indexed reference table"
        );

        Ok(Self {
            database,
            source: source.to_path_buf(),
            schema,
            join_index,
            rows,
            index,
        })
    }

    pub fn database(&self) -> Database {
        self.database
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    pub fn join_key(&self) -> &str {
        &self.schema[self.join_index]
    }

    pub fn join_index(&self) -> usize {
        self.join_index
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> &[String] {
        &self.rows[idx]
    }

    /// Row indices whose join key equals `key`, in table order.
    pub fn lookup(&self, key: &str) -> &[usize] {
        self.index.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unique_keys(&self) -> usize {
        self.index.len()
    }
}

/// Where each database's table lives on disk.
#[derive(Debug, Clone)]
pub struct ReferenceSources {
    paths: BTreeMap<Database, PathBuf>,
    delimiter: u8,
}

impl ReferenceSources {
    /// Use the default file name of every database inside `dir`.
    pub fn from_dir(dir: &Path) -> Self {
        let paths = Database::ALL
            .iter()
            .map(|db| (*db, dir.join(db.default_file_name())))
            .collect();
        Self {
            paths,
            delimiter: DEFAULT_REFERENCE_DELIMITER,
        }
    }

    pub fn with_path(mut self, database: Database, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(database, path.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self, database: Database) -> Option<&Path> {
        self.paths.get(&database).map(PathBuf::as_path)
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn load_one(&self, database: Database) -> Result<ReferenceTable, CatalogError> {
        match self.paths.get(&database) {
            Some(path) => ReferenceTable::load(database, path, self.delimiter),
            None => Err(CatalogError::MissingSource {
                database,
                path: PathBuf::new(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableStats {
    pub database: Database,
    pub source: PathBuf,
    pub rows: usize,
    pub unique_keys: usize,
    pub columns: Vec<String>,
}

/// Every loaded table plus the reason each unavailable one failed.
#[derive(Debug, Default)]
pub struct ReferenceCatalog {
    tables: BTreeMap<Database, ReferenceTable>,
    unavailable: BTreeMap<Database, CatalogError>,
}

impl ReferenceCatalog {
    /// Load all four tables, failing on the first one that cannot be loaded.
    pub fn load(sources: &ReferenceSources) -> Result<Self, CatalogError> {
        let mut tables = BTreeMap::new();
        for database in Database::ALL {
            tables.insert(database, sources.load_one(database)?);
        }
        info!(tables = tables.len(), "reference catalog loaded");
        Ok(Self {
            tables,
            unavailable: BTreeMap::new(),
        })
    }

    /// Load the given databases in parallel. Failures are kept and reported
    /// by `get` instead of aborting the load.
    pub fn load_available(sources: &ReferenceSources, databases: &[Database]) -> Self {
        let loaded: Vec<(Database, Result<ReferenceTable, CatalogError>)> = databases
            .par_iter()
            .map(|db| (*db, sources.load_one(*db)))
            .collect();

        let mut catalog = Self::default();
        for (database, result) in loaded {
            match result {
                Ok(table) => {
                    catalog.tables.insert(database, table);
                }
                Err(err) => {
                    warn!(database = %database, error = %err, "reference table unavailable");
                    catalog.unavailable.insert(database, err);
                }
            }
        }
        info!(
            loaded = catalog.tables.len(),
            unavailable = catalog.unavailable.len(),
            "reference catalog loaded"
        );
        catalog
    }

    pub fn from_tables(tables: impl IntoIterator<Item = ReferenceTable>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.database(), t)).collect(),
            unavailable: BTreeMap::new(),
        }
    }

    pub fn get(&self, database: Database) -> Result<&ReferenceTable, CatalogError> {
        if let Some(table) = self.tables.get(&database) {
            return Ok(table);
        }
        match self.unavailable.get(&database) {
            Some(err) => Err(err.clone()),
            None => Err(CatalogError::MissingSource {
                database,
                path: PathBuf::new(),
            }),
        }
    }

    pub fn available(&self) -> Vec<Database> {
        self.tables.keys().copied().collect()
    }

    pub fn unavailable(&self) -> impl Iterator<Item = (Database, &CatalogError)> {
        self.unavailable.iter().map(|(db, err)| (*db, err))
    }

    pub fn stats(&self) -> Vec<TableStats> {
        self.tables
            .values()
            .map(|table| TableStats {
                database: table.database(),
                source: table.source().to_path_buf(),
                rows: table.len(),
                unique_keys: table.unique_keys(),
                columns: table.schema().to_vec(),
            })
            .collect()
    }
}
