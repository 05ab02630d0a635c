use crate::bio::sample_input::DEFAULT_COMMENT_PREFIX;
use crate::core::catalog::ReferenceSources;
use crate::core::database::Database;
use crate::core::optimizer::OptimizerSettings;
use crate::core::paths;
use crate::core::validator::MalformedPolicy;
use crate::error::BioremError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Databases to process; empty means all of them.
    pub databases: Vec<Database>,
    pub input: InputConfig,
    pub reference: ReferenceConfig,
    pub output: OutputConfig,
    pub optimizer: OptimizerSettings,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub comment_prefix: String,
    pub identifier_pattern: String,
    pub malformed_policy: MalformedPolicy,
    /// Inputs above this many bytes are rejected before parsing (0 = no limit)
    pub max_input_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Directory holding the reference tables (falls back to BIOREMPP_DATA_DIR, then ./data)
    pub data_dir: Option<PathBuf>,
    pub delimiter: String,
    /// Per-database file overrides keyed by database name
    pub paths: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    pub delimiter: String,
    pub extension: String,
    pub add_timestamp: bool,
    pub suffix: Option<String>,
    pub combine: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub parallel: bool,
    /// Upper bound on concurrent database pipelines (0 = number of CPUs)
    pub max_workers: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            comment_prefix: DEFAULT_COMMENT_PREFIX.to_string(),
            identifier_pattern: crate::bio::identifier::KO_PATTERN.to_string(),
            malformed_policy: MalformedPolicy::Skip,
            max_input_bytes: 100 * 1024 * 1024,
        }
    }
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            delimiter: ";".to_string(),
            paths: BTreeMap::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(paths::DEFAULT_OUTPUT_DIR),
            delimiter: ";".to_string(),
            extension: "txt".to_string(),
            add_timestamp: false,
            suffix: None,
            combine: false,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_workers: 4,
        }
    }
}

/// Parse a delimiter setting; it must be exactly one ASCII character.
pub fn delimiter_byte(value: &str) -> Result<u8, BioremError> {
    let unescaped = match value {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match unescaped.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(BioremError::Config(format!(
            "delimiter must be a single ASCII character, got {:?}",
            value
        ))),
    }
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        paths::data_dir(self.reference.data_dir.as_deref())
    }

    /// Reference file locations with per-database overrides applied.
    pub fn reference_sources(&self) -> Result<ReferenceSources, BioremError> {
        let data_dir = self.data_dir();
        let mut sources = ReferenceSources::from_dir(&data_dir)
            .with_delimiter(delimiter_byte(&self.reference.delimiter)?);

        for (name, path) in &self.reference.paths {
            let database: Database = name.parse().map_err(BioremError::Config)?;
            let path = if path.is_relative() {
                data_dir.join(path)
            } else {
                path.clone()
            };
            sources = sources.with_path(database, path);
        }
        Ok(sources)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, BioremError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| BioremError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), BioremError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| BioremError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            databases = ["KEGG", "toxcsm"]

            [output]
            combine = true

            [input]
            malformed_policy = "reject"
            "#,
        )
        .unwrap();

        assert_eq!(config.databases, vec![Database::Kegg, Database::ToxCsm]);
        assert!(config.output.combine);
        assert_eq!(config.output.delimiter, ";");
        assert_eq!(config.input.malformed_policy, MalformedPolicy::Reject);
        assert_eq!(config.input.comment_prefix, "#");
        assert!(config.performance.parallel);
        assert_eq!(config.optimizer.min_rows, 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("biorempp.toml");
        let mut config = Config::default();
        config.output.suffix = Some("batch7".to_string());
        config.performance.max_workers = 2;

        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.output.suffix.as_deref(), Some("batch7"));
        assert_eq!(loaded.performance.max_workers, 2);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[output\ncombine = ").unwrap();
        assert!(matches!(load_config(&path), Err(BioremError::Config(_))));
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(delimiter_byte(";").unwrap(), b';');
        assert_eq!(delimiter_byte("\\t").unwrap(), b'\t');
        assert!(delimiter_byte(";;").is_err());
        assert!(delimiter_byte("").is_err());
    }

    #[test]
    fn test_reference_overrides() {
        let mut config = Config::default();
        config.reference.data_dir = Some(PathBuf::from("/refs"));
        config
            .reference
            .paths
            .insert("hadeg".to_string(), PathBuf::from("custom/hadeg.csv"));

        let sources = config.reference_sources().unwrap();
        assert_eq!(
            sources.path(Database::Hadeg),
            Some(Path::new("/refs/custom/hadeg.csv"))
        );
        assert_eq!(
            sources.path(Database::Kegg),
            Some(Path::new("/refs/kegg_degradation_pathways.csv"))
        );

        config
            .reference
            .paths
            .insert("nope".to_string(), PathBuf::from("x.csv"));
        assert!(config.reference_sources().is_err());
    }
}
