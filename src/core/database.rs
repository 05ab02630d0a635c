use serde::{Deserialize, Serialize};
use std::fmt;

/// The four reference annotation tables an input can be enriched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Database {
    #[serde(rename = "BioRemPP", alias = "biorempp")]
    BioRemPP,
    #[serde(rename = "KEGG", alias = "kegg")]
    Kegg,
    #[serde(rename = "HADEG", alias = "hadeg")]
    Hadeg,
    #[serde(rename = "ToxCSM", alias = "toxcsm")]
    ToxCsm,
}

const BIOREMPP_COLUMNS: &[&str] = &[
    "ko",
    "genesymbol",
    "genename",
    "cpd",
    "compoundclass",
    "referenceAG",
    "compoundname",
    "enzyme_activity",
];
const KEGG_COLUMNS: &[&str] = &["ko", "pathname", "genesymbol"];
const HADEG_COLUMNS: &[&str] = &["Gene", "ko", "Pathway", "compound_pathway"];
const TOXCSM_COLUMNS: &[&str] = &["ko", "SMILES", "cpd", "ChEBI", "compoundname"];

impl Database {
    /// Every known database, in output order.
    pub const ALL: [Database; 4] = [
        Database::BioRemPP,
        Database::Kegg,
        Database::Hadeg,
        Database::ToxCsm,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Database::BioRemPP => "BioRemPP",
            Database::Kegg => "KEGG",
            Database::Hadeg => "HADEG",
            Database::ToxCsm => "ToxCSM",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Database::BioRemPP => "Bioremediation gene, compound and enzyme activity annotations",
            Database::Kegg => "KEGG xenobiotic degradation pathways",
            Database::Hadeg => "Hydrocarbon aerobic degradation enzymes and genes",
            Database::ToxCsm => "ToxCSM compound toxicity predictions",
        }
    }

    /// File name of the bundled reference table inside the data directory.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Database::BioRemPP => "database.csv",
            Database::Kegg => "kegg_degradation_pathways.csv",
            Database::Hadeg => "database_hadeg.csv",
            Database::ToxCsm => "database_toxcsm.csv",
        }
    }

    pub fn join_column(&self) -> &'static str {
        "ko"
    }

    /// Columns the reference header must contain. Extra columns are allowed.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Database::BioRemPP => BIOREMPP_COLUMNS,
            Database::Kegg => KEGG_COLUMNS,
            Database::Hadeg => HADEG_COLUMNS,
            Database::ToxCsm => TOXCSM_COLUMNS,
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Database {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "biorempp" => Ok(Database::BioRemPP),
            "kegg" => Ok(Database::Kegg),
            "hadeg" => Ok(Database::Hadeg),
            "toxcsm" => Ok(Database::ToxCsm),
            _ => Err(format!(
                "Unknown database: {} (expected one of: biorempp, kegg, hadeg, toxcsm)",
                s
            )),
        }
    }
}

/// Normalise a requested set: sorted, deduplicated, empty means all.
pub fn resolve_requested(requested: &[Database]) -> Vec<Database> {
    if requested.is_empty() {
        return Database::ALL.to_vec();
    }
    let mut databases = requested.to_vec();
    databases.sort();
    databases.dedup();
    databases
}
