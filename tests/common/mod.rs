//! Shared fixtures for the integration tests
//!
//! Reference tables are written into a temporary directory so every test
//! gets its own isolated data directory.
#![allow(dead_code)]

use biorempp::core::catalog::{ReferenceCatalog, ReferenceSources};
use biorempp::core::database::Database;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two samples; K00031 appears in both, K00032 only in S2.
pub const SCENARIO_INPUT: &str = ">S1\nK00031\n>S2\nK00031\nK00032\n";

pub const BIOREMPP_TABLE: &str = "\
ko;genesymbol;genename;cpd;compoundclass;referenceAG;compoundname;enzyme_activity
K00031;IDH1;isocitrate dehydrogenase;C00311;Aromatic;EPA;isocitrate;dehydrogenase
K00031;IDH1;isocitrate dehydrogenase;C00026;Aliphatic;IARC;2-oxoglutarate;dehydrogenase
K00032;IDH2;isocitrate dehydrogenase (NADP+);C00311;Aromatic;EPA;isocitrate;dehydrogenase
K00040;UXUB;fructuronate reductase;C00905;Carbohydrate;ATSDR;D-mannonate;reductase
";

pub const KEGG_TABLE: &str = "\
ko;pathname;genesymbol
K00031;Benzoate degradation;IDH1
K00031;Toluene degradation;IDH1
K00032;Xylene degradation;IDH2
";

pub const HADEG_TABLE: &str = "\
Gene;ko;Pathway;compound_pathway
alkB;K00031;A_Terminal_oxidation;Alkanes
nahAc;K00033;Naphthalene_upper;Aromatics
";

pub const TOXCSM_TABLE: &str = "\
SMILES;cpd;ko;ChEBI;compoundname;value_NR_AR;label_NR_AR
CC(=O)O;C00033;K00032;15366;acetate;0.12;Safe
c1ccccc1;C01407;K00032;16716;benzene;0.87;Toxic
O=C=O;C00011;K00031;16526;carbon dioxide;0.05;Safe
";

pub fn table_text(database: Database) -> &'static str {
    match database {
        Database::BioRemPP => BIOREMPP_TABLE,
        Database::Kegg => KEGG_TABLE,
        Database::Hadeg => HADEG_TABLE,
        Database::ToxCsm => TOXCSM_TABLE,
    }
}

/// A data directory holding the reference tables under their default names.
pub struct ReferenceFixture {
    dir: TempDir,
}

impl ReferenceFixture {
    pub fn new() -> Self {
        Self::without(&[])
    }

    /// Write every table except the listed ones.
    pub fn without(missing: &[Database]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for database in Database::ALL {
            if !missing.contains(&database) {
                fs::write(
                    dir.path().join(database.default_file_name()),
                    table_text(database),
                )
                .expect("Failed to write reference table");
            }
        }
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, database: Database, contents: &str) {
        fs::write(self.dir.path().join(database.default_file_name()), contents)
            .expect("Failed to write reference table");
    }

    pub fn sources(&self) -> ReferenceSources {
        ReferenceSources::from_dir(self.dir.path())
    }

    pub fn catalog(&self) -> ReferenceCatalog {
        ReferenceCatalog::load_available(&self.sources(), &Database::ALL)
    }
}

/// File names inside `dir`, sorted.
pub fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

pub fn read(path: impl Into<PathBuf>) -> String {
    fs::read_to_string(path.into()).expect("Failed to read output file")
}
