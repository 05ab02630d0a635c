use serde::{Deserialize, Serialize};

/// One identifier line attributed to the sample whose header preceded it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputRecord {
    pub sample_id: String,
    pub gene_id: String,
}

impl InputRecord {
    pub fn new(sample_id: impl Into<String>, gene_id: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            gene_id: gene_id.into(),
        }
    }
}
