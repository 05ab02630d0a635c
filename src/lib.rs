pub mod bio;
pub mod cli;
pub mod core;
pub mod error;
pub mod report;
pub mod storage;
pub mod utils;

pub use crate::core::{
    Config, Database, MergeOrchestrator, OrchestratorContext, ReferenceCatalog, ReferenceSources,
};
pub use crate::error::{BioremError, Result};
pub use crate::report::ProcessingSummary;
