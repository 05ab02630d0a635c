pub mod cancellation;
pub mod catalog;
pub mod config;
pub mod database;
pub mod frame;
pub mod merger;
pub mod optimizer;
pub mod orchestrator;
pub mod paths;
pub mod validator;

pub use cancellation::CancellationToken;
pub use catalog::{ReferenceCatalog, ReferenceSources, ReferenceTable};
pub use config::Config;
pub use database::Database;
pub use merger::{merge, MergeResult};
pub use optimizer::TypeOptimizer;
pub use orchestrator::{MergeOrchestrator, OrchestratorContext};
pub use validator::RecordValidator;
