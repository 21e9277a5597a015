//! The screening funnel end to end.
//!
//! [`ScreeningPipeline`] owns the four tiers, the decision engine, and the
//! result cache, and sequences them per request: cache lookup, exact match
//! with early stop, blocking retrieval, vector escalation, rerank, decide,
//! write-back. Construction happens once at startup from validated
//! configuration; after that the pipeline is shared freely across tasks.

pub mod config;
pub mod error;
pub mod orchestrator;
mod shadow;
pub mod types;


pub use config::{BudgetConfig, FunnelConfig};
pub use error::ScreeningError;
pub use orchestrator::ScreeningPipeline;
pub use types::{ScreeningResult, TierDiagnostics};
