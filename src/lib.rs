//! Funding Source Attribution & Risk Graph Engine
//!
//! Traces the provenance of funds flowing into a wallet, classifies the
//! counterparties it finds against known-entity registries, and folds the
//! discovered funding sources into a deterministic risk score.

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod history;
pub mod registry;
pub mod scoring;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use events::TrackerEvent;
pub use registry::EntityRegistry;
pub use tracker::{FundingTracker, TrackerConfig};
pub use types::{
    EntityClass, EntityType, FundingAnalysisResult, FundingSource, RiskLevel, Transfer,
};
