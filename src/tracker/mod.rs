//! Funding tracker facade
//!
//! Owns the immutable engine configuration and the collaborators built
//! from it, and drives retrieval, graph construction, and scoring into a
//! single analysis result.

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::{Error, Result};
use crate::events::{EventBus, TrackerEvent};
use crate::graph::{FundingGraphBuilder, TraversalLimits};
use crate::history::{HistorySource, TransferFetcher};
use crate::registry::{EntityRegistry, RegistryOverrides};
use crate::scoring::{RiskScorer, ScoringConfig};
use crate::types::{
    is_valid_address, normalize_address, AnalysisSummary, DefiCategory, EntityClass,
    FundingAnalysisResult, RiskLevel, TrackerStats, Transfer, TrustLevel,
};

/// Engine configuration, immutable once a tracker is built from it
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrackerConfig {
    /// Traversal depth ceiling, in hops from the analyzed wallet
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Minimum retained transfer value, in the smallest on-chain unit
    #[serde(default, deserialize_with = "crate::types::de_raw_amount")]
    pub min_transfer_amount: u128,
    /// Hard cap on distinct funding sources per analysis
    #[serde(default = "default_max_funding_sources")]
    pub max_funding_sources: usize,
    /// Pagination guard per address
    #[serde(default = "default_max_pages_per_address")]
    pub max_pages_per_address: u32,
    /// Risk point weights
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Caller-supplied registry additions
    #[serde(default)]
    pub registry: RegistryOverrides,
}

fn default_max_depth() -> u32 {
    3
}

fn default_max_funding_sources() -> usize {
    50
}

fn default_max_pages_per_address() -> u32 {
    10
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            min_transfer_amount: 0,
            max_funding_sources: default_max_funding_sources(),
            max_pages_per_address: default_max_pages_per_address(),
            scoring: ScoringConfig::default(),
            registry: RegistryOverrides::default(),
        }
    }
}

impl TrackerConfig {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_transfer_amount(mut self, min_transfer_amount: u128) -> Self {
        self.min_transfer_amount = min_transfer_amount;
        self
    }

    pub fn with_max_funding_sources(mut self, max_funding_sources: usize) -> Self {
        self.max_funding_sources = max_funding_sources;
        self
    }

    pub fn with_max_pages_per_address(mut self, max_pages_per_address: u32) -> Self {
        self.max_pages_per_address = max_pages_per_address;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    /// Register an additional exchange address
    pub fn with_exchange(mut self, address: &str, name: &str, trust: TrustLevel) -> Self {
        self.registry = self.registry.exchange(address, name, trust);
        self
    }

    /// Register an additional mixer address
    pub fn with_mixer(mut self, address: &str, name: &str, sanctioned: bool) -> Self {
        self.registry = self.registry.mixer(address, name, sanctioned);
        self
    }

    /// Register an additional privacy protocol address
    pub fn with_privacy_protocol(mut self, address: &str, name: &str) -> Self {
        self.registry = self.registry.privacy_protocol(address, name);
        self
    }

    /// Register an additional DeFi protocol address
    pub fn with_defi_protocol(
        mut self,
        address: &str,
        name: &str,
        category: DefiCategory,
        trust: TrustLevel,
    ) -> Self {
        self.registry = self.registry.defi_protocol(address, name, category, trust);
        self
    }

    /// Check bounds and the scoring weight ordering
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        if self.max_funding_sources == 0 {
            return Err(Error::Config(
                "max_funding_sources must be at least 1".to_string(),
            ));
        }
        if self.max_pages_per_address == 0 {
            return Err(Error::Config(
                "max_pages_per_address must be at least 1".to_string(),
            ));
        }
        self.scoring.validate()
    }
}

/// Facade over retrieval, graph construction, and scoring
pub struct FundingTracker {
    config: TrackerConfig,
    registry: EntityRegistry,
    fetcher: TransferFetcher,
    scorer: RiskScorer,
    events: EventBus,
}

impl FundingTracker {
    /// Build a tracker over a pluggable history source
    pub fn new(config: TrackerConfig, source: Arc<dyn HistorySource>) -> Result<Self> {
        config.validate()?;
        let registry = EntityRegistry::from_overrides(&config.registry);
        let fetcher =
            TransferFetcher::new(source, config.min_transfer_amount, config.max_pages_per_address);
        let scorer = RiskScorer::new(config.scoring.clone());
        Ok(Self {
            config,
            registry,
            fetcher,
            scorer,
            events: EventBus::new(),
        })
    }

    /// Register an observer for analysis events
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Engine configuration
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Shared entity registry
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Classify an address into its entity family
    pub fn classify(&self, address: &str) -> EntityClass {
        self.registry.classify(address)
    }

    pub fn is_exchange(&self, address: &str) -> bool {
        self.registry.is_exchange(address)
    }

    pub fn is_mixer(&self, address: &str) -> bool {
        self.registry.is_mixer(address)
    }

    pub fn is_defi_protocol(&self, address: &str) -> bool {
        self.registry.is_defi_protocol(address)
    }

    pub fn is_sanctioned(&self, address: &str) -> bool {
        self.registry.is_sanctioned(address)
    }

    /// Standalone counterparty risk rating for one address
    pub fn risk_level_of(&self, address: &str) -> RiskLevel {
        self.registry.risk_level_of(address)
    }

    /// Confirmed incoming transfers for a wallet
    ///
    /// `min_amount` overrides the configured minimum for this call.
    pub async fn get_incoming_transfers(
        &self,
        wallet: &str,
        min_amount: Option<u128>,
    ) -> Result<Vec<Transfer>> {
        self.fetcher.fetch_incoming(wallet, min_amount).await
    }

    /// Run a full funding analysis for a wallet
    ///
    /// Fails fast on a malformed address, before any history is requested.
    /// Any upstream failure during traversal aborts the whole analysis.
    pub async fn analyze_funding_sources(&self, wallet: &str) -> Result<FundingAnalysisResult> {
        if !is_valid_address(wallet) {
            return Err(Error::InvalidAddress(wallet.to_string()));
        }
        let wallet_norm = normalize_address(wallet);
        info!(
            wallet = %wallet_norm,
            max_depth = self.config.max_depth,
            "Starting funding analysis"
        );

        let limits = TraversalLimits {
            max_depth: self.config.max_depth,
            max_funding_sources: self.config.max_funding_sources,
        };
        let outcome = FundingGraphBuilder::new(&self.fetcher, &self.registry, &self.events, limits)
            .build(&wallet_norm)
            .await?;

        let assessment = self.scorer.score(&outcome.sources);
        let summary = AnalysisSummary::from_sources(&outcome.sources);

        let result = FundingAnalysisResult {
            wallet_address: wallet_norm.clone(),
            funding_sources: outcome.sources,
            graph: outcome.graph,
            risk_score: assessment.score,
            risk_level: assessment.level,
            risk_factors: assessment.factors,
            summary,
            total_amount_traced: outcome.total_amount_traced,
            analyzed_at: Utc::now(),
        };

        info!(
            wallet = %wallet_norm,
            sources = result.funding_sources.len(),
            risk_score = result.risk_score,
            risk_level = %result.risk_level,
            "Funding analysis complete"
        );
        self.events
            .emit(TrackerEvent::AnalysisComplete(result.clone()));

        Ok(result)
    }

    /// Registry and configuration introspection
    pub fn get_stats(&self) -> TrackerStats {
        let registry = self.registry.stats();
        TrackerStats {
            known_exchanges: registry.exchanges,
            known_mixers: registry.mixers,
            known_defi_protocols: registry.defi_protocols,
            max_depth: self.config.max_depth,
            min_transfer_amount: self.config.min_transfer_amount,
        }
    }
}
