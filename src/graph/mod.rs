//! Funding graph construction
//!
//! Depth-bounded breadth-first traversal over incoming transfer history.
//! Each level's frontier is fetched concurrently; consolidation and all
//! graph mutation happen serially on the single owner. One visited set
//! spans the whole traversal, so no address is expanded or counted twice
//! and cycles cannot recurse.

use futures::future::try_join_all;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::{EventBus, TrackerEvent};
use crate::history::TransferFetcher;
use crate::registry::EntityRegistry;
use crate::types::{
    is_valid_address, normalize_address, EntityClass, EntityType, FundingGraph, FundingSource,
    GraphEdge, GraphNode, UNKNOWN_NAME,
};

/// Traversal bounds
#[derive(Debug, Clone, Copy)]
pub struct TraversalLimits {
    /// Hops to explore below the target wallet
    pub max_depth: u32,
    /// Hard cap on consolidated sources per analysis
    pub max_funding_sources: usize,
}

/// Output of one traversal
#[derive(Debug, Clone)]
pub struct TraceOutcome {
    /// Consolidated sources ordered by (depth, address)
    pub sources: Vec<FundingSource>,
    pub graph: FundingGraph,
    /// Sum of value across all sources
    pub total_amount_traced: u128,
}

/// Value and transfer count accumulated on one graph edge
#[derive(Debug, Default)]
struct EdgeAccum {
    value: u128,
    count: u32,
}

/// All transfers from one origin into the current level
#[derive(Debug, Default)]
struct OriginAccum {
    total_value: u128,
    transfer_count: u32,
    /// Funded (parent) address -> accumulated edge
    edges: BTreeMap<String, EdgeAccum>,
}

/// Work-queue traversal over incoming transfer history
pub struct FundingGraphBuilder<'a> {
    fetcher: &'a TransferFetcher,
    registry: &'a EntityRegistry,
    events: &'a EventBus,
    limits: TraversalLimits,
}

impl<'a> FundingGraphBuilder<'a> {
    pub fn new(
        fetcher: &'a TransferFetcher,
        registry: &'a EntityRegistry,
        events: &'a EventBus,
        limits: TraversalLimits,
    ) -> Self {
        Self {
            fetcher,
            registry,
            events,
            limits,
        }
    }

    /// Trace funding for an already validated wallet address
    pub async fn build(&self, wallet: &str) -> Result<TraceOutcome> {
        let target = normalize_address(wallet);

        let mut graph = FundingGraph {
            target_wallet: target.clone(),
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            max_depth_explored: self.limits.max_depth,
        };
        graph.nodes.insert(target.clone(), self.node_for(&target));

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(target.clone());

        let mut sources: Vec<FundingSource> = Vec::new();
        let mut total_amount_traced: u128 = 0;
        let mut budget_exhausted = false;

        // Addresses whose funders the current level fetches
        let mut frontier: Vec<String> = vec![target.clone()];

        for depth in 0..self.limits.max_depth {
            if frontier.is_empty() || budget_exhausted {
                break;
            }
            debug!(depth, frontier = frontier.len(), "Exploring funding level");

            let fetches = frontier
                .iter()
                .map(|address| self.fetcher.fetch_incoming(address, None));
            let level = try_join_all(fetches).await?;

            // Consolidate the whole level per origin before emitting anything,
            // so an origin funding several frontier wallets yields one source
            let mut grouped: BTreeMap<String, OriginAccum> = BTreeMap::new();
            for (funded, transfers) in frontier.iter().zip(level) {
                for transfer in transfers {
                    let origin = normalize_address(&transfer.from);
                    if visited.contains(&origin) {
                        continue;
                    }
                    let accum = grouped.entry(origin).or_default();
                    accum.total_value = accum.total_value.saturating_add(transfer.value_raw);
                    accum.transfer_count += 1;
                    let edge = accum.edges.entry(funded.clone()).or_default();
                    edge.value = edge.value.saturating_add(transfer.value_raw);
                    edge.count += 1;
                }
            }

            let mut next_frontier = Vec::new();
            for (origin, accum) in grouped {
                if sources.len() >= self.limits.max_funding_sources {
                    warn!(
                        depth,
                        limit = self.limits.max_funding_sources,
                        "Funding source budget exhausted, stopping traversal"
                    );
                    budget_exhausted = true;
                    break;
                }
                visited.insert(origin.clone());

                let source = self.source_for(&origin, &accum, depth);
                total_amount_traced = total_amount_traced.saturating_add(source.total_value_raw);

                graph.nodes.insert(
                    origin.clone(),
                    GraphNode {
                        name: source.name.clone(),
                        entity_type: source.entity_type,
                        is_sanctioned: source.is_sanctioned,
                    },
                );
                for (funded, edge) in &accum.edges {
                    graph.edges.push(GraphEdge {
                        from: origin.clone(),
                        to: funded.clone(),
                        value_raw: edge.value,
                        transfer_count: edge.count,
                    });
                }

                self.announce(&source);
                // only well-formed origins can be fetched at the next level
                if is_valid_address(&origin) {
                    next_frontier.push(origin);
                }
                sources.push(source);
            }

            frontier = next_frontier;
        }

        debug!(
            wallet = %target,
            sources = sources.len(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Funding graph assembled"
        );

        Ok(TraceOutcome {
            sources,
            graph,
            total_amount_traced,
        })
    }

    /// Name, type, and sanctions status for an address
    fn classified(&self, address: &str) -> (String, EntityType, bool) {
        match self.registry.lookup(address) {
            Some(entity) => (
                entity.name().to_string(),
                entity.entity_type(),
                entity.is_sanctioned(),
            ),
            None => {
                let entity_type = if is_valid_address(address) {
                    EntityType::Eoa
                } else {
                    EntityType::Unknown
                };
                (UNKNOWN_NAME.to_string(), entity_type, false)
            }
        }
    }

    fn node_for(&self, address: &str) -> GraphNode {
        let (name, entity_type, is_sanctioned) = self.classified(address);
        GraphNode {
            name,
            entity_type,
            is_sanctioned,
        }
    }

    fn source_for(&self, origin: &str, accum: &OriginAccum, depth: u32) -> FundingSource {
        let (name, entity_type, is_sanctioned) = self.classified(origin);
        FundingSource {
            address: origin.to_string(),
            name,
            entity_type,
            total_value_raw: accum.total_value,
            transfer_count: accum.transfer_count,
            depth,
            is_sanctioned,
        }
    }

    fn announce(&self, source: &FundingSource) {
        match source.class() {
            EntityClass::Exchange => self
                .events
                .emit(TrackerEvent::ExchangeDetected(source.clone())),
            EntityClass::Mixer => self.events.emit(TrackerEvent::MixerDetected(source.clone())),
            EntityClass::Defi | EntityClass::Eoa | EntityClass::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::memory::MemoryHistorySource;
    use crate::types::Transfer;
    use std::sync::Arc;

    const WALLET: &str = "0x1000000000000000000000000000000000000001";
    const FUNDER_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const FUNDER_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    const FUNDER_C: &str = "0xcccccccccccccccccccccccccccccccccccccccc";
    const UPSTREAM_X: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";
    const BINANCE: &str = "0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be";
    const TORNADO_01: &str = "0x12d66f87a04a9e220743712ce6d9bb1b5616b8fc";

    fn transfer(hash: &str, from: &str, to: &str, value: u128) -> Transfer {
        Transfer {
            hash: hash.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            value_raw: value,
            timestamp: 1_700_000_000,
            succeeded: true,
        }
    }

    fn limits(max_depth: u32, max_funding_sources: usize) -> TraversalLimits {
        TraversalLimits {
            max_depth,
            max_funding_sources,
        }
    }

    async fn trace(source: MemoryHistorySource, limits: TraversalLimits) -> TraceOutcome {
        let fetcher = TransferFetcher::new(Arc::new(source), 0, 10);
        let registry = EntityRegistry::with_builtins();
        let events = EventBus::new();
        FundingGraphBuilder::new(&fetcher, &registry, &events, limits)
            .build(WALLET)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_wallet_yields_empty_outcome() {
        let outcome = trace(MemoryHistorySource::new(), limits(3, 50)).await;
        assert!(outcome.sources.is_empty());
        assert_eq!(outcome.total_amount_traced, 0);
        assert!(outcome.graph.edges.is_empty());
        // the target node is always present
        assert_eq!(outcome.graph.nodes.len(), 1);
        assert!(outcome.graph.nodes.contains_key(WALLET));
        assert_eq!(outcome.graph.max_depth_explored, 3);
    }

    #[tokio::test]
    async fn test_repeat_transfers_consolidate_into_one_source() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", FUNDER_A, WALLET, 100));
        source.insert(transfer("0x2", FUNDER_A, WALLET, 250));

        let outcome = trace(source, limits(3, 50)).await;
        assert_eq!(outcome.sources.len(), 1);
        let funding = &outcome.sources[0];
        assert_eq!(funding.address, FUNDER_A);
        assert_eq!(funding.total_value_raw, 350);
        assert_eq!(funding.transfer_count, 2);
        assert_eq!(funding.depth, 0);

        assert_eq!(outcome.graph.edges.len(), 1);
        let edge = &outcome.graph.edges[0];
        assert_eq!(edge.from, FUNDER_A);
        assert_eq!(edge.to, WALLET);
        assert_eq!(edge.value_raw, 350);
        assert_eq!(edge.transfer_count, 2);
        assert_eq!(outcome.total_amount_traced, 350);
    }

    #[tokio::test]
    async fn test_multi_hop_chain() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", FUNDER_B, WALLET, 100));
        source.insert(transfer("0x2", FUNDER_C, FUNDER_B, 50));

        let outcome = trace(source, limits(3, 50)).await;
        assert_eq!(outcome.sources.len(), 2);
        assert_eq!(outcome.sources[0].address, FUNDER_B);
        assert_eq!(outcome.sources[0].depth, 0);
        assert_eq!(outcome.sources[1].address, FUNDER_C);
        assert_eq!(outcome.sources[1].depth, 1);

        assert_eq!(outcome.graph.nodes.len(), 3);
        assert_eq!(outcome.graph.edges.len(), 2);
        assert_eq!(outcome.total_amount_traced, 150);
    }

    #[tokio::test]
    async fn test_max_depth_bounds_the_walk() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", FUNDER_B, WALLET, 100));
        source.insert(transfer("0x2", FUNDER_C, FUNDER_B, 50));

        let outcome = trace(source, limits(1, 50)).await;
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.sources[0].address, FUNDER_B);
        assert_eq!(outcome.graph.max_depth_explored, 1);
        assert!(!outcome.graph.nodes.contains_key(FUNDER_C));
    }

    #[tokio::test]
    async fn test_cycles_terminate() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", FUNDER_A, WALLET, 100));
        // the wallet itself funded its funder
        source.insert(transfer("0x2", WALLET, FUNDER_A, 40));

        let outcome = trace(source, limits(5, 50)).await;
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.sources[0].address, FUNDER_A);
        assert_eq!(outcome.graph.edges.len(), 1);
    }

    #[tokio::test]
    async fn test_self_transfer_produces_nothing() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", WALLET, WALLET, 100));

        let outcome = trace(source, limits(3, 50)).await;
        assert!(outcome.sources.is_empty());
        assert!(outcome.graph.edges.is_empty());
        assert_eq!(outcome.graph.nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_origin_becomes_leaf_source() {
        let mut source = MemoryHistorySource::new();
        // genesis-style row with a non-address sender
        source.insert(transfer("0x1", "GENESIS", WALLET, 100));
        source.insert(transfer("0x2", FUNDER_A, WALLET, 50));

        let outcome = trace(source, limits(3, 50)).await;
        assert_eq!(outcome.sources.len(), 2);

        let genesis = outcome
            .sources
            .iter()
            .find(|s| s.address == "genesis")
            .unwrap();
        assert_eq!(genesis.name, UNKNOWN_NAME);
        assert_eq!(genesis.entity_type, EntityType::Unknown);
        assert_eq!(genesis.depth, 0);
        assert!(outcome.graph.nodes.contains_key("genesis"));
        assert_eq!(outcome.graph.edges.len(), 2);
        assert_eq!(outcome.total_amount_traced, 150);
    }

    #[tokio::test]
    async fn test_shared_upstream_consolidates_across_parents() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", FUNDER_A, WALLET, 100));
        source.insert(transfer("0x2", FUNDER_B, WALLET, 100));
        source.insert(transfer("0x3", UPSTREAM_X, FUNDER_A, 30));
        source.insert(transfer("0x4", UPSTREAM_X, FUNDER_B, 70));

        let outcome = trace(source, limits(3, 50)).await;
        assert_eq!(outcome.sources.len(), 3);

        let upstream = outcome
            .sources
            .iter()
            .find(|s| s.address == UPSTREAM_X)
            .unwrap();
        assert_eq!(upstream.depth, 1);
        assert_eq!(upstream.total_value_raw, 100);
        assert_eq!(upstream.transfer_count, 2);

        // one edge per funded parent
        let upstream_edges: Vec<&GraphEdge> = outcome
            .graph
            .edges
            .iter()
            .filter(|e| e.from == UPSTREAM_X)
            .collect();
        assert_eq!(upstream_edges.len(), 2);
        assert_eq!(outcome.total_amount_traced, 300);
    }

    #[tokio::test]
    async fn test_source_budget_truncates() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", FUNDER_A, WALLET, 100));
        source.insert(transfer("0x2", FUNDER_B, WALLET, 100));
        source.insert(transfer("0x3", FUNDER_C, WALLET, 100));

        let outcome = trace(source, limits(3, 2)).await;
        assert_eq!(outcome.sources.len(), 2);
        // origins are emitted in address order, so the first two stay
        assert_eq!(outcome.sources[0].address, FUNDER_A);
        assert_eq!(outcome.sources[1].address, FUNDER_B);
        assert_eq!(outcome.graph.max_depth_explored, 3);
    }

    #[tokio::test]
    async fn test_known_entities_are_classified_and_announced() {
        let mut source = MemoryHistorySource::new();
        source.insert(transfer("0x1", BINANCE, WALLET, 500));
        source.insert(transfer("0x2", TORNADO_01, WALLET, 900));

        let fetcher = TransferFetcher::new(Arc::new(source), 0, 10);
        let registry = EntityRegistry::with_builtins();
        let events = EventBus::new();
        let mut observer = events.subscribe();

        let outcome = FundingGraphBuilder::new(&fetcher, &registry, &events, limits(2, 50))
            .build(WALLET)
            .await
            .unwrap();

        let tornado = outcome
            .sources
            .iter()
            .find(|s| s.address == TORNADO_01)
            .unwrap();
        assert!(tornado.is_sanctioned);
        assert_eq!(tornado.name, "Tornado Cash: 0.1 ETH");
        assert_eq!(tornado.entity_type, EntityType::Mixer);

        let binance = outcome
            .sources
            .iter()
            .find(|s| s.address == BINANCE)
            .unwrap();
        assert_eq!(binance.entity_type, EntityType::Cex);

        let mut saw_exchange = false;
        let mut saw_mixer = false;
        while let Ok(event) = observer.try_recv() {
            match event {
                TrackerEvent::ExchangeDetected(s) => {
                    saw_exchange = true;
                    assert_eq!(s.address, BINANCE);
                }
                TrackerEvent::MixerDetected(s) => {
                    saw_mixer = true;
                    assert_eq!(s.address, TORNADO_01);
                }
                TrackerEvent::AnalysisComplete(_) => {}
            }
        }
        assert!(saw_exchange);
        assert!(saw_mixer);
    }

    #[tokio::test]
    async fn test_ordering_is_depth_then_address() {
        let mut source = MemoryHistorySource::new();
        // inserted out of address order on purpose
        source.insert(transfer("0x1", FUNDER_C, WALLET, 10));
        source.insert(transfer("0x2", FUNDER_A, WALLET, 10));
        source.insert(transfer("0x3", FUNDER_B, WALLET, 10));
        source.insert(transfer("0x4", UPSTREAM_X, FUNDER_B, 10));

        let outcome = trace(source, limits(2, 50)).await;
        let order: Vec<(&str, u32)> = outcome
            .sources
            .iter()
            .map(|s| (s.address.as_str(), s.depth))
            .collect();
        assert_eq!(
            order,
            vec![
                (FUNDER_A, 0),
                (FUNDER_B, 0),
                (FUNDER_C, 0),
                (UPSTREAM_X, 1)
            ]
        );
    }
}
