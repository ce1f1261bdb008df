//! CLI command implementations

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::events::TrackerEvent;
use crate::history::etherscan::EtherscanHistorySource;
use crate::tracker::FundingTracker;

fn build_tracker(config: &Config) -> Result<FundingTracker> {
    let source = Arc::new(EtherscanHistorySource::new(config.etherscan.clone()));
    let tracker = FundingTracker::new(config.tracker.clone(), source)?;
    Ok(tracker)
}

/// Run a full funding analysis for a wallet
pub async fn analyze(config: &Config, wallet: &str, json: bool) -> Result<()> {
    let tracker = build_tracker(config)?;
    let mut events = tracker.subscribe();

    info!("Analyzing funding sources for {}", wallet);
    let result = tracker.analyze_funding_sources(wallet).await?;

    // surface what the traversal flagged along the way
    while let Ok(event) = events.try_recv() {
        match event {
            TrackerEvent::MixerDetected(source) => {
                warn!(
                    "Mixer in funding path: {} ({}) at depth {}",
                    source.address, source.name, source.depth
                );
            }
            TrackerEvent::ExchangeDetected(source) => {
                info!(
                    "Exchange in funding path: {} ({}) at depth {}",
                    source.address, source.name, source.depth
                );
            }
            TrackerEvent::AnalysisComplete(_) => {}
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("\n=== FUNDING ANALYSIS ===\n");
    println!("{:<16} {}", "Wallet:", result.wallet_address);
    println!(
        "{:<16} {}/100 ({})",
        "Risk Score:", result.risk_score, result.risk_level
    );
    println!("{:<16} {}", "Sources:", result.funding_sources.len());
    println!(
        "{:<16} {} raw units",
        "Total Traced:", result.total_amount_traced
    );
    println!(
        "{:<16} {} nodes, {} edges (depth {})",
        "Graph:",
        result.graph.nodes.len(),
        result.graph.edges.len(),
        result.graph.max_depth_explored
    );
    println!(
        "{:<16} {}",
        "Analyzed At:",
        result.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if result.summary.has_sanctioned_source {
        println!("\n!!! SANCTIONED EXPOSURE !!!");
        for address in &result.summary.sanctioned_sources {
            println!("  {}", address);
        }
    }

    if !result.funding_sources.is_empty() {
        println!("\n=== FUNDING SOURCES ===\n");
        println!(
            "{:<44} {:<6} {:<10} {:<22} {:>6} {:>24}",
            "ADDRESS", "DEPTH", "TYPE", "NAME", "COUNT", "VALUE"
        );
        for source in &result.funding_sources {
            println!(
                "{:<44} {:<6} {:<10} {:<22} {:>6} {:>24}",
                source.address,
                source.depth,
                source.entity_type.to_string(),
                source.name,
                source.transfer_count,
                source.total_value_raw
            );
        }
    }

    if !result.risk_factors.is_empty() {
        println!("\n=== RISK FACTORS ===\n");
        for factor in &result.risk_factors {
            println!(
                "{:>3} pts  {:<24} {}",
                factor.points,
                factor.kind.to_string(),
                factor.source_address
            );
        }
    }

    println!();
    Ok(())
}

/// List confirmed incoming transfers for a wallet
pub async fn transfers(
    config: &Config,
    wallet: &str,
    min_amount: Option<u128>,
    limit: usize,
) -> Result<()> {
    let tracker = build_tracker(config)?;

    info!("Fetching incoming transfers for {}", wallet);
    let transfers = tracker.get_incoming_transfers(wallet, min_amount).await?;

    println!("\n=== INCOMING TRANSFERS ===\n");
    if transfers.is_empty() {
        println!("No confirmed incoming transfers found");
        return Ok(());
    }

    println!(
        "{:<66} {:<44} {:>24} {:<20}",
        "HASH", "FROM", "VALUE", "TIME"
    );
    for transfer in transfers.iter().take(limit) {
        println!(
            "{:<66} {:<44} {:>24} {:<20}",
            transfer.hash,
            transfer.from,
            transfer.value_raw,
            transfer.time().format("%Y-%m-%d %H:%M:%S")
        );
    }
    if transfers.len() > limit {
        println!("... and {} more", transfers.len() - limit);
    }

    println!("\nTotal: {} transfer(s)", transfers.len());
    Ok(())
}

/// Classify a single address against the entity registry
pub fn classify(config: &Config, address: &str) -> Result<()> {
    let tracker = build_tracker(config)?;

    println!("\n=== ADDRESS CLASSIFICATION ===\n");
    println!("{:<12} {}", "Address:", address);
    println!("{:<12} {}", "Class:", tracker.classify(address));
    match tracker.registry().lookup(address) {
        Some(entity) => {
            println!("{:<12} {}", "Name:", entity.name());
            println!("{:<12} {}", "Type:", entity.entity_type());
        }
        None => println!("{:<12} (no registry entry)", "Name:"),
    }
    println!(
        "{:<12} {}",
        "Sanctioned:",
        if tracker.is_sanctioned(address) {
            "YES"
        } else {
            "no"
        }
    );
    println!("{:<12} {}", "Risk Level:", tracker.risk_level_of(address));

    Ok(())
}

/// Show registry and tracker statistics
pub fn stats(config: &Config) -> Result<()> {
    let tracker = build_tracker(config)?;
    let stats = tracker.get_stats();

    println!("\n=== TRACKER STATS ===\n");
    println!("{:<24} {}", "Known Exchanges:", stats.known_exchanges);
    println!("{:<24} {}", "Known Mixers:", stats.known_mixers);
    println!(
        "{:<24} {}",
        "Known DeFi Protocols:", stats.known_defi_protocols
    );
    println!("{:<24} {}", "Max Depth:", stats.max_depth);
    println!(
        "{:<24} {}",
        "Min Transfer Amount:", stats.min_transfer_amount
    );

    Ok(())
}

/// Show current configuration with secrets masked
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
