//! Core data types shared across the funding tracker

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Display name used for addresses with no registry entry
pub const UNKNOWN_NAME: &str = "unknown";

/// Normalize an address for lookups and comparisons
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Check whether a string is a well-formed 0x-prefixed 20-byte hex address
pub fn is_valid_address(address: &str) -> bool {
    let bytes = address.trim().as_bytes();
    if bytes.len() != 42 {
        return false;
    }
    if bytes[0] != b'0' || (bytes[1] != b'x' && bytes[1] != b'X') {
        return false;
    }
    bytes[2..].iter().all(|b| b.is_ascii_hexdigit())
}

/// Deserialize a raw on-chain amount from either an integer or a decimal string
pub fn de_raw_amount<'de, D>(deserializer: D) -> std::result::Result<u128, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct RawAmount;

    impl<'de> serde::de::Visitor<'de> for RawAmount {
        type Value = u128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or a decimal string")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<u128, E> {
            Ok(u128::from(v))
        }

        fn visit_u128<E: serde::de::Error>(self, v: u128) -> std::result::Result<u128, E> {
            Ok(v)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom(format!("negative raw amount {}", v)))
        }

        fn visit_i128<E: serde::de::Error>(self, v: i128) -> std::result::Result<u128, E> {
            u128::try_from(v).map_err(|_| E::custom(format!("negative raw amount {}", v)))
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<u128, E> {
            v.trim()
                .parse::<u128>()
                .map_err(|e| E::custom(format!("invalid raw amount {:?}: {}", v, e)))
        }
    }

    deserializer.deserialize_any(RawAmount)
}

// ============ Entity Classification ============

/// Coarse classification family an address falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Exchange,
    Mixer,
    Defi,
    /// Well-formed address with no registry entry
    Eoa,
    /// Not recognized (including malformed input)
    Unknown,
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityClass::Exchange => "exchange",
            EntityClass::Mixer => "mixer",
            EntityClass::Defi => "defi",
            EntityClass::Eoa => "eoa",
            EntityClass::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Fine-grained entity type attached to nodes and sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Cex,
    Dex,
    Mixer,
    Privacy,
    Bridge,
    Lending,
    Eoa,
    Unknown,
}

impl EntityType {
    /// Classification family this type belongs to
    pub fn class(&self) -> EntityClass {
        match self {
            EntityType::Cex => EntityClass::Exchange,
            EntityType::Dex | EntityType::Bridge | EntityType::Lending => EntityClass::Defi,
            EntityType::Mixer | EntityType::Privacy => EntityClass::Mixer,
            EntityType::Eoa => EntityClass::Eoa,
            EntityType::Unknown => EntityClass::Unknown,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::Cex => "cex",
            EntityType::Dex => "dex",
            EntityType::Mixer => "mixer",
            EntityType::Privacy => "privacy",
            EntityType::Bridge => "bridge",
            EntityType::Lending => "lending",
            EntityType::Eoa => "eoa",
            EntityType::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Operational trust placed in a registered entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrustLevel::Low => "low",
            TrustLevel::Medium => "medium",
            TrustLevel::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// Which corner of DeFi a protocol address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefiCategory {
    Dex,
    Bridge,
    Lending,
}

/// Registry record for a known on-chain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum KnownEntity {
    Exchange {
        name: String,
        trust: TrustLevel,
    },
    Mixer {
        name: String,
        /// Privacy protocol rather than a classic tumbler
        privacy: bool,
        sanctioned: bool,
    },
    Defi {
        name: String,
        category: DefiCategory,
        trust: TrustLevel,
    },
}

impl KnownEntity {
    /// Human-readable entity name
    pub fn name(&self) -> &str {
        match self {
            KnownEntity::Exchange { name, .. }
            | KnownEntity::Mixer { name, .. }
            | KnownEntity::Defi { name, .. } => name,
        }
    }

    /// Classification family of this record
    pub fn class(&self) -> EntityClass {
        match self {
            KnownEntity::Exchange { .. } => EntityClass::Exchange,
            KnownEntity::Mixer { .. } => EntityClass::Mixer,
            KnownEntity::Defi { .. } => EntityClass::Defi,
        }
    }

    /// Fine-grained type for graph nodes and sources
    pub fn entity_type(&self) -> EntityType {
        match self {
            KnownEntity::Exchange { .. } => EntityType::Cex,
            KnownEntity::Mixer { privacy, .. } => {
                if *privacy {
                    EntityType::Privacy
                } else {
                    EntityType::Mixer
                }
            }
            KnownEntity::Defi { category, .. } => match category {
                DefiCategory::Dex => EntityType::Dex,
                DefiCategory::Bridge => EntityType::Bridge,
                DefiCategory::Lending => EntityType::Lending,
            },
        }
    }

    /// Whether the entity appears on a sanctions list
    pub fn is_sanctioned(&self) -> bool {
        matches!(self, KnownEntity::Mixer { sanctioned: true, .. })
    }

    /// Trust level, where the family carries one
    pub fn trust(&self) -> Option<TrustLevel> {
        match self {
            KnownEntity::Exchange { trust, .. } | KnownEntity::Defi { trust, .. } => Some(*trust),
            KnownEntity::Mixer { .. } => None,
        }
    }
}

// ============ Risk Levels ============

/// Discrete risk bucket derived from the numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

// ============ Transfers ============

/// One confirmed value transfer between two addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Transaction hash
    pub hash: String,
    /// Sending address
    pub from: String,
    /// Receiving address
    pub to: String,
    /// Transferred value in the smallest on-chain unit
    pub value_raw: u128,
    /// Block timestamp (unix seconds)
    pub timestamp: i64,
    /// Whether the transaction executed without error
    pub succeeded: bool,
}

impl Transfer {
    /// Block time as a UTC datetime, clamped to epoch on out-of-range values
    pub fn time(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp, 0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }
}

// ============ Funding Sources ============

/// One consolidated origin of funds discovered during traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSource {
    /// Normalized origin address
    pub address: String,
    /// Registry name, or "unknown"
    pub name: String,
    /// Fine-grained entity type
    pub entity_type: EntityType,
    /// Sum of all transfer values from this origin at this depth
    pub total_value_raw: u128,
    /// Number of transfers folded into this source
    pub transfer_count: u32,
    /// Hop distance from the analyzed wallet (0 = direct funder)
    pub depth: u32,
    /// Whether the origin is a sanctioned entity
    pub is_sanctioned: bool,
}

impl FundingSource {
    /// Classification family of this source
    pub fn class(&self) -> EntityClass {
        self.entity_type.class()
    }
}

// ============ Funding Graph ============

/// Node metadata in the funding graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub name: String,
    pub entity_type: EntityType,
    pub is_sanctioned: bool,
}

/// Directed flow of value between two graph nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Origin address the value came from
    pub from: String,
    /// Address the value went to
    pub to: String,
    /// Combined value across all transfers on this edge
    pub value_raw: u128,
    /// Number of transfers folded into this edge
    pub transfer_count: u32,
}

/// Provenance graph assembled by one analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingGraph {
    /// Wallet the analysis was run for
    pub target_wallet: String,
    /// Address -> node metadata, ordered for stable output
    pub nodes: BTreeMap<String, GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Depth ceiling the traversal was configured with
    pub max_depth_explored: u32,
}

// ============ Risk Factors ============

/// Why a funding source contributed risk points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorKind {
    SanctionedSource,
    MixerSource,
    UnknownDeepSource,
    UnknownSource,
}

impl fmt::Display for RiskFactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskFactorKind::SanctionedSource => "sanctioned source",
            RiskFactorKind::MixerSource => "mixer source",
            RiskFactorKind::UnknownDeepSource => "unknown source (deep)",
            RiskFactorKind::UnknownSource => "unknown source (direct)",
        };
        write!(f, "{}", s)
    }
}

/// One scored contribution to the overall risk score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: RiskFactorKind,
    pub points: u32,
    /// Address of the source that triggered this factor
    pub source_address: String,
}

// ============ Analysis Results ============

/// Aggregate view over the discovered funding sources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Source counts grouped by classification family
    pub sources_by_type: BTreeMap<EntityClass, u32>,
    /// Distinct exchange names involved
    pub exchanges: Vec<String>,
    /// Distinct mixer and privacy protocol names involved
    pub mixers: Vec<String>,
    /// Distinct DeFi protocol names involved
    pub defi_protocols: Vec<String>,
    pub has_sanctioned_source: bool,
    /// Addresses of sanctioned sources, in discovery order
    pub sanctioned_sources: Vec<String>,
}

impl AnalysisSummary {
    /// Build the summary from a consolidated source list
    pub fn from_sources(sources: &[FundingSource]) -> Self {
        let mut summary = AnalysisSummary::default();
        for source in sources {
            *summary.sources_by_type.entry(source.class()).or_insert(0) += 1;
            match source.class() {
                EntityClass::Exchange => push_unique(&mut summary.exchanges, &source.name),
                EntityClass::Mixer => push_unique(&mut summary.mixers, &source.name),
                EntityClass::Defi => push_unique(&mut summary.defi_protocols, &source.name),
                EntityClass::Eoa | EntityClass::Unknown => {}
            }
            if source.is_sanctioned {
                summary.has_sanctioned_source = true;
                summary.sanctioned_sources.push(source.address.clone());
            }
        }
        summary
    }
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

/// Complete output of one funding analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingAnalysisResult {
    /// Normalized analyzed wallet
    pub wallet_address: String,
    /// Consolidated sources ordered by (depth, address)
    pub funding_sources: Vec<FundingSource>,
    pub graph: FundingGraph,
    /// Clamped risk score in 0..=100
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<RiskFactor>,
    pub summary: AnalysisSummary,
    /// Sum of value across all funding sources
    pub total_amount_traced: u128,
    /// Wall-clock completion time
    pub analyzed_at: DateTime<Utc>,
}

/// Registry and configuration introspection snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    pub known_exchanges: usize,
    pub known_mixers: usize,
    pub known_defi_protocols: usize,
    pub max_depth: u32,
    pub min_transfer_amount: u128,
}
