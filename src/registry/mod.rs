//! Known-entity registry and address classification
//!
//! Lookups are case-insensitive: every address is normalized before it
//! touches the underlying table. Caller-supplied overrides are merged over
//! the built-in entries at construction and win on collision.

mod builtin;

pub use builtin::BUILTIN_ENTITIES;

use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{
    is_valid_address, normalize_address, DefiCategory, EntityClass, KnownEntity, RiskLevel,
    TrustLevel,
};

/// Per-family counts of registered entities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub exchanges: usize,
    pub mixers: usize,
    pub defi_protocols: usize,
}

/// Override record for an exchange address
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExchangeEntry {
    pub name: String,
    #[serde(default = "default_trust")]
    pub trust: TrustLevel,
}

/// Override record for a mixer or privacy protocol address
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MixerEntry {
    pub name: String,
    #[serde(default)]
    pub privacy: bool,
    #[serde(default)]
    pub sanctioned: bool,
}

/// Override record for a DeFi protocol address
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DefiEntry {
    pub name: String,
    pub category: DefiCategory,
    #[serde(default = "default_trust")]
    pub trust: TrustLevel,
}

fn default_trust() -> TrustLevel {
    TrustLevel::High
}

impl ExchangeEntry {
    fn to_entity(&self) -> KnownEntity {
        KnownEntity::Exchange {
            name: self.name.clone(),
            trust: self.trust,
        }
    }
}

impl MixerEntry {
    fn to_entity(&self) -> KnownEntity {
        KnownEntity::Mixer {
            name: self.name.clone(),
            privacy: self.privacy,
            sanctioned: self.sanctioned,
        }
    }
}

impl DefiEntry {
    fn to_entity(&self) -> KnownEntity {
        KnownEntity::Defi {
            name: self.name.clone(),
            category: self.category,
            trust: self.trust,
        }
    }
}

/// Caller-supplied registry additions, merged over the built-in tables
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RegistryOverrides {
    #[serde(default)]
    pub additional_exchanges: HashMap<String, ExchangeEntry>,
    #[serde(default)]
    pub additional_mixers: HashMap<String, MixerEntry>,
    #[serde(default)]
    pub additional_defi_protocols: HashMap<String, DefiEntry>,
}

impl RegistryOverrides {
    /// Add an exchange address
    pub fn exchange(mut self, address: &str, name: &str, trust: TrustLevel) -> Self {
        self.additional_exchanges.insert(
            address.to_string(),
            ExchangeEntry {
                name: name.to_string(),
                trust,
            },
        );
        self
    }

    /// Add a classic mixer address
    pub fn mixer(mut self, address: &str, name: &str, sanctioned: bool) -> Self {
        self.additional_mixers.insert(
            address.to_string(),
            MixerEntry {
                name: name.to_string(),
                privacy: false,
                sanctioned,
            },
        );
        self
    }

    /// Add a privacy protocol address
    pub fn privacy_protocol(mut self, address: &str, name: &str) -> Self {
        self.additional_mixers.insert(
            address.to_string(),
            MixerEntry {
                name: name.to_string(),
                privacy: true,
                sanctioned: false,
            },
        );
        self
    }

    /// Add a DeFi protocol address
    pub fn defi_protocol(
        mut self,
        address: &str,
        name: &str,
        category: DefiCategory,
        trust: TrustLevel,
    ) -> Self {
        self.additional_defi_protocols.insert(
            address.to_string(),
            DefiEntry {
                name: name.to_string(),
                category,
                trust,
            },
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of override records
    pub fn len(&self) -> usize {
        self.additional_exchanges.len()
            + self.additional_mixers.len()
            + self.additional_defi_protocols.len()
    }
}

/// Address classification registry
#[derive(Debug, Clone)]
pub struct EntityRegistry {
    entries: HashMap<String, KnownEntity>,
    stats: RegistryStats,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl EntityRegistry {
    /// Registry seeded with the built-in entity tables
    pub fn with_builtins() -> Self {
        Self::from_overrides(&RegistryOverrides::default())
    }

    /// Registry seeded with builtins plus caller-supplied additions
    pub fn from_overrides(overrides: &RegistryOverrides) -> Self {
        let mut entries: HashMap<String, KnownEntity> = BUILTIN_ENTITIES
            .iter()
            .map(|(address, entity)| ((*address).to_string(), entity.clone()))
            .collect();

        for (address, entry) in &overrides.additional_exchanges {
            entries.insert(normalize_address(address), entry.to_entity());
        }
        for (address, entry) in &overrides.additional_mixers {
            entries.insert(normalize_address(address), entry.to_entity());
        }
        for (address, entry) in &overrides.additional_defi_protocols {
            entries.insert(normalize_address(address), entry.to_entity());
        }

        let mut stats = RegistryStats::default();
        for entity in entries.values() {
            match entity.class() {
                EntityClass::Exchange => stats.exchanges += 1,
                EntityClass::Mixer => stats.mixers += 1,
                EntityClass::Defi => stats.defi_protocols += 1,
                EntityClass::Eoa | EntityClass::Unknown => {}
            }
        }

        if !overrides.is_empty() {
            debug!(additions = overrides.len(), "Applied registry overrides");
        }

        Self { entries, stats }
    }

    /// Look up the registry record for an address
    pub fn lookup(&self, address: &str) -> Option<&KnownEntity> {
        self.entries.get(&normalize_address(address))
    }

    /// Classify an address into its family
    pub fn classify(&self, address: &str) -> EntityClass {
        match self.lookup(address) {
            Some(entity) => entity.class(),
            None if is_valid_address(address) => EntityClass::Eoa,
            None => EntityClass::Unknown,
        }
    }

    pub fn is_exchange(&self, address: &str) -> bool {
        self.classify(address) == EntityClass::Exchange
    }

    pub fn is_mixer(&self, address: &str) -> bool {
        self.classify(address) == EntityClass::Mixer
    }

    pub fn is_defi_protocol(&self, address: &str) -> bool {
        self.classify(address) == EntityClass::Defi
    }

    /// Whether an address belongs to a sanctioned entity
    pub fn is_sanctioned(&self, address: &str) -> bool {
        self.lookup(address)
            .map(|entity| entity.is_sanctioned())
            .unwrap_or(false)
    }

    /// Standalone counterparty risk rating for a single address
    ///
    /// Sanctions dominate everything else. Mixers and privacy protocols rate
    /// high, trusted exchanges and DeFi protocols low, and anything the
    /// registry has never heard of rates medium.
    pub fn risk_level_of(&self, address: &str) -> RiskLevel {
        if address.trim().is_empty() {
            return RiskLevel::None;
        }
        match self.lookup(address) {
            Some(entity) if entity.is_sanctioned() => RiskLevel::Critical,
            Some(KnownEntity::Mixer { .. }) => RiskLevel::High,
            Some(KnownEntity::Exchange { trust, .. } | KnownEntity::Defi { trust, .. }) => {
                if *trust == TrustLevel::High {
                    RiskLevel::Low
                } else {
                    RiskLevel::Medium
                }
            }
            None => RiskLevel::Medium,
        }
    }

    /// Per-family entity counts
    pub fn stats(&self) -> RegistryStats {
        self.stats
    }

    /// Total number of registered addresses
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BINANCE: &str = "0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be";
    const TORNADO_01: &str = "0x12d66f87a04a9e220743712ce6d9bb1b5616b8fc";
    const RAILGUN: &str = "0xfa7093cdd9ee6932b4eb2c9e1cde7ce00b1fa4b9";
    const UNISWAP_V2: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
    const WORMHOLE: &str = "0x3ee18b2214aff97000d974cf647e7c347e8fa585";
    const NOBODY: &str = "0x1234567890123456789012345678901234567890";

    #[test]
    fn test_classify_builtins() {
        let registry = EntityRegistry::with_builtins();
        assert_eq!(registry.classify(BINANCE), EntityClass::Exchange);
        assert_eq!(registry.classify(TORNADO_01), EntityClass::Mixer);
        assert_eq!(registry.classify(RAILGUN), EntityClass::Mixer);
        assert_eq!(registry.classify(UNISWAP_V2), EntityClass::Defi);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let registry = EntityRegistry::with_builtins();
        assert_eq!(
            registry.classify(&BINANCE.to_uppercase()),
            EntityClass::Exchange
        );
        assert_eq!(
            registry.classify(&format!("  {}  ", TORNADO_01)),
            EntityClass::Mixer
        );
    }

    #[test]
    fn test_classify_unregistered() {
        let registry = EntityRegistry::with_builtins();
        assert_eq!(registry.classify(NOBODY), EntityClass::Eoa);
        assert_eq!(registry.classify("not an address"), EntityClass::Unknown);
        assert_eq!(registry.classify(""), EntityClass::Unknown);
    }

    #[test]
    fn test_family_predicates() {
        let registry = EntityRegistry::with_builtins();
        assert!(registry.is_exchange(BINANCE));
        assert!(!registry.is_exchange(TORNADO_01));
        assert!(registry.is_mixer(TORNADO_01));
        assert!(registry.is_mixer(RAILGUN));
        assert!(registry.is_defi_protocol(UNISWAP_V2));
        assert!(!registry.is_defi_protocol(NOBODY));
    }

    #[test]
    fn test_is_sanctioned() {
        let registry = EntityRegistry::with_builtins();
        assert!(registry.is_sanctioned(TORNADO_01));
        assert!(registry.is_sanctioned(&TORNADO_01.to_uppercase()));
        assert!(!registry.is_sanctioned(RAILGUN));
        assert!(!registry.is_sanctioned(BINANCE));
        assert!(!registry.is_sanctioned(NOBODY));
    }

    #[test]
    fn test_risk_level_of() {
        let registry = EntityRegistry::with_builtins();
        assert_eq!(registry.risk_level_of(TORNADO_01), RiskLevel::Critical);
        assert_eq!(registry.risk_level_of(RAILGUN), RiskLevel::High);
        assert_eq!(registry.risk_level_of(BINANCE), RiskLevel::Low);
        assert_eq!(registry.risk_level_of(UNISWAP_V2), RiskLevel::Low);
        // medium-trust bridge rates medium
        assert_eq!(registry.risk_level_of(WORMHOLE), RiskLevel::Medium);
        assert_eq!(registry.risk_level_of(NOBODY), RiskLevel::Medium);
        assert_eq!(registry.risk_level_of(""), RiskLevel::None);
        assert_eq!(registry.risk_level_of("   "), RiskLevel::None);
    }

    #[test]
    fn test_overrides_add_entries() {
        let overrides = RegistryOverrides::default()
            .exchange(
                "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
                "TestEx",
                TrustLevel::High,
            )
            .mixer(
                "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
                "TestMix",
                true,
            );
        let registry = EntityRegistry::from_overrides(&overrides);

        // override addresses are normalized before insertion
        let added = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        assert!(registry.is_exchange(added));
        assert_eq!(registry.lookup(added).unwrap().name(), "TestEx");
        assert!(registry.is_sanctioned("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"));

        let base = EntityRegistry::with_builtins();
        assert_eq!(registry.stats().exchanges, base.stats().exchanges + 1);
        assert_eq!(registry.stats().mixers, base.stats().mixers + 1);
    }

    #[test]
    fn test_overrides_win_on_collision() {
        // reclassify a builtin exchange address as a sanctioned mixer
        let overrides = RegistryOverrides::default().mixer(BINANCE, "Fake Binance", true);
        let registry = EntityRegistry::from_overrides(&overrides);

        assert!(registry.is_mixer(BINANCE));
        assert!(registry.is_sanctioned(BINANCE));
        assert_eq!(registry.lookup(BINANCE).unwrap().name(), "Fake Binance");

        let base = EntityRegistry::with_builtins();
        assert_eq!(registry.len(), base.len());
        assert_eq!(registry.stats().exchanges, base.stats().exchanges - 1);
        assert_eq!(registry.stats().mixers, base.stats().mixers + 1);
    }

    #[test]
    fn test_overrides_deserialize() {
        let overrides: RegistryOverrides = serde_json::from_str(
            r#"{
                "additional_exchanges": {
                    "0xcccccccccccccccccccccccccccccccccccccccc": {"name": "LocalEx"}
                },
                "additional_defi_protocols": {
                    "0xdddddddddddddddddddddddddddddddddddddddd": {
                        "name": "LocalSwap",
                        "category": "dex",
                        "trust": "medium"
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(overrides.len(), 2);
        let registry = EntityRegistry::from_overrides(&overrides);
        // trust defaults to high when omitted
        assert_eq!(
            registry.risk_level_of("0xcccccccccccccccccccccccccccccccccccccccc"),
            RiskLevel::Low
        );
        assert_eq!(
            registry.risk_level_of("0xdddddddddddddddddddddddddddddddddddddddd"),
            RiskLevel::Medium
        );
    }
}
