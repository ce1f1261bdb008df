//! Built-in known-entity tables
//!
//! Addresses are stored lowercase. Sanctions flags follow the OFAC SDN
//! designation of Tornado Cash from August 2022.

use std::collections::HashMap;

use crate::types::{DefiCategory, KnownEntity, TrustLevel};

fn exchange(name: &str, trust: TrustLevel) -> KnownEntity {
    KnownEntity::Exchange {
        name: name.to_string(),
        trust,
    }
}

fn mixer(name: &str, sanctioned: bool) -> KnownEntity {
    KnownEntity::Mixer {
        name: name.to_string(),
        privacy: false,
        sanctioned,
    }
}

fn privacy(name: &str) -> KnownEntity {
    KnownEntity::Mixer {
        name: name.to_string(),
        privacy: true,
        sanctioned: false,
    }
}

fn defi(name: &str, category: DefiCategory, trust: TrustLevel) -> KnownEntity {
    KnownEntity::Defi {
        name: name.to_string(),
        category,
        trust,
    }
}

lazy_static::lazy_static! {
    /// Built-in registry entries keyed by lowercase address
    pub static ref BUILTIN_ENTITIES: HashMap<&'static str, KnownEntity> = {
        let mut m = HashMap::new();

        // Centralized exchange hot wallets
        m.insert("0x3f5ce5fbfe3e9af3971dd833d26ba9b5c936f0be", exchange("Binance", TrustLevel::High));
        m.insert("0xd551234ae421e3bcba99a0da6d736074f22192ff", exchange("Binance", TrustLevel::High));
        m.insert("0x28c6c06298d514db089934071355e5743bf21d60", exchange("Binance", TrustLevel::High));
        m.insert("0x71660c4005ba85c37ccec55d0c4493e66fe775d3", exchange("Coinbase", TrustLevel::High));
        m.insert("0x503828976d22510aad0201ac7ec88293211d23da", exchange("Coinbase", TrustLevel::High));
        m.insert("0x2910543af39aba0cd09dbb2d50200b3e800a63d2", exchange("Kraken", TrustLevel::High));
        m.insert("0x876eabf441b2ee5b5b0554fd502a8e0600950cfa", exchange("Bitfinex", TrustLevel::High));
        m.insert("0x6cc5f688a315f3dc28a7781717a9a798a59fda7b", exchange("OKX", TrustLevel::High));
        m.insert("0xab5c66752a9e8167967685f1450532fb96d5d24f", exchange("Huobi", TrustLevel::High));
        m.insert("0x2b5634c42055806a59e9107ed44d43c426e58258", exchange("KuCoin", TrustLevel::High));
        m.insert("0xd24400ae8bfebb18ca49be86258a3c749cf46853", exchange("Gemini", TrustLevel::High));
        m.insert("0xfbb1b73c4f0bda4f67dca266ce6ef42f520fbb98", exchange("Bittrex", TrustLevel::High));

        // Tornado Cash pools and router (OFAC sanctioned)
        m.insert("0x12d66f87a04a9e220743712ce6d9bb1b5616b8fc", mixer("Tornado Cash: 0.1 ETH", true));
        m.insert("0x47ce0c6ed5b0ce3d3a51fdb1c52dc66a7c3c2936", mixer("Tornado Cash: 1 ETH", true));
        m.insert("0x910cbd523d972eb0a6f4cae4618ad62622b39dbf", mixer("Tornado Cash: 10 ETH", true));
        m.insert("0xa160cdab225685da1d56aa342ad8841c3b53f291", mixer("Tornado Cash: 100 ETH", true));
        m.insert("0xd90e2f925da726b50c4ed8d0fb90ad053324f31b", mixer("Tornado Cash: Router", true));

        // Privacy protocols, not sanctioned
        m.insert("0xfa7093cdd9ee6932b4eb2c9e1cde7ce00b1fa4b9", privacy("Railgun"));
        m.insert("0xff1f2b4adb9df6fc8eafecdcbf96a2b351680455", privacy("Aztec"));

        // DEX routers and pools
        m.insert("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", defi("Uniswap V2 Router", DefiCategory::Dex, TrustLevel::High));
        m.insert("0xe592427a0aece92de3edee1f18e0157c05861564", defi("Uniswap V3 Router", DefiCategory::Dex, TrustLevel::High));
        m.insert("0xd9e1ce17f2641f24ae83637ab66a2cca9c378b9f", defi("SushiSwap Router", DefiCategory::Dex, TrustLevel::High));
        m.insert("0xbebc44782c7db0a1a60cb6fe97d0b483032ff1c7", defi("Curve 3pool", DefiCategory::Dex, TrustLevel::High));
        m.insert("0x1111111254fb6c44bac0bed2854e76f90643097d", defi("1inch Router", DefiCategory::Dex, TrustLevel::High));

        // Lending pools
        m.insert("0x7d2768de32b0b80b7a3454c06bdac94a69ddc7a9", defi("Aave V2 Pool", DefiCategory::Lending, TrustLevel::High));
        m.insert("0x4ddc2d193948926d02f9b1fe9e1daa0718270ed5", defi("Compound cETH", DefiCategory::Lending, TrustLevel::High));

        // Cross-chain bridges
        m.insert("0xa0c68c638235ee32657e8f720a23cec1bfc77c77", defi("Polygon PoS Bridge", DefiCategory::Bridge, TrustLevel::High));
        m.insert("0x8315177ab297ba92a06054ce80a67ed4dbd7ed3a", defi("Arbitrum One Bridge", DefiCategory::Bridge, TrustLevel::High));
        m.insert("0x99c9fc46f92e8a1c0dec1b1747d010903e884be1", defi("Optimism Gateway", DefiCategory::Bridge, TrustLevel::High));
        m.insert("0x3ee18b2214aff97000d974cf647e7c347e8fa585", defi("Wormhole Token Bridge", DefiCategory::Bridge, TrustLevel::Medium));

        m
    };
}
