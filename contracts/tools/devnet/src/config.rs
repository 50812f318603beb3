//! Per-network deployment parameters, keyed by chain id.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use alloy_primitives::{address, b256, Address, B256, U256};
use millionaire_types::{
    network::DEVELOPMENT_CHAINS, NetworkContext, LOCAL_CHAIN_ID,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing network configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 0.01 ETH.
pub const DEFAULT_ENTRANCE_FEE: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);

/// Deployment parameters for one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub name: String,
    /// Live coordinator; development chains use the mock instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vrf_coordinator_v2: Option<Address>,
    /// Decimal ether amount in JSON (eg, `"0.01"`).
    #[serde(with = "ether")]
    pub entrance_fee: U256,
    pub gas_lane: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<u64>,
    pub callback_gas_limit: u32,
    /// Seconds between draws.
    pub interval: u64,
}

/// Signer indexes behind `getNamedAccounts()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedAccountIndexes {
    pub deployer: usize,
    pub player: usize,
}

impl Default for NamedAccountIndexes {
    fn default() -> Self {
        Self {
            deployer: 0,
            player: 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
    pub networks: BTreeMap<u64, NetworkConfig>,
    pub development_chains: Vec<String>,
    pub named_accounts: NamedAccountIndexes,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let entrance_fee = DEFAULT_ENTRANCE_FEE;
        let mut networks = BTreeMap::new();
        networks.insert(
            LOCAL_CHAIN_ID,
            NetworkConfig {
                name: "hardhat".to_string(),
                vrf_coordinator_v2: None,
                entrance_fee,
                gas_lane: b256!("d89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc"),
                subscription_id: None,
                callback_gas_limit: 500_000,
                interval: 30,
            },
        );
        networks.insert(
            11155111,
            NetworkConfig {
                name: "sepolia".to_string(),
                vrf_coordinator_v2: Some(address!("8103B0A8A00be2DDC778e6e7eaa21791Cd364625")),
                entrance_fee,
                gas_lane: b256!("474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c"),
                subscription_id: Some(6926),
                callback_gas_limit: 500_000,
                interval: 30,
            },
        );
        Self {
            networks,
            development_chains: DEVELOPMENT_CHAINS.iter().map(|c| c.to_string()).collect(),
            named_accounts: NamedAccountIndexes::default(),
        }
    }
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn network(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.get(&chain_id)
    }

    pub fn is_development_chain(&self, name: &str) -> bool {
        millionaire_types::is_development_chain(name, &self.development_chains)
    }

    /// Resolve a network by name. Development chains without their own entry run on the local
    /// chain id.
    pub fn network_by_name(&self, name: &str) -> Option<NetworkContext> {
        self.networks
            .iter()
            .find(|(_, network)| network.name == name)
            .map(|(chain_id, _)| NetworkContext::new(*chain_id, name))
            .or_else(|| {
                self.is_development_chain(name)
                    .then(|| NetworkContext::new(LOCAL_CHAIN_ID, name))
            })
    }
}

mod ether {
    use alloy_primitives::{
        utils::{format_ether, parse_ether},
        U256,
    };
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_ether(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_ether(raw.trim()).map_err(D::Error::custom)
    }
}
