use alloy_primitives::{Address, U256};
use millionaire::ContractRevert;

use crate::{chain::ContractKind, config::ConfigError};

#[derive(Debug, thiserror::Error)]
pub enum DevnetError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("account {0} is not managed by this network")]
    UnknownSigner(Address),

    #[error("no account at index {0}")]
    UnknownAccountIndex(usize),

    #[error("sender {address} doesn't have enough funds: required {required}, available {available}")]
    InsufficientFunds {
        address: Address,
        required: U256,
        available: U256,
    },

    #[error("transaction {0}")]
    Reverted(#[from] ContractRevert),

    #[error("no contract deployed at {0}")]
    NoContract(Address),

    #[error("deployment `{name}` is a {actual}, not a {expected}")]
    WrongContractKind {
        name: String,
        expected: ContractKind,
        actual: ContractKind,
    },

    #[error("no deployment named `{0}`")]
    UnknownDeployment(String),

    #[error("no network configuration for chain id {0}")]
    MissingNetworkConfig(u64),

    #[error("network configuration for chain id {chain_id} is missing `{setting}`")]
    MissingNetworkSetting {
        chain_id: u64,
        setting: &'static str,
    },

    #[error("`{0}` is not a development chain")]
    NotDevelopmentChain(String),

    #[error("expected event `{0}` was not emitted")]
    MissingEvent(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("deploy script `{script}` failed: {source}")]
    Script {
        script: &'static str,
        #[source]
        source: Box<DevnetError>,
    },
}

impl DevnetError {
    /// The contract revert behind this error, looking through script failures.
    pub fn revert(&self) -> Option<&ContractRevert> {
        match self {
            DevnetError::Reverted(revert) => Some(revert),
            DevnetError::Script { source, .. } => source.revert(),
            _ => None,
        }
    }

    /// The innermost error, looking through script failures.
    pub fn root_cause(&self) -> &DevnetError {
        match self {
            DevnetError::Script { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
