//! Locally held accounts (`getSigners()` / `getNamedAccounts()`).

use core::fmt;

use alloy_primitives::{keccak256, Address};
use k256::ecdsa::SigningKey;

use crate::{config::NamedAccountIndexes, error::DevnetError};

/// Well-known development keys (the same ten every local node ships with).
pub const DEV_PRIVATE_KEYS: [&str; 10] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
    "0x47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a",
    "0x8b3a350cf5c34c9194ca85829a2df0ec3153be0318b5e2d3348e872092edffba",
    "0x92db14e403b83dfe3df233f83dfa3a0d7096f21ca9b0d6d6b8d88b2b4ec1564e",
    "0x4bbbf85ce3377467afe5d46f804f221813b2bb87f24d81f60f1fcdbf7cbf4356",
    "0xdbda1821b80551c9d65939329250298aa3472ba22feea921c0cf5d620ea67b97",
    "0x2a871d0798f97d79848a013d4936a73bf4cc922c825d33c1cf7073dff6d409c6",
];

#[derive(Clone)]
pub struct LocalAccount {
    address: Address,
    signing_key: SigningKey,
}

impl LocalAccount {
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self {
            address: address_of(&signing_key),
            signing_key,
        }
    }

    /// Parse a hex private key, with or without the `0x` prefix.
    pub fn from_hex(key: &str) -> Result<Self, DevnetError> {
        let trimmed = key.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes =
            hex::decode(trimmed).map_err(|e| DevnetError::InvalidPrivateKey(e.to_string()))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| DevnetError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_signing_key(signing_key))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAccount")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// The development accounts, in order.
pub fn dev_accounts() -> Result<Vec<LocalAccount>, DevnetError> {
    DEV_PRIVATE_KEYS
        .iter()
        .map(|key| LocalAccount::from_hex(key))
        .collect()
}

/// keccak256 of the uncompressed public key (without the 0x04 prefix), last 20 bytes.
fn address_of(signing_key: &SigningKey) -> Address {
    let point = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Accounts the deploy scripts and tests refer to by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NamedAccounts {
    pub deployer: Address,
    pub player: Address,
}

impl NamedAccounts {
    pub fn resolve(
        signers: &[LocalAccount],
        indexes: &NamedAccountIndexes,
    ) -> Result<Self, DevnetError> {
        let at = |index: usize| {
            signers
                .get(index)
                .map(LocalAccount::address)
                .ok_or(DevnetError::UnknownAccountIndex(index))
        };
        Ok(Self {
            deployer: at(indexes.deployer)?,
            player: at(indexes.player)?,
        })
    }
}
