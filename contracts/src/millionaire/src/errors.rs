use core::fmt;

use alloy_primitives::{hex, Bytes, U256};
use alloy_sol_types::{Panic, Revert, SolError};

use crate::interfaces::{
    InsufficientBalance, InvalidConsumer, InvalidRandomWords, InvalidSubscription,
    Millionaire__NotEnoughEthEntered, Millionaire__RaffleNotOpen, Millionaire__TransferFailed,
    Millionaire__UpkeepNotNeeded, MustBeSubOwner, OnlyCoordinatorCanFulfill, TooManyConsumers,
};

/// Solidity panic code for an out-of-bounds array access.
pub const PANIC_ARRAY_OUT_OF_BOUNDS: u64 = 0x32;
/// Solidity panic code for division or modulo by zero.
pub const PANIC_DIVISION_BY_ZERO: u64 = 0x12;

/// Custom errors declared by the contracts in this crate: `(selector, signature)`.
static KNOWN_ERRORS: [([u8; 4], &str); 11] = [
    (
        Millionaire__NotEnoughEthEntered::SELECTOR,
        Millionaire__NotEnoughEthEntered::SIGNATURE,
    ),
    (
        Millionaire__RaffleNotOpen::SELECTOR,
        Millionaire__RaffleNotOpen::SIGNATURE,
    ),
    (
        Millionaire__UpkeepNotNeeded::SELECTOR,
        Millionaire__UpkeepNotNeeded::SIGNATURE,
    ),
    (
        Millionaire__TransferFailed::SELECTOR,
        Millionaire__TransferFailed::SIGNATURE,
    ),
    (
        OnlyCoordinatorCanFulfill::SELECTOR,
        OnlyCoordinatorCanFulfill::SIGNATURE,
    ),
    (InvalidSubscription::SELECTOR, InvalidSubscription::SIGNATURE),
    (InsufficientBalance::SELECTOR, InsufficientBalance::SIGNATURE),
    (MustBeSubOwner::SELECTOR, MustBeSubOwner::SIGNATURE),
    (TooManyConsumers::SELECTOR, TooManyConsumers::SIGNATURE),
    (InvalidConsumer::SELECTOR, InvalidConsumer::SIGNATURE),
    (InvalidRandomWords::SELECTOR, InvalidRandomWords::SIGNATURE),
];

/// ABI-encoded revert data returned by a failed call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractRevert {
    data: Bytes,
}

impl ContractRevert {
    /// Revert with a custom Solidity error.
    pub fn custom<E: SolError>(error: E) -> Self {
        Self {
            data: error.abi_encode().into(),
        }
    }

    /// `revert("reason")` / `require(cond, "reason")`.
    pub fn message(reason: impl Into<String>) -> Self {
        Self::custom(Revert {
            reason: reason.into(),
        })
    }

    /// Compiler-inserted panic (`Panic(uint256)`).
    pub fn panic(code: u64) -> Self {
        Self::custom(Panic {
            code: U256::from(code),
        })
    }

    /// Revert without data (eg, calling an address with no code).
    pub fn empty() -> Self {
        Self { data: Bytes::new() }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn selector(&self) -> Option<[u8; 4]> {
        let head = self.data.get(..4)?;
        let mut selector = [0u8; 4];
        selector.copy_from_slice(head);
        Some(selector)
    }

    /// True iff the revert data carries error `E`.
    pub fn is<E: SolError>(&self) -> bool {
        self.selector() == Some(E::SELECTOR)
    }

    pub fn decode<E: SolError>(&self) -> Option<E> {
        if !self.is::<E>() {
            return None;
        }
        E::abi_decode(&self.data, true).ok()
    }

    /// The `Error(string)` reason, if this is a string revert.
    pub fn reason(&self) -> Option<String> {
        self.decode::<Revert>().map(|r| r.reason)
    }

    pub fn panic_code(&self) -> Option<U256> {
        self.decode::<Panic>().map(|p| p.code)
    }

    /// Name of the custom error (eg, `Millionaire__NotEnoughEthEntered`), when it is one of ours.
    pub fn error_name(&self) -> Option<&'static str> {
        let selector = self.selector()?;
        let signature: &'static str = KNOWN_ERRORS
            .iter()
            .find(|(known, _)| *known == selector)
            .map(|(_, signature)| *signature)?;
        signature.split('(').next()
    }
}

impl fmt::Display for ContractRevert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            return write!(f, "reverted without a reason");
        }
        if let Some(reason) = self.reason() {
            return write!(f, "reverted with reason string '{reason}'");
        }
        if let Some(code) = self.panic_code() {
            return match u64::try_from(code) {
                Ok(code) => write!(f, "reverted with panic code {code:#x}"),
                Err(_) => write!(f, "reverted with panic code {code}"),
            };
        }
        if let Some(name) = self.error_name() {
            return write!(f, "reverted with custom error '{name}'");
        }
        write!(f, "reverted with unrecognized data {}", hex::encode_prefixed(&self.data))
    }
}

impl std::error::Error for ContractRevert {}
