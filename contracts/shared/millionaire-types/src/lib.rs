//! Shared types for the Millionaire lottery, used by the contracts and the tooling.

pub mod mocks;
pub mod network;
pub mod raffle;

pub use network::{is_development_chain, is_local_network, NetworkContext, LOCAL_CHAIN_ID};
pub use raffle::RaffleState;
