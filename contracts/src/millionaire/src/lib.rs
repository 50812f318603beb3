//! Contract logic for the Millionaire lottery and the VRF coordinator mock it consumes.
//!
//! Contracts are plain state structs. Every entry point receives a [`CallContext`] carrying the
//! caller, the attached value, the current block and the balance ledger, and either returns a
//! value or a [`ContractRevert`] holding ABI-encoded revert data.

pub mod context;
pub mod errors;
pub mod interfaces;
pub mod millionaire;
pub mod vrf_coordinator_mock;

pub use context::{BalanceTooLow, BlockEnv, CallContext, Ledger};
pub use errors::ContractRevert;
pub use interfaces::{VrfConsumerV2, VrfCoordinatorV2};
pub use millionaire::{Millionaire, MillionaireArgs};
pub use vrf_coordinator_mock::{Subscription, VrfCoordinatorV2Mock};
