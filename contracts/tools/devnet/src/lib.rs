//! Local deployment and verification tooling for the Millionaire lottery.
//!
//! - [`chain`]: an in-process network with funded accounts, snapshots and time travel.
//! - [`deployments`] + [`scripts`]: tagged deploy scripts and the fixture registry that provisions
//!   the VRF coordinator mock on local networks only.
//! - [`handles`]: typed contract bindings bound to a signer.
//! - [`harness`]: per-test fixture state and revert/event expectations.

pub mod accounts;
pub mod chain;
pub mod config;
pub mod deployments;
pub mod error;
pub mod handles;
pub mod harness;
pub mod receipt;
pub mod scripts;

pub use accounts::{LocalAccount, NamedAccounts};
pub use chain::{ContractKind, Devnet, SnapshotId};
pub use config::{ConfigError, NetworkConfig, ProjectConfig};
pub use deployments::{Artifact, DeployEnv, DeployOptions, DeployScript, DeploymentRecord, Deployments};
pub use error::DevnetError;
pub use handles::{ContractHandle, MillionaireHandle, VrfCoordinatorV2MockHandle};
pub use harness::{ExpectationError, RaffleFixture};
pub use receipt::Receipt;
