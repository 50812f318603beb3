//! Per-test fixture state and revert/event expectations.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use millionaire::ContractRevert;
use millionaire_types::NetworkContext;

use crate::{
    chain::Devnet,
    config::ProjectConfig,
    deployments::Deployments,
    error::DevnetError,
    handles::{MillionaireHandle, VrfCoordinatorV2MockHandle},
    receipt::Receipt,
    scripts::{MILLIONAIRE, VRF_COORDINATOR_V2_MOCK},
};

/// Tag set every test provisions.
pub const FIXTURE_TAGS: [&str; 1] = ["all"];

#[derive(Debug, thiserror::Error)]
pub enum ExpectationError {
    #[error("expected transaction to revert with `{expected}`, but it succeeded")]
    NotReverted { expected: String },

    #[error("expected transaction to revert with `{expected}`, but it {actual}")]
    WrongError {
        expected: String,
        actual: ContractRevert,
    },

    #[error("expected transaction to revert with `{expected}`, but it failed before executing: {source}")]
    Failed {
        expected: String,
        #[source]
        source: DevnetError,
    },

    #[error("expected event `{event}` to be emitted by {emitter}")]
    EventNotEmitted { event: String, emitter: Address },
}

/// Fresh deployment of everything, with the raffle bound to the player.
#[derive(Debug)]
pub struct RaffleFixture {
    pub deployments: Deployments,
    pub raffle: MillionaireHandle,
    pub vrf_coordinator: VrfCoordinatorV2MockHandle,
    pub entrance_fee: U256,
    pub interval: u64,
    pub deployer: Address,
    pub player: Address,
}

impl RaffleFixture {
    /// Provision `network`. Returns `None` when it isn't a development chain, where the suite
    /// doesn't apply.
    pub fn setup(network: NetworkContext, config: ProjectConfig) -> Result<Option<Self>, DevnetError> {
        if !config.is_development_chain(&network.name) {
            log::warn!("skipping raffle fixture: `{}` is not a development chain", network.name);
            return Ok(None);
        }
        let deployments = Deployments::new(Devnet::new(network)?, config)?;
        Self::provision(deployments).map(Some)
    }

    /// Fixture on the default local network.
    pub fn local() -> Result<Self, DevnetError> {
        let network = NetworkContext::local();
        Self::setup(network.clone(), ProjectConfig::default())?
            .ok_or(DevnetError::NotDevelopmentChain(network.name))
    }

    /// Restore the provisioned state, discarding anything done since.
    pub fn rebuild(self) -> Result<Self, DevnetError> {
        Self::provision(self.deployments)
    }

    fn provision(mut deployments: Deployments) -> Result<Self, DevnetError> {
        deployments.fixture(&FIXTURE_TAGS)?;
        let named = deployments.named_accounts();
        let raffle: MillionaireHandle = deployments.get_contract(MILLIONAIRE, Some(named.player))?;
        let vrf_coordinator: VrfCoordinatorV2MockHandle =
            deployments.get_contract(VRF_COORDINATOR_V2_MOCK, None)?;
        let entrance_fee = raffle.get_entrance_fee()?;
        let interval = raffle.get_interval()?;
        Ok(Self {
            deployments,
            raffle,
            vrf_coordinator,
            entrance_fee,
            interval,
            deployer: named.deployer,
            player: named.player,
        })
    }

    pub fn devnet(&self) -> &Devnet {
        self.deployments.devnet()
    }

    /// Move time past the interval and mine, so upkeep becomes due.
    pub fn skip_interval(&self) {
        self.devnet().increase_time(self.interval + 1);
        self.devnet().mine();
    }
}

/// Expect `result` to be a revert with custom error `name`.
pub fn expect_revert_named<T>(
    result: Result<T, DevnetError>,
    name: &str,
) -> Result<ContractRevert, ExpectationError> {
    match result {
        Ok(_) => Err(ExpectationError::NotReverted {
            expected: name.to_string(),
        }),
        Err(err) => match err.revert() {
            Some(revert) if revert.error_name() == Some(name) => Ok(revert.clone()),
            Some(revert) => Err(ExpectationError::WrongError {
                expected: name.to_string(),
                actual: revert.clone(),
            }),
            None => Err(ExpectationError::Failed {
                expected: name.to_string(),
                source: err,
            }),
        },
    }
}

/// Expect `emitter` to have emitted `E` in `receipt`, returning the decoded event.
pub fn expect_emitted<E: SolEvent>(receipt: &Receipt, emitter: Address) -> Result<E, ExpectationError> {
    receipt
        .emitted::<E>(emitter)
        .ok_or_else(|| ExpectationError::EventNotEmitted {
            event: E::SIGNATURE.to_string(),
            emitter,
        })
}
