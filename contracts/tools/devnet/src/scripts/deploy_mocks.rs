use millionaire_types::{
    is_local_network,
    mocks::{BASE_FEE, GAS_PRICE_LINK},
};

use crate::{
    deployments::{Artifact, DeployEnv, DeployOptions, DeployScript},
    error::DevnetError,
};

use super::VRF_COORDINATOR_V2_MOCK;

/// Deploys the VRF coordinator mock, on the local network only.
pub struct DeployMocks;

impl DeployScript for DeployMocks {
    fn id(&self) -> &'static str {
        "00-deploy-mocks"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "mocks"]
    }

    fn run(&self, env: &mut DeployEnv<'_>) -> Result<(), DevnetError> {
        let chain_id = env.network().chain_id;
        if !is_local_network(chain_id) {
            log::debug!("chain id {chain_id} is not local, skipping mocks");
            return Ok(());
        }

        env.log("Local network detected! Deploying mocks...");
        let from = env.named_accounts().deployer;
        env.deploy(
            VRF_COORDINATOR_V2_MOCK,
            DeployOptions {
                from,
                artifact: Artifact::VrfCoordinatorV2Mock {
                    base_fee: BASE_FEE,
                    gas_price_link: GAS_PRICE_LINK,
                },
                log: true,
            },
        )?;
        env.log("Mocks deployed!");
        env.log("--------------------------------------------------------");
        Ok(())
    }
}
