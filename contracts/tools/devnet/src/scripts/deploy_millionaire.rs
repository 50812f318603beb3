use millionaire::{interfaces::SubscriptionCreated, MillionaireArgs};
use millionaire_types::mocks::VRF_SUB_FUND_AMOUNT;

use crate::{
    deployments::{Artifact, DeployEnv, DeployOptions, DeployScript},
    error::DevnetError,
    handles::VrfCoordinatorV2MockHandle,
};

use super::{MILLIONAIRE, VRF_COORDINATOR_V2_MOCK};

/// Deploys the raffle. On development chains it is wired to the mock through a freshly funded
/// subscription; elsewhere the configured coordinator and subscription are used.
pub struct DeployMillionaire;

impl DeployScript for DeployMillionaire {
    fn id(&self) -> &'static str {
        "01-deploy-millionaire"
    }

    fn tags(&self) -> &'static [&'static str] {
        &["all", "millionaire"]
    }

    fn run(&self, env: &mut DeployEnv<'_>) -> Result<(), DevnetError> {
        let chain_id = env.network().chain_id;
        let network = env.network_config()?.clone();
        let from = env.named_accounts().deployer;

        let (vrf_coordinator, subscription_id, mock) = if env.is_development_chain() {
            let mock: VrfCoordinatorV2MockHandle =
                env.get_contract(VRF_COORDINATOR_V2_MOCK, Some(from))?;
            let receipt = mock.create_subscription()?;
            let sub_id = receipt
                .emitted::<SubscriptionCreated>(mock.address())
                .ok_or(DevnetError::MissingEvent("SubscriptionCreated"))?
                .subId;
            mock.fund_subscription(sub_id, VRF_SUB_FUND_AMOUNT)?;
            (mock.address(), sub_id, Some(mock))
        } else {
            let coordinator = network
                .vrf_coordinator_v2
                .ok_or(DevnetError::MissingNetworkSetting {
                    chain_id,
                    setting: "vrfCoordinatorV2",
                })?;
            let sub_id = network
                .subscription_id
                .ok_or(DevnetError::MissingNetworkSetting {
                    chain_id,
                    setting: "subscriptionId",
                })?;
            (coordinator, sub_id, None)
        };

        let raffle = env.deploy(
            MILLIONAIRE,
            DeployOptions {
                from,
                artifact: Artifact::Millionaire(MillionaireArgs {
                    vrf_coordinator,
                    entrance_fee: network.entrance_fee,
                    gas_lane: network.gas_lane,
                    subscription_id,
                    callback_gas_limit: network.callback_gas_limit,
                    interval: network.interval,
                }),
                log: true,
            },
        )?;

        if let Some(mock) = mock {
            mock.add_consumer(subscription_id, raffle.address)?;
        } else {
            log::warn!(
                "remember to add {} as a consumer of subscription {subscription_id}",
                raffle.address
            );
        }
        env.log("--------------------------------------------------------");
        Ok(())
    }
}
