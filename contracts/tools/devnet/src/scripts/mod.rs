//! Deploy scripts, in execution order.

mod deploy_millionaire;
mod deploy_mocks;

pub use deploy_millionaire::DeployMillionaire;
pub use deploy_mocks::DeployMocks;

use crate::deployments::DeployScript;

/// Registry name of the VRF coordinator mock.
pub const VRF_COORDINATOR_V2_MOCK: &str = "VRFCoordinatorV2Mock";
pub const MILLIONAIRE: &str = "Millionaire";

pub fn default_scripts() -> Vec<Box<dyn DeployScript>> {
    vec![Box::new(DeployMocks), Box::new(DeployMillionaire)]
}
