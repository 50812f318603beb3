//! Tagged deploy scripts and the registry of what they deployed.
//!
//! [`Deployments::fixture`] provisions a tag set once per network and snapshots the result; later
//! calls for the same tags restore that snapshot, so every test starts from identical state.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use alloy_primitives::{Address, B256, U256};
use millionaire::{CallContext, Millionaire, MillionaireArgs, VrfCoordinatorV2Mock};
use millionaire_types::NetworkContext;
use serde::Serialize;

use crate::{
    accounts::NamedAccounts,
    chain::{ChainState, Contract, ContractKind, Devnet, DEPLOY_GAS},
    config::{NetworkConfig, ProjectConfig},
    error::DevnetError,
    handles::ContractHandle,
    scripts::default_scripts,
};

/// What a deploy script left behind under a name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeploymentRecord {
    pub name: String,
    pub contract: ContractKind,
    pub address: Address,
    pub tags: BTreeSet<String>,
    pub deployer: Address,
    /// Constructor arguments, rendered as strings.
    pub args: Vec<String>,
    pub transaction_hash: B256,
    pub block_number: u64,
}

/// Contract to create, with its constructor arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    VrfCoordinatorV2Mock {
        base_fee: U256,
        gas_price_link: U256,
    },
    Millionaire(MillionaireArgs),
}

impl Artifact {
    pub fn kind(&self) -> ContractKind {
        match self {
            Artifact::VrfCoordinatorV2Mock { .. } => ContractKind::VrfCoordinatorV2Mock,
            Artifact::Millionaire(_) => ContractKind::Millionaire,
        }
    }

    pub fn args(&self) -> Vec<String> {
        match self {
            Artifact::VrfCoordinatorV2Mock {
                base_fee,
                gas_price_link,
            } => vec![base_fee.to_string(), gas_price_link.to_string()],
            Artifact::Millionaire(args) => vec![
                args.vrf_coordinator.to_string(),
                args.entrance_fee.to_string(),
                args.gas_lane.to_string(),
                args.subscription_id.to_string(),
                args.callback_gas_limit.to_string(),
                args.interval.to_string(),
            ],
        }
    }

    fn instantiate(self, ctx: &CallContext<'_>) -> Contract {
        match self {
            Artifact::VrfCoordinatorV2Mock {
                base_fee,
                gas_price_link,
            } => Contract::VrfCoordinatorV2Mock(VrfCoordinatorV2Mock::new(base_fee, gas_price_link)),
            Artifact::Millionaire(args) => Contract::Millionaire(Millionaire::new(ctx, args)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DeployOptions {
    pub from: Address,
    pub artifact: Artifact,
    /// Log the deployment line.
    pub log: bool,
}

/// A numbered, tagged deployment step.
pub trait DeployScript {
    /// Stable identifier, eg `00-deploy-mocks`.
    fn id(&self) -> &'static str;

    fn tags(&self) -> &'static [&'static str];

    fn run(&self, env: &mut DeployEnv<'_>) -> Result<(), DevnetError>;
}

/// What a running script can see and touch.
pub struct DeployEnv<'a> {
    devnet: &'a Devnet,
    config: &'a ProjectConfig,
    named_accounts: NamedAccounts,
    tags: &'static [&'static str],
    records: &'a mut BTreeMap<String, DeploymentRecord>,
    log_lines: &'a mut Vec<String>,
}

impl DeployEnv<'_> {
    pub fn network(&self) -> &NetworkContext {
        self.devnet.network()
    }

    pub fn devnet(&self) -> &Devnet {
        self.devnet
    }

    pub fn config(&self) -> &ProjectConfig {
        self.config
    }

    pub fn named_accounts(&self) -> NamedAccounts {
        self.named_accounts
    }

    pub fn is_development_chain(&self) -> bool {
        self.config.is_development_chain(&self.network().name)
    }

    pub fn network_config(&self) -> Result<&NetworkConfig, DevnetError> {
        let chain_id = self.devnet.chain_id();
        self.config
            .network(chain_id)
            .ok_or(DevnetError::MissingNetworkConfig(chain_id))
    }

    /// `log()` from a deploy script: goes to the logger and the registry transcript.
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        log::info!("{line}");
        self.log_lines.push(line);
    }

    /// Deploy `name`, or reuse the existing deployment when the same artifact is still live.
    pub fn deploy(
        &mut self,
        name: &str,
        options: DeployOptions,
    ) -> Result<DeploymentRecord, DevnetError> {
        let kind = options.artifact.kind();
        let args = options.artifact.args();
        if let Some(existing) = self.records.get(name) {
            if existing.contract == kind
                && existing.args == args
                && self.devnet.code_at(existing.address) == Some(kind)
            {
                let existing = existing.clone();
                if options.log {
                    self.log(format!("reusing \"{name}\" at {}", existing.address));
                }
                return Ok(existing);
            }
        }

        let artifact = options.artifact;
        let (address, receipt) = self
            .devnet
            .deploy(options.from, move |ctx| Ok(artifact.instantiate(ctx)))?;
        if options.log {
            self.log(format!(
                "deploying \"{name}\" (tx: {})...: deployed at {address} with {DEPLOY_GAS} gas",
                receipt.transaction_hash
            ));
        }

        let record = DeploymentRecord {
            name: name.to_string(),
            contract: kind,
            address,
            tags: self.tags.iter().map(|t| t.to_string()).collect(),
            deployer: options.from,
            args,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        };
        self.records.insert(name.to_string(), record.clone());
        Ok(record)
    }

    pub fn get(&self, name: &str) -> Result<&DeploymentRecord, DevnetError> {
        lookup(&*self.records, name)
    }

    /// Handle for a deployment made by an earlier script; `None` binds the deployer.
    pub fn get_contract<H: ContractHandle>(
        &self,
        name: &str,
        signer: Option<Address>,
    ) -> Result<H, DevnetError> {
        let record = self.get(name)?;
        bind(
            self.devnet,
            record,
            signer.unwrap_or(self.named_accounts.deployer),
        )
    }
}

#[derive(Clone, Debug)]
struct Fixture {
    state: ChainState,
    records: BTreeMap<String, DeploymentRecord>,
    log_lines: Vec<String>,
}

/// Runs deploy scripts against one network and remembers what they deployed.
pub struct Deployments {
    devnet: Devnet,
    config: ProjectConfig,
    named_accounts: NamedAccounts,
    scripts: Vec<Box<dyn DeployScript>>,
    records: BTreeMap<String, DeploymentRecord>,
    log_lines: Vec<String>,
    /// Network state when the registry was created; every new fixture starts here.
    genesis: ChainState,
    fixtures: HashMap<BTreeSet<String>, Fixture>,
}

impl fmt::Debug for Deployments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployments")
            .field("network", self.devnet.network())
            .field("scripts", &self.scripts.iter().map(|s| s.id()).collect::<Vec<_>>())
            .field("records", &self.records)
            .field("fixtures", &self.fixtures.len())
            .finish_non_exhaustive()
    }
}

impl Deployments {
    /// Registry with the standard scripts (mocks, then the raffle).
    pub fn new(devnet: Devnet, config: ProjectConfig) -> Result<Self, DevnetError> {
        Self::with_scripts(devnet, config, default_scripts())
    }

    pub fn with_scripts(
        devnet: Devnet,
        config: ProjectConfig,
        scripts: Vec<Box<dyn DeployScript>>,
    ) -> Result<Self, DevnetError> {
        let named_accounts = NamedAccounts::resolve(devnet.signers(), &config.named_accounts)?;
        Ok(Self {
            genesis: devnet.capture(),
            devnet,
            config,
            named_accounts,
            scripts,
            records: BTreeMap::new(),
            log_lines: Vec::new(),
            fixtures: HashMap::new(),
        })
    }

    pub fn devnet(&self) -> &Devnet {
        &self.devnet
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn named_accounts(&self) -> NamedAccounts {
        self.named_accounts
    }

    /// Provision the network for `tags` (every script when empty) and return the deployments.
    ///
    /// The first call for a tag set starts from the state the network had when the registry was
    /// created; later calls restore the state that call produced.
    pub fn fixture(
        &mut self,
        tags: &[&str],
    ) -> Result<&BTreeMap<String, DeploymentRecord>, DevnetError> {
        let key = normalize(tags);
        if let Some(cached) = self.fixtures.get(&key) {
            log::debug!("restoring fixture {key:?}");
            self.devnet.restore(cached.state.clone());
            self.records = cached.records.clone();
            self.log_lines = cached.log_lines.clone();
            return Ok(&self.records);
        }

        self.devnet.restore(self.genesis.clone());
        self.records.clear();
        self.log_lines.clear();

        self.run_selected(&key)?;
        self.fixtures.insert(
            key,
            Fixture {
                state: self.devnet.capture(),
                records: self.records.clone(),
                log_lines: self.log_lines.clone(),
            },
        );
        Ok(&self.records)
    }

    /// Run the scripts for `tags` on top of the current state, without snapshots.
    pub fn run(&mut self, tags: &[&str]) -> Result<(), DevnetError> {
        self.run_selected(&normalize(tags))
    }

    fn run_selected(&mut self, tags: &BTreeSet<String>) -> Result<(), DevnetError> {
        for script in &self.scripts {
            if !tags.is_empty() && !script.tags().iter().any(|t| tags.contains(*t)) {
                continue;
            }
            log::debug!("running deploy script {}", script.id());
            let mut env = DeployEnv {
                devnet: &self.devnet,
                config: &self.config,
                named_accounts: self.named_accounts,
                tags: script.tags(),
                records: &mut self.records,
                log_lines: &mut self.log_lines,
            };
            script
                .run(&mut env)
                .map_err(|source| DevnetError::Script {
                    script: script.id(),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&DeploymentRecord, DevnetError> {
        lookup(&self.records, name)
    }

    /// Deployments carrying `tag`.
    pub fn tagged(&self, tag: &str) -> Vec<&DeploymentRecord> {
        self.records
            .values()
            .filter(|record| record.tags.contains(tag))
            .collect()
    }

    pub fn all(&self) -> &BTreeMap<String, DeploymentRecord> {
        &self.records
    }

    /// Lines scripts logged while producing the current deployments.
    pub fn log_lines(&self) -> &[String] {
        &self.log_lines
    }

    /// Handle for deployment `name`, bound to `signer` (the deployer when `None`).
    pub fn get_contract<H: ContractHandle>(
        &self,
        name: &str,
        signer: Option<Address>,
    ) -> Result<H, DevnetError> {
        let record = self.get(name)?;
        bind(
            &self.devnet,
            record,
            signer.unwrap_or(self.named_accounts.deployer),
        )
    }
}

fn normalize(tags: &[&str]) -> BTreeSet<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn lookup<'r>(
    records: &'r BTreeMap<String, DeploymentRecord>,
    name: &str,
) -> Result<&'r DeploymentRecord, DevnetError> {
    records
        .get(name)
        .ok_or_else(|| DevnetError::UnknownDeployment(name.to_string()))
}

fn bind<H: ContractHandle>(
    devnet: &Devnet,
    record: &DeploymentRecord,
    signer: Address,
) -> Result<H, DevnetError> {
    if record.contract != H::KIND {
        return Err(DevnetError::WrongContractKind {
            name: record.name.clone(),
            expected: H::KIND,
            actual: record.contract,
        });
    }
    H::attach(devnet, record.address, signer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use millionaire_types::mocks::{BASE_FEE, GAS_PRICE_LINK};

    struct Counter;

    impl DeployScript for Counter {
        fn id(&self) -> &'static str {
            "counter"
        }

        fn tags(&self) -> &'static [&'static str] {
            &["counter"]
        }

        fn run(&self, env: &mut DeployEnv<'_>) -> Result<(), DevnetError> {
            let from = env.named_accounts().deployer;
            env.log("counting");
            env.deploy(
                "Counter",
                DeployOptions {
                    from,
                    artifact: Artifact::VrfCoordinatorV2Mock {
                        base_fee: BASE_FEE,
                        gas_price_link: GAS_PRICE_LINK,
                    },
                    log: true,
                },
            )?;
            Ok(())
        }
    }

    fn registry() -> Deployments {
        Deployments::with_scripts(
            Devnet::new(NetworkContext::local()).unwrap(),
            ProjectConfig::default(),
            vec![Box::new(Counter)],
        )
        .unwrap()
    }

    #[test]
    fn unmatched_tags_run_nothing() {
        let mut deployments = registry();
        deployments.fixture(&["other"]).unwrap();
        assert!(deployments.all().is_empty());
        assert!(deployments.log_lines().is_empty());
    }

    #[test]
    fn empty_tags_run_everything() {
        let mut deployments = registry();
        let records = deployments.fixture(&[]).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.contains_key("Counter"));
        assert_eq!(deployments.tagged("counter").len(), 1);
    }

    #[test]
    fn repeated_runs_reuse_live_deployments() {
        let mut deployments = registry();
        deployments.run(&["counter"]).unwrap();
        let first = deployments.get("Counter").unwrap().clone();
        deployments.run(&["counter"]).unwrap();
        assert_eq!(deployments.get("Counter").unwrap(), &first);
        assert_eq!(deployments.devnet().nonce_of(first.deployer), 1);
        assert!(deployments.log_lines()[3].starts_with("reusing \"Counter\""));
    }

    #[test]
    fn artifact_args_render_in_constructor_order() {
        let args = Artifact::VrfCoordinatorV2Mock {
            base_fee: BASE_FEE,
            gas_price_link: GAS_PRICE_LINK,
        }
        .args();
        assert_eq!(args, vec!["250000000000000000", "1000000000"]);
    }

    #[test]
    fn unknown_names_are_errors() {
        let deployments = registry();
        assert!(matches!(
            deployments.get("Counter"),
            Err(DevnetError::UnknownDeployment(name)) if name == "Counter"
        ));
    }
}
