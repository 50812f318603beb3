use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use millionaire_devnet::{
    accounts::dev_accounts, DeploymentRecord, Deployments, Devnet, LocalAccount, ProjectConfig,
};
use millionaire_types::NetworkContext;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Run the tagged deploy scripts for a network profile, then write/update a deployments JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Development network profile to deploy to (eg, hardhat, localhost).
    #[arg(long, default_value = "hardhat")]
    network: String,

    /// JSON network configuration; the built-in table is used when absent.
    #[arg(long, env = "MILLIONAIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Only run scripts carrying one of these tags.
    #[arg(long, value_delimiter = ',', default_value = "all")]
    tags: Vec<String>,

    /// Deployer private key (hex string, 0x...). Replaces the named deployer account.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Path to write deployment info (eg, deployments.hardhat.json).
    #[arg(long, default_value = "deployments.json")]
    deployments_path: PathBuf,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ProjectConfig::load(path)
            .with_context(|| format!("failed loading config {}", path.display()))?,
        None => ProjectConfig::default(),
    };
    let network = resolve_network(&cli.network, &config)?;

    let deployments = deploy(&cli, network, config)?;
    write_deployments_json(&cli, &deployments)?;

    for record in deployments.all().values() {
        println!("Deployed `{}` to {}", record.name, record.address);
    }
    Ok(())
}

/// Deployments run on the in-process network, so only development chains can be recorded.
fn resolve_network(name: &str, config: &ProjectConfig) -> Result<NetworkContext> {
    let network = config
        .network_by_name(name)
        .ok_or_else(|| anyhow!("unknown network `{name}`"))?;
    if !config.is_development_chain(&network.name) {
        return Err(anyhow!(
            "`{name}` (chain id {}) is not a development chain; only development chains can be deployed from here",
            network.chain_id
        ));
    }
    Ok(network)
}

fn deploy(cli: &Cli, network: NetworkContext, config: ProjectConfig) -> Result<Deployments> {
    let mut accounts = dev_accounts().context("failed deriving development accounts")?;
    if let Some(key) = &cli.private_key {
        let account = LocalAccount::from_hex(key).context("invalid deployer key")?;
        let slot = accounts
            .get_mut(config.named_accounts.deployer)
            .ok_or_else(|| anyhow!("no deployer account slot {}", config.named_accounts.deployer))?;
        *slot = account;
    }

    log::info!(
        "deploying to {} (chain id {}) with tags {:?}",
        network.name,
        network.chain_id,
        cli.tags
    );
    let devnet = Devnet::with_accounts(network, accounts);
    let mut deployments =
        Deployments::new(devnet, config).context("failed resolving named accounts")?;
    let tags: Vec<&str> = cli.tags.iter().map(String::as_str).collect();
    deployments
        .fixture(&tags)
        .context("deploy scripts failed")?;
    Ok(deployments)
}

fn write_deployments_json(cli: &Cli, deployments: &Deployments) -> Result<()> {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let existing = if cli.deployments_path.exists() {
        fs::read_to_string(&cli.deployments_path)
            .with_context(|| format!("failed reading {}", cli.deployments_path.display()))?
    } else {
        String::new()
    };

    let mut root: Value = if existing.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(&existing)
            .with_context(|| format!("failed parsing JSON in {}", cli.deployments_path.display()))?
    };

    if !root.is_object() {
        root = json!({});
    }

    let network = deployments.devnet().network();
    root["network"] = json!(network.name);
    root["chain_id"] = json!(network.chain_id);
    root["updated_at"] = json!(now);

    if root.get("deployments").and_then(Value::as_object).is_none() {
        root["deployments"] = json!({});
    }

    for (name, record) in deployments.all() {
        root["deployments"][name] = entry_for(record, &now);
    }

    write_json_atomic(&cli.deployments_path, &root)?;
    Ok(())
}

fn entry_for(record: &DeploymentRecord, deployed_at: &str) -> Value {
    json!({
        "address": record.address,
        "contract": record.contract,
        "tags": record.tags,
        "args": record.args,
        "deployer": record.deployer,
        "transaction_hash": record.transaction_hash,
        "block_number": record.block_number,
        "deployed_at": deployed_at,
    })
}

fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised =
        serde_json::to_string_pretty(value).context("failed serialising deployments JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_for(path: PathBuf) -> Cli {
        Cli::parse_from([
            "millionaire-deployer",
            "--deployments-path",
            path.to_str().unwrap(),
        ])
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{name}-{}.json", std::process::id()))
    }

    #[test]
    fn tags_split_on_commas() {
        let cli = Cli::parse_from(["millionaire-deployer", "--tags", "mocks,millionaire"]);
        assert_eq!(cli.tags, vec!["mocks", "millionaire"]);
        assert_eq!(cli.network, "hardhat");
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path_for(Path::new("out/deployments.json")),
            PathBuf::from("out/deployments.json.tmp")
        );
    }

    #[test]
    fn local_deployments_are_merged_into_existing_json() {
        let path = temp_path("millionaire-deployments");
        fs::write(&path, r#"{ "deployments": { "Legacy": { "address": "0x01" } }, "note": "kept" }"#)
            .unwrap();

        let cli = cli_for(path.clone());
        let config = ProjectConfig::default();
        let network = resolve_network(&cli.network, &config).unwrap();
        let deployments = deploy(&cli, network, config).unwrap();
        write_deployments_json(&cli, &deployments).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["network"], "hardhat");
        assert_eq!(written["chain_id"], 31337);
        assert_eq!(written["note"], "kept");
        assert_eq!(written["deployments"]["Legacy"]["address"], "0x01");
        assert_eq!(
            written["deployments"]["VRFCoordinatorV2Mock"]["contract"],
            "VRFCoordinatorV2Mock"
        );
        assert!(written["deployments"]["Millionaire"]["address"].is_string());
        assert!(!tmp_path_for(&path).exists());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn only_development_networks_resolve() {
        let config = ProjectConfig::default();
        assert_eq!(
            resolve_network("localhost", &config).unwrap(),
            NetworkContext::new(31337, "localhost")
        );
        let err = resolve_network("sepolia", &config).unwrap_err();
        assert!(err.to_string().contains("not a development chain"));
        let err = resolve_network("mainnet", &config).unwrap_err();
        assert!(err.to_string().contains("unknown network"));
    }

    #[test]
    fn private_key_replaces_the_deployer() {
        let path = temp_path("millionaire-deployer-key");
        let mut cli = cli_for(path);
        cli.tags = vec!["mocks".to_string()];
        cli.private_key =
            Some("0x2a871d0798f97d79848a013d4936a73bf4cc922c825d33c1cf7073dff6d409c6".to_string());
        let expected = LocalAccount::from_hex(cli.private_key.as_deref().unwrap())
            .unwrap()
            .address();

        let config = ProjectConfig::default();
        let deployments = deploy(&cli, NetworkContext::local(), config).unwrap();
        assert_eq!(deployments.named_accounts().deployer, expected);
        assert_eq!(
            deployments.get("VRFCoordinatorV2Mock").unwrap().deployer,
            expected
        );
    }
}
