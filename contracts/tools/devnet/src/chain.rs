//! In-process development network.
//!
//! Holds balances, nonces and deployed contracts behind a shared handle. Every successful
//! transaction mines its own block; a reverting one leaves the state exactly as it was.

use std::{collections::BTreeMap, fmt, sync::Arc};

use alloy_primitives::{keccak256, Address, B256, U256};
use millionaire::{
    BalanceTooLow, BlockEnv, CallContext, ContractRevert, Ledger, Millionaire, VrfConsumerV2,
    VrfCoordinatorV2, VrfCoordinatorV2Mock,
};
use millionaire_types::NetworkContext;
use parking_lot::Mutex;
use serde::Serialize;

use crate::{
    accounts::{dev_accounts, LocalAccount},
    error::DevnetError,
    receipt::Receipt,
};

pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
/// 10 000 ETH per development account.
pub const INITIAL_BALANCE: U256 = U256::from_limbs([1_864_712_049_423_024_128, 542, 0, 0]);
pub const DEFAULT_GAS_PRICE: u64 = 1_000_000_000;
pub const CALL_GAS: u64 = 21_000;
pub const DEPLOY_GAS: u64 = 1_000_000;

/// Which contract lives at an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ContractKind {
    Millionaire,
    #[serde(rename = "VRFCoordinatorV2Mock")]
    VrfCoordinatorV2Mock,
}

impl ContractKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::Millionaire => "Millionaire",
            ContractKind::VrfCoordinatorV2Mock => "VRFCoordinatorV2Mock",
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Contract {
    Millionaire(Millionaire),
    VrfCoordinatorV2Mock(VrfCoordinatorV2Mock),
}

impl Contract {
    pub(crate) fn kind(&self) -> ContractKind {
        match self {
            Contract::Millionaire(_) => ContractKind::Millionaire,
            Contract::VrfCoordinatorV2Mock(_) => ContractKind::VrfCoordinatorV2Mock,
        }
    }

    pub(crate) fn as_millionaire(&self) -> Option<&Millionaire> {
        match self {
            Contract::Millionaire(raffle) => Some(raffle),
            _ => None,
        }
    }

    pub(crate) fn as_millionaire_mut(&mut self) -> Option<&mut Millionaire> {
        match self {
            Contract::Millionaire(raffle) => Some(raffle),
            _ => None,
        }
    }

    pub(crate) fn as_vrf_mock(&self) -> Option<&VrfCoordinatorV2Mock> {
        match self {
            Contract::VrfCoordinatorV2Mock(mock) => Some(mock),
            _ => None,
        }
    }

    pub(crate) fn as_vrf_mock_mut(&mut self) -> Option<&mut VrfCoordinatorV2Mock> {
        match self {
            Contract::VrfCoordinatorV2Mock(mock) => Some(mock),
            _ => None,
        }
    }

    pub(crate) fn as_vrf_coordinator(&mut self) -> Option<&mut dyn VrfCoordinatorV2> {
        match self {
            Contract::VrfCoordinatorV2Mock(mock) => Some(mock as &mut dyn VrfCoordinatorV2),
            _ => None,
        }
    }

    pub(crate) fn as_vrf_consumer(&mut self) -> Option<&mut dyn VrfConsumerV2> {
        match self {
            Contract::Millionaire(raffle) => Some(raffle as &mut dyn VrfConsumerV2),
            _ => None,
        }
    }
}

/// Deployed code, other than the contract being called.
pub(crate) type Contracts = BTreeMap<Address, Contract>;

#[derive(Clone, Debug)]
pub(crate) struct ChainState {
    latest: BlockEnv,
    pending_time: u64,
    ledger: Ledger,
    nonces: BTreeMap<Address, u64>,
    contracts: Contracts,
}

impl ChainState {
    fn genesis(chain_id: u64, accounts: &[LocalAccount]) -> Self {
        let mut ledger = Ledger::default();
        for account in accounts {
            ledger.set_balance(account.address(), INITIAL_BALANCE);
        }
        Self {
            latest: BlockEnv {
                number: 0,
                timestamp: GENESIS_TIMESTAMP,
                chain_id,
            },
            pending_time: 0,
            ledger,
            nonces: BTreeMap::new(),
            contracts: BTreeMap::new(),
        }
    }

    fn mine(&mut self) -> BlockEnv {
        self.latest = BlockEnv {
            number: self.latest.number + 1,
            timestamp: self.latest.timestamp + 1 + self.pending_time,
            chain_id: self.latest.chain_id,
        };
        self.pending_time = 0;
        self.latest
    }

    fn nonce_of(&self, account: Address) -> u64 {
        self.nonces.get(&account).copied().unwrap_or_default()
    }

    fn bump_nonce(&mut self, account: Address) -> u64 {
        let nonce = self.nonces.entry(account).or_default();
        let used = *nonce;
        *nonce += 1;
        used
    }

    /// Check `from` can cover `value + fee`, then charge the fee.
    fn charge(&mut self, from: Address, value: U256, fee: U256) -> Result<(), DevnetError> {
        let required = value.saturating_add(fee);
        let available = self.ledger.balance_of(from);
        if available < required {
            return Err(DevnetError::InsufficientFunds {
                address: from,
                required,
                available,
            });
        }
        self.ledger
            .debit(from, fee)
            .map_err(|e| insufficient_funds(from, e))
    }
}

fn insufficient_funds(address: Address, e: BalanceTooLow) -> DevnetError {
    DevnetError::InsufficientFunds {
        address,
        required: e.required,
        available: e.available,
    }
}

fn transaction_hash(chain_id: u64, from: Address, nonce: u64) -> B256 {
    let mut preimage = Vec::with_capacity(36);
    preimage.extend_from_slice(&chain_id.to_be_bytes());
    preimage.extend_from_slice(from.as_slice());
    preimage.extend_from_slice(&nonce.to_be_bytes());
    keccak256(preimage)
}

/// Identifies a state captured by [`Devnet::snapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SnapshotId(u64);

#[derive(Debug)]
struct Inner {
    state: ChainState,
    snapshots: Vec<(SnapshotId, ChainState)>,
    next_snapshot: u64,
}

/// Cloneable handle to one in-process network.
#[derive(Clone)]
pub struct Devnet {
    network: NetworkContext,
    accounts: Arc<Vec<LocalAccount>>,
    gas_price: U256,
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for Devnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Devnet")
            .field("network", &self.network)
            .field("accounts", &self.accounts.len())
            .field("gas_price", &self.gas_price)
            .finish_non_exhaustive()
    }
}

impl Devnet {
    /// A fresh network with the ten development accounts, each holding 10 000 ETH.
    pub fn new(network: NetworkContext) -> Result<Self, DevnetError> {
        Ok(Self::with_accounts(network, dev_accounts()?))
    }

    pub fn with_accounts(network: NetworkContext, accounts: Vec<LocalAccount>) -> Self {
        let state = ChainState::genesis(network.chain_id, &accounts);
        Self {
            network,
            accounts: Arc::new(accounts),
            gas_price: U256::from(DEFAULT_GAS_PRICE),
            inner: Arc::new(Mutex::new(Inner {
                state,
                snapshots: Vec::new(),
                next_snapshot: 1,
            })),
        }
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn network(&self) -> &NetworkContext {
        &self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id
    }

    pub fn signers(&self) -> &[LocalAccount] {
        &self.accounts
    }

    pub fn signer(&self, index: usize) -> Result<&LocalAccount, DevnetError> {
        self.accounts
            .get(index)
            .ok_or(DevnetError::UnknownAccountIndex(index))
    }

    pub fn is_managed(&self, account: Address) -> bool {
        self.accounts.iter().any(|a| a.address() == account)
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    pub fn latest_block(&self) -> BlockEnv {
        self.inner.lock().state.latest
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.inner.lock().state.ledger.balance_of(account)
    }

    /// `hardhat_setBalance`.
    pub fn set_balance(&self, account: Address, amount: U256) {
        self.inner.lock().state.ledger.set_balance(account, amount);
    }

    pub fn nonce_of(&self, account: Address) -> u64 {
        self.inner.lock().state.nonce_of(account)
    }

    /// The kind of contract deployed at `address`, if any.
    pub fn code_at(&self, address: Address) -> Option<ContractKind> {
        self.inner
            .lock()
            .state
            .contracts
            .get(&address)
            .map(Contract::kind)
    }

    /// `evm_increaseTime`: pushes the next block's timestamp forward.
    pub fn increase_time(&self, seconds: u64) {
        let mut inner = self.inner.lock();
        inner.state.pending_time = inner.state.pending_time.saturating_add(seconds);
    }

    /// `evm_mine`: mines an empty block.
    pub fn mine(&self) -> BlockEnv {
        self.inner.lock().state.mine()
    }

    /// `evm_snapshot`.
    pub fn snapshot(&self) -> SnapshotId {
        let mut inner = self.inner.lock();
        let id = SnapshotId(inner.next_snapshot);
        inner.next_snapshot += 1;
        let state = inner.state.clone();
        inner.snapshots.push((id, state));
        id
    }

    /// `evm_revert`: restores `id` and drops it together with every later snapshot. Returns
    /// false for unknown (or already consumed) snapshots.
    pub fn revert(&self, id: SnapshotId) -> bool {
        let mut inner = self.inner.lock();
        let Some(position) = inner.snapshots.iter().position(|(s, _)| *s == id) else {
            return false;
        };
        let (_, state) = inner.snapshots.swap_remove(position);
        inner.snapshots.truncate(position);
        inner.state = state;
        true
    }

    pub(crate) fn capture(&self) -> ChainState {
        self.inner.lock().state.clone()
    }

    pub(crate) fn restore(&self, state: ChainState) {
        self.inner.lock().state = state;
    }

    fn ensure_managed(&self, account: Address) -> Result<(), DevnetError> {
        if self.is_managed(account) {
            Ok(())
        } else {
            Err(DevnetError::UnknownSigner(account))
        }
    }

    fn fee(&self, gas: u64) -> U256 {
        U256::from(gas) * self.gas_price
    }

    /// Create a contract from `from` at the next CREATE address.
    pub(crate) fn deploy(
        &self,
        from: Address,
        build: impl FnOnce(&mut CallContext<'_>) -> Result<Contract, ContractRevert>,
    ) -> Result<(Address, Receipt), DevnetError> {
        self.ensure_managed(from)?;
        let mut inner = self.inner.lock();
        let mut state = inner.state.clone();

        state.charge(from, U256::ZERO, self.fee(DEPLOY_GAS))?;
        let nonce = state.bump_nonce(from);
        let address = from.create(nonce);
        let block = state.mine();
        let contract = {
            let mut ctx = CallContext::new(from, address, U256::ZERO, block, &mut state.ledger);
            build(&mut ctx)?
        };
        log::debug!(
            "deployed {} at {address} (block {}, nonce {nonce})",
            contract.kind(),
            block.number
        );
        state.contracts.insert(address, contract);

        let receipt = Receipt {
            transaction_hash: transaction_hash(block.chain_id, from, nonce),
            block_number: block.number,
            block_timestamp: block.timestamp,
            from,
            to: None,
            contract_address: Some(address),
            gas_used: DEPLOY_GAS,
            effective_gas_price: self.gas_price,
            logs: state.ledger.take_logs(),
        };
        inner.state = state;
        Ok((address, receipt))
    }

    /// Send a transaction calling the contract at `to` with `value` attached.
    ///
    /// `call` gets the target contract, its call frame, and every other deployed contract.
    pub(crate) fn transact<R>(
        &self,
        from: Address,
        to: Address,
        value: U256,
        call: impl FnOnce(&mut Contract, &mut CallContext<'_>, &mut Contracts) -> Result<R, ContractRevert>,
    ) -> Result<(R, Receipt), DevnetError> {
        self.ensure_managed(from)?;
        let mut inner = self.inner.lock();
        let mut state = inner.state.clone();

        let mut contract = state
            .contracts
            .remove(&to)
            .ok_or(DevnetError::NoContract(to))?;
        state.charge(from, value, self.fee(CALL_GAS))?;
        state
            .ledger
            .transfer(from, to, value)
            .map_err(|e| insufficient_funds(from, e))?;
        let nonce = state.bump_nonce(from);
        let block = state.mine();

        let outcome = {
            let mut ctx = CallContext::new(from, to, value, block, &mut state.ledger);
            call(&mut contract, &mut ctx, &mut state.contracts)
        };
        let output = match outcome {
            Ok(output) => output,
            Err(revert) => {
                log::debug!("transaction from {from} to {to} {revert}");
                return Err(revert.into());
            }
        };
        state.contracts.insert(to, contract);

        let receipt = Receipt {
            transaction_hash: transaction_hash(block.chain_id, from, nonce),
            block_number: block.number,
            block_timestamp: block.timestamp,
            from,
            to: Some(to),
            contract_address: None,
            gas_used: CALL_GAS,
            effective_gas_price: self.gas_price,
            logs: state.ledger.take_logs(),
        };
        log::debug!(
            "transaction {} mined in block {} ({} logs)",
            receipt.transaction_hash,
            receipt.block_number,
            receipt.logs.len()
        );
        inner.state = state;
        Ok((output, receipt))
    }

    /// Read-only call against the latest block. Nothing it does is kept.
    pub(crate) fn view<R>(
        &self,
        from: Address,
        to: Address,
        call: impl FnOnce(&Contract, &CallContext<'_>) -> Result<R, ContractRevert>,
    ) -> Result<R, DevnetError> {
        let inner = self.inner.lock();
        let contract = inner
            .state
            .contracts
            .get(&to)
            .ok_or(DevnetError::NoContract(to))?;
        let mut ledger = inner.state.ledger.clone();
        let ctx = CallContext::new(from, to, U256::ZERO, inner.state.latest, &mut ledger);
        Ok(call(contract, &ctx)?)
    }
}
