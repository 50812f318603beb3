//! Execution context handed to contract entry points.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Log, U256};
use alloy_sol_types::SolEvent;

/// Block the current call executes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockEnv {
    pub number: u64,
    pub timestamp: u64,
    pub chain_id: u64,
}

/// Returned when a transfer exceeds the sender's balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("balance too low: required {required}, available {available}")]
pub struct BalanceTooLow {
    pub required: U256,
    pub available: U256,
}

/// Native balances plus the logs emitted by the transaction in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    balances: BTreeMap<Address, U256>,
    logs: Vec<Log>,
}

impl Ledger {
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn set_balance(&mut self, account: Address, amount: U256) {
        if amount.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    pub fn credit(&mut self, account: Address, amount: U256) {
        let balance = self.balance_of(account).saturating_add(amount);
        self.set_balance(account, balance);
    }

    pub fn debit(&mut self, account: Address, amount: U256) -> Result<(), BalanceTooLow> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(BalanceTooLow {
                required: amount,
                available,
            });
        }
        self.set_balance(account, available - amount);
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), BalanceTooLow> {
        self.debit(from, amount)?;
        self.credit(to, amount);
        Ok(())
    }

    pub fn push_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn take_logs(&mut self) -> Vec<Log> {
        std::mem::take(&mut self.logs)
    }
}

/// A single call frame: `msg.sender`, `address(this)`, `msg.value` and `block.*`.
pub struct CallContext<'a> {
    sender: Address,
    this: Address,
    value: U256,
    block: BlockEnv,
    ledger: &'a mut Ledger,
}

impl<'a> CallContext<'a> {
    pub fn new(
        sender: Address,
        this: Address,
        value: U256,
        block: BlockEnv,
        ledger: &'a mut Ledger,
    ) -> Self {
        Self {
            sender,
            this,
            value,
            block,
            ledger,
        }
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn this(&self) -> Address {
        self.this
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn block(&self) -> BlockEnv {
        self.block
    }

    pub fn timestamp(&self) -> u64 {
        self.block.timestamp
    }

    /// `address(this).balance`.
    pub fn self_balance(&self) -> U256 {
        self.ledger.balance_of(self.this)
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.ledger.balance_of(account)
    }

    /// Send native value from this contract.
    pub fn transfer(&mut self, to: Address, amount: U256) -> Result<(), BalanceTooLow> {
        self.ledger.transfer(self.this, to, amount)
    }

    /// Emit `event` from this contract.
    pub fn emit<E: SolEvent>(&mut self, event: &E) {
        let data = event.encode_log_data();
        self.ledger.push_log(Log {
            address: self.this,
            data,
        });
    }

    /// Open a nested frame calling `callee` with no value attached.
    pub fn call(&mut self, callee: Address) -> CallContext<'_> {
        CallContext {
            sender: self.this,
            this: callee,
            value: U256::ZERO,
            block: self.block,
            ledger: &mut *self.ledger,
        }
    }

    /// Capture the ledger so a failed low-level call can be undone without reverting the caller.
    pub fn checkpoint(&self) -> Ledger {
        self.ledger.clone()
    }

    pub fn restore(&mut self, checkpoint: Ledger) {
        *self.ledger = checkpoint;
    }
}
