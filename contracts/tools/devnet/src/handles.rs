//! Typed bindings to deployed contracts, bound to a signer.
//!
//! Transactions return the mined [`Receipt`]; views return the decoded value.

use alloy_primitives::{Address, Bytes, U256};
use millionaire::{CallContext, ContractRevert, Millionaire, VrfCoordinatorV2Mock};
use millionaire_types::RaffleState;

use crate::{
    chain::{ContractKind, Contracts, Devnet},
    error::DevnetError,
    receipt::Receipt,
};

pub trait ContractHandle: Sized {
    const KIND: ContractKind;

    fn bind(devnet: Devnet, address: Address, signer: Address) -> Self;

    /// Bind after checking that `address` holds a `KIND` contract and `signer` is managed.
    fn attach(devnet: &Devnet, address: Address, signer: Address) -> Result<Self, DevnetError> {
        match devnet.code_at(address) {
            None => return Err(DevnetError::NoContract(address)),
            Some(actual) if actual != Self::KIND => {
                return Err(DevnetError::WrongContractKind {
                    name: address.to_string(),
                    expected: Self::KIND,
                    actual,
                })
            }
            Some(_) => {}
        }
        if !devnet.is_managed(signer) {
            return Err(DevnetError::UnknownSigner(signer));
        }
        Ok(Self::bind(devnet.clone(), address, signer))
    }
}

#[derive(Clone, Debug)]
pub struct MillionaireHandle {
    devnet: Devnet,
    address: Address,
    signer: Address,
}

impl ContractHandle for MillionaireHandle {
    const KIND: ContractKind = ContractKind::Millionaire;

    fn bind(devnet: Devnet, address: Address, signer: Address) -> Self {
        Self {
            devnet,
            address,
            signer,
        }
    }
}

impl MillionaireHandle {
    /// Same contract, different signer.
    pub fn connect(&self, signer: Address) -> Self {
        Self::bind(self.devnet.clone(), self.address, signer)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    /// Native balance held by the raffle (the pot).
    pub fn balance(&self) -> U256 {
        self.devnet.balance_of(self.address)
    }

    pub fn enter_raffle(&self, value: U256) -> Result<Receipt, DevnetError> {
        self.send(value, |raffle, ctx, _| raffle.enter_raffle(ctx))
            .map(|(_, receipt)| receipt)
    }

    /// The VRF request id is carried by the `RequestedRaffleWinner` event.
    pub fn perform_upkeep(&self, perform_data: &[u8]) -> Result<Receipt, DevnetError> {
        self.send(U256::ZERO, |raffle, ctx, contracts| {
            let coordinator = contracts
                .get_mut(&raffle.vrf_coordinator())
                .and_then(|c| c.as_vrf_coordinator());
            raffle.perform_upkeep(ctx, perform_data, coordinator)
        })
        .map(|(_, receipt)| receipt)
    }

    pub fn check_upkeep(&self, check_data: &[u8]) -> Result<(bool, Bytes), DevnetError> {
        self.read(|raffle, ctx| Ok(raffle.check_upkeep(ctx, check_data)))
    }

    pub fn get_entrance_fee(&self) -> Result<U256, DevnetError> {
        self.read(|raffle, _| Ok(raffle.get_entrance_fee()))
    }

    pub fn get_player(&self, index: u64) -> Result<Address, DevnetError> {
        self.read(|raffle, _| raffle.get_player(U256::from(index)))
    }

    pub fn get_recent_winner(&self) -> Result<Address, DevnetError> {
        self.read(|raffle, _| Ok(raffle.get_recent_winner()))
    }

    pub fn get_raffle_state(&self) -> Result<RaffleState, DevnetError> {
        self.read(|raffle, _| Ok(raffle.get_raffle_state()))
    }

    pub fn get_num_words(&self) -> Result<u32, DevnetError> {
        self.read(|raffle, _| Ok(raffle.get_num_words()))
    }

    pub fn get_number_of_players(&self) -> Result<U256, DevnetError> {
        self.read(|raffle, _| Ok(raffle.get_number_of_players()))
    }

    pub fn get_latest_time_stamp(&self) -> Result<u64, DevnetError> {
        self.read(|raffle, _| Ok(raffle.get_latest_time_stamp()))
    }

    pub fn get_request_confirmations(&self) -> Result<u16, DevnetError> {
        self.read(|raffle, _| Ok(raffle.get_request_confirmations()))
    }

    pub fn get_interval(&self) -> Result<u64, DevnetError> {
        self.read(|raffle, _| Ok(raffle.get_interval()))
    }

    fn send<R>(
        &self,
        value: U256,
        call: impl FnOnce(&mut Millionaire, &mut CallContext<'_>, &mut Contracts) -> Result<R, ContractRevert>,
    ) -> Result<(R, Receipt), DevnetError> {
        self.devnet
            .transact(self.signer, self.address, value, |contract, ctx, contracts| {
                let raffle = contract
                    .as_millionaire_mut()
                    .ok_or_else(ContractRevert::empty)?;
                call(raffle, ctx, contracts)
            })
    }

    fn read<R>(
        &self,
        call: impl FnOnce(&Millionaire, &CallContext<'_>) -> Result<R, ContractRevert>,
    ) -> Result<R, DevnetError> {
        self.devnet.view(self.signer, self.address, |contract, ctx| {
            let raffle = contract.as_millionaire().ok_or_else(ContractRevert::empty)?;
            call(raffle, ctx)
        })
    }
}

#[derive(Clone, Debug)]
pub struct VrfCoordinatorV2MockHandle {
    devnet: Devnet,
    address: Address,
    signer: Address,
}

impl ContractHandle for VrfCoordinatorV2MockHandle {
    const KIND: ContractKind = ContractKind::VrfCoordinatorV2Mock;

    fn bind(devnet: Devnet, address: Address, signer: Address) -> Self {
        Self {
            devnet,
            address,
            signer,
        }
    }
}

impl VrfCoordinatorV2MockHandle {
    pub fn connect(&self, signer: Address) -> Self {
        Self::bind(self.devnet.clone(), self.address, signer)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    /// The new subscription id is carried by the `SubscriptionCreated` event.
    pub fn create_subscription(&self) -> Result<Receipt, DevnetError> {
        self.send(|mock, ctx, _| Ok(mock.create_subscription(ctx)))
    }

    pub fn fund_subscription(&self, sub_id: u64, amount: U256) -> Result<Receipt, DevnetError> {
        self.send(|mock, ctx, _| mock.fund_subscription(ctx, sub_id, amount))
    }

    pub fn add_consumer(&self, sub_id: u64, consumer: Address) -> Result<Receipt, DevnetError> {
        self.send(|mock, ctx, _| mock.add_consumer(ctx, sub_id, consumer))
    }

    pub fn remove_consumer(&self, sub_id: u64, consumer: Address) -> Result<Receipt, DevnetError> {
        self.send(|mock, ctx, _| mock.remove_consumer(ctx, sub_id, consumer))
    }

    pub fn cancel_subscription(&self, sub_id: u64, to: Address) -> Result<Receipt, DevnetError> {
        self.send(|mock, ctx, _| mock.cancel_subscription(ctx, sub_id, to))
    }

    /// Play the oracle: deliver words derived from `request_id` to `consumer`.
    pub fn fulfill_random_words(
        &self,
        request_id: U256,
        consumer: Address,
    ) -> Result<Receipt, DevnetError> {
        self.fulfill_random_words_with_override(request_id, consumer, Vec::new())
    }

    pub fn fulfill_random_words_with_override(
        &self,
        request_id: U256,
        consumer: Address,
        words: Vec<U256>,
    ) -> Result<Receipt, DevnetError> {
        self.send(|mock, ctx, contracts| {
            let target = contracts
                .get_mut(&consumer)
                .and_then(|c| c.as_vrf_consumer());
            mock.fulfill_random_words_with_override(ctx, request_id, consumer, target, words)
        })
    }

    /// `(balance, reqCount, owner, consumers)`.
    pub fn get_subscription(
        &self,
        sub_id: u64,
    ) -> Result<(U256, u64, Address, Vec<Address>), DevnetError> {
        self.read(|mock| mock.get_subscription(sub_id))
    }

    pub fn consumer_is_added(&self, sub_id: u64, consumer: Address) -> Result<bool, DevnetError> {
        self.read(|mock| Ok(mock.consumer_is_added(sub_id, consumer)))
    }

    pub fn pending_request(&self, request_id: U256) -> Result<bool, DevnetError> {
        self.read(|mock| Ok(mock.pending_request(request_id)))
    }

    pub fn base_fee(&self) -> Result<U256, DevnetError> {
        self.read(|mock| Ok(mock.base_fee()))
    }

    pub fn gas_price_link(&self) -> Result<U256, DevnetError> {
        self.read(|mock| Ok(mock.gas_price_link()))
    }

    fn send<R>(
        &self,
        call: impl FnOnce(&mut VrfCoordinatorV2Mock, &mut CallContext<'_>, &mut Contracts) -> Result<R, ContractRevert>,
    ) -> Result<Receipt, DevnetError> {
        self.devnet
            .transact(self.signer, self.address, U256::ZERO, |contract, ctx, contracts| {
                let mock = contract.as_vrf_mock_mut().ok_or_else(ContractRevert::empty)?;
                call(mock, ctx, contracts)
            })
            .map(|(_, receipt)| receipt)
    }

    fn read<R>(
        &self,
        call: impl FnOnce(&VrfCoordinatorV2Mock) -> Result<R, ContractRevert>,
    ) -> Result<R, DevnetError> {
        self.devnet.view(self.signer, self.address, |contract, _| {
            let mock = contract.as_vrf_mock().ok_or_else(ContractRevert::empty)?;
            call(mock)
        })
    }
}
