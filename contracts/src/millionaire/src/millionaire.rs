//! The Millionaire lottery.
//!
//! Players enter by paying at least the entrance fee. Once the interval has elapsed and there is
//! at least one player, upkeep asks the VRF coordinator for a random word; the coordinator's
//! callback picks the winner, pays out the whole pot and reopens the raffle.

use alloy_primitives::{Address, Bytes, B256, U256};
use millionaire_types::RaffleState;

use crate::{
    context::CallContext,
    errors::{ContractRevert, PANIC_ARRAY_OUT_OF_BOUNDS, PANIC_DIVISION_BY_ZERO},
    interfaces::{
        MillionaireEnter, Millionaire__NotEnoughEthEntered, Millionaire__RaffleNotOpen,
        Millionaire__TransferFailed, Millionaire__UpkeepNotNeeded, OnlyCoordinatorCanFulfill,
        RequestedRaffleWinner, VrfConsumerV2, VrfCoordinatorV2, WinnerPicked,
    },
};

pub const REQUEST_CONFIRMATIONS: u16 = 3;
pub const NUM_WORDS: u32 = 1;

/// Constructor arguments, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MillionaireArgs {
    pub vrf_coordinator: Address,
    pub entrance_fee: U256,
    pub gas_lane: B256,
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    pub interval: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Millionaire {
    vrf_coordinator: Address,
    entrance_fee: U256,
    gas_lane: B256,
    subscription_id: u64,
    callback_gas_limit: u32,
    interval: u64,
    players: Vec<Address>,
    recent_winner: Address,
    state: RaffleState,
    last_time_stamp: u64,
}

impl Millionaire {
    pub fn new(ctx: &CallContext<'_>, args: MillionaireArgs) -> Self {
        Self {
            vrf_coordinator: args.vrf_coordinator,
            entrance_fee: args.entrance_fee,
            gas_lane: args.gas_lane,
            subscription_id: args.subscription_id,
            callback_gas_limit: args.callback_gas_limit,
            interval: args.interval,
            players: Vec::new(),
            recent_winner: Address::ZERO,
            state: RaffleState::Open,
            last_time_stamp: ctx.timestamp(),
        }
    }

    /// Payable. Records `msg.sender` as a player.
    pub fn enter_raffle(&mut self, ctx: &mut CallContext<'_>) -> Result<(), ContractRevert> {
        if ctx.value() < self.entrance_fee {
            return Err(ContractRevert::custom(Millionaire__NotEnoughEthEntered {}));
        }
        if self.state != RaffleState::Open {
            return Err(ContractRevert::custom(Millionaire__RaffleNotOpen {}));
        }
        let player = ctx.sender();
        self.players.push(player);
        ctx.emit(&MillionaireEnter { player });
        Ok(())
    }

    /// Upkeep is needed once the raffle is open, the interval has passed, and there are players
    /// and a pot.
    pub fn check_upkeep(&self, ctx: &CallContext<'_>, _check_data: &[u8]) -> (bool, Bytes) {
        (self.upkeep_needed(ctx), Bytes::new())
    }

    /// Close entries and request a random word. Returns the VRF request id.
    pub fn perform_upkeep(
        &mut self,
        ctx: &mut CallContext<'_>,
        _perform_data: &[u8],
        coordinator: Option<&mut dyn VrfCoordinatorV2>,
    ) -> Result<U256, ContractRevert> {
        if !self.upkeep_needed(ctx) {
            return Err(ContractRevert::custom(Millionaire__UpkeepNotNeeded {
                currentBalance: ctx.self_balance(),
                numPlayers: U256::from(self.players.len()),
                raffleState: self.state.into(),
            }));
        }
        // Calling an address without code reverts without data.
        let coordinator = coordinator.ok_or_else(ContractRevert::empty)?;

        self.state = RaffleState::Calculating;
        let request_id = {
            let mut call = ctx.call(self.vrf_coordinator);
            coordinator.request_random_words(
                &mut call,
                self.gas_lane,
                self.subscription_id,
                REQUEST_CONFIRMATIONS,
                self.callback_gas_limit,
                NUM_WORDS,
            )
        };
        let request_id = match request_id {
            Ok(id) => id,
            Err(revert) => {
                self.state = RaffleState::Open;
                return Err(revert);
            }
        };
        ctx.emit(&RequestedRaffleWinner {
            requestId: request_id,
        });
        Ok(request_id)
    }

    pub fn get_entrance_fee(&self) -> U256 {
        self.entrance_fee
    }

    pub fn get_player(&self, index: U256) -> Result<Address, ContractRevert> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.players.get(i).copied())
            .ok_or_else(|| ContractRevert::panic(PANIC_ARRAY_OUT_OF_BOUNDS))
    }

    pub fn get_recent_winner(&self) -> Address {
        self.recent_winner
    }

    pub fn get_raffle_state(&self) -> RaffleState {
        self.state
    }

    pub fn get_num_words(&self) -> u32 {
        NUM_WORDS
    }

    pub fn get_number_of_players(&self) -> U256 {
        U256::from(self.players.len())
    }

    pub fn get_latest_time_stamp(&self) -> u64 {
        self.last_time_stamp
    }

    pub fn get_request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    pub fn get_interval(&self) -> u64 {
        self.interval
    }

    pub fn vrf_coordinator(&self) -> Address {
        self.vrf_coordinator
    }

    pub fn subscription_id(&self) -> u64 {
        self.subscription_id
    }

    fn upkeep_needed(&self, ctx: &CallContext<'_>) -> bool {
        let is_open = self.state == RaffleState::Open;
        let time_passed = ctx.timestamp().saturating_sub(self.last_time_stamp) > self.interval;
        let has_players = !self.players.is_empty();
        let has_balance = !ctx.self_balance().is_zero();
        is_open && time_passed && has_players && has_balance
    }

    fn fulfill_random_words(
        &mut self,
        ctx: &mut CallContext<'_>,
        random_words: &[U256],
    ) -> Result<(), ContractRevert> {
        let word = random_words
            .first()
            .ok_or_else(|| ContractRevert::panic(PANIC_ARRAY_OUT_OF_BOUNDS))?;
        if self.players.is_empty() {
            return Err(ContractRevert::panic(PANIC_DIVISION_BY_ZERO));
        }
        let index = *word % U256::from(self.players.len());
        let winner = self.players[index.to::<usize>()];

        // Pay out before touching state so a failed transfer leaves the raffle as it was.
        let prize = ctx.self_balance();
        ctx.transfer(winner, prize)
            .map_err(|_| ContractRevert::custom(Millionaire__TransferFailed {}))?;

        self.recent_winner = winner;
        self.state = RaffleState::Open;
        self.players.clear();
        self.last_time_stamp = ctx.timestamp();
        ctx.emit(&WinnerPicked { winner });
        Ok(())
    }
}

impl VrfConsumerV2 for Millionaire {
    fn raw_fulfill_random_words(
        &mut self,
        ctx: &mut CallContext<'_>,
        _request_id: U256,
        random_words: &[U256],
    ) -> Result<(), ContractRevert> {
        if ctx.sender() != self.vrf_coordinator {
            return Err(ContractRevert::custom(OnlyCoordinatorCanFulfill {
                have: ctx.sender(),
                want: self.vrf_coordinator,
            }));
        }
        self.fulfill_random_words(ctx, random_words)
    }
}
