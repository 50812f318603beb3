//! Solidity ABI surface (errors + events) and the cross-contract interfaces.

use alloy_primitives::{B256, U256};
use alloy_sol_types::sol;

use crate::{context::CallContext, errors::ContractRevert};

sol! {
    error Millionaire__NotEnoughEthEntered();
    error Millionaire__RaffleNotOpen();
    error Millionaire__UpkeepNotNeeded(uint256 currentBalance, uint256 numPlayers, uint256 raffleState);
    error Millionaire__TransferFailed();
    error OnlyCoordinatorCanFulfill(address have, address want);

    event MillionaireEnter(address indexed player);
    event RequestedRaffleWinner(uint256 indexed requestId);
    event WinnerPicked(address indexed winner);
}

sol! {
    error InvalidSubscription();
    error InsufficientBalance();
    error MustBeSubOwner(address owner);
    error TooManyConsumers();
    error InvalidConsumer();
    error InvalidRandomWords();

    event RandomWordsRequested(
        bytes32 indexed keyHash,
        uint256 requestId,
        uint256 preSeed,
        uint64 indexed subId,
        uint16 minimumRequestConfirmations,
        uint32 callbackGasLimit,
        uint32 numWords,
        address indexed sender
    );
    event RandomWordsFulfilled(uint256 indexed requestId, uint256 outputSeed, uint256 payment, bool success);
    event SubscriptionCreated(uint64 indexed subId, address owner);
    event SubscriptionFunded(uint64 indexed subId, uint256 oldBalance, uint256 newBalance);
    event SubscriptionCanceled(uint64 indexed subId, address to, uint256 amount);
    event ConsumerAdded(uint64 indexed subId, address consumer);
    event ConsumerRemoved(uint64 indexed subId, address consumer);
}

/// `VRFCoordinatorV2Interface.requestRandomWords`, as seen by a consumer.
pub trait VrfCoordinatorV2 {
    fn request_random_words(
        &mut self,
        ctx: &mut CallContext<'_>,
        key_hash: B256,
        sub_id: u64,
        minimum_request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    ) -> Result<U256, ContractRevert>;
}

/// `VRFConsumerBaseV2.rawFulfillRandomWords`, invoked by the coordinator.
pub trait VrfConsumerV2 {
    fn raw_fulfill_random_words(
        &mut self,
        ctx: &mut CallContext<'_>,
        request_id: U256,
        random_words: &[U256],
    ) -> Result<(), ContractRevert>;
}
