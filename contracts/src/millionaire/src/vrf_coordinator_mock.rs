//! Local stand-in for Chainlink's `VRFCoordinatorV2Mock`.
//!
//! Subscriptions are plain balances (no LINK token), and fulfillment is triggered explicitly by
//! whoever plays the oracle. Randomness is derived deterministically from the request id.

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::{
    context::CallContext,
    errors::ContractRevert,
    interfaces::{
        ConsumerAdded, ConsumerRemoved, InsufficientBalance, InvalidConsumer, InvalidRandomWords,
        InvalidSubscription, MustBeSubOwner, RandomWordsFulfilled, RandomWordsRequested,
        SubscriptionCanceled, SubscriptionCreated, SubscriptionFunded, TooManyConsumers,
        VrfConsumerV2, VrfCoordinatorV2,
    },
};

pub const MAX_CONSUMERS: usize = 100;

/// Gas the mock bills for every consumer callback.
pub const SIMULATED_CALLBACK_GAS: u64 = 100_000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subscription {
    pub owner: Address,
    pub balance: U256,
    pub consumers: Vec<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Request {
    sub_id: u64,
    callback_gas_limit: u32,
    num_words: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VrfCoordinatorV2Mock {
    base_fee: U256,
    gas_price_link: U256,
    current_sub_id: u64,
    next_request_id: U256,
    next_pre_seed: U256,
    subscriptions: BTreeMap<u64, Subscription>,
    requests: BTreeMap<U256, Request>,
}

impl VrfCoordinatorV2Mock {
    pub fn new(base_fee: U256, gas_price_link: U256) -> Self {
        Self {
            base_fee,
            gas_price_link,
            current_sub_id: 0,
            next_request_id: U256::from(1u64),
            next_pre_seed: U256::from(100u64),
            subscriptions: BTreeMap::new(),
            requests: BTreeMap::new(),
        }
    }

    pub fn base_fee(&self) -> U256 {
        self.base_fee
    }

    pub fn gas_price_link(&self) -> U256 {
        self.gas_price_link
    }

    pub fn create_subscription(&mut self, ctx: &mut CallContext<'_>) -> u64 {
        self.current_sub_id += 1;
        let sub_id = self.current_sub_id;
        self.subscriptions.insert(
            sub_id,
            Subscription {
                owner: ctx.sender(),
                ..Subscription::default()
            },
        );
        ctx.emit(&SubscriptionCreated {
            subId: sub_id,
            owner: ctx.sender(),
        });
        sub_id
    }

    pub fn fund_subscription(
        &mut self,
        ctx: &mut CallContext<'_>,
        sub_id: u64,
        amount: U256,
    ) -> Result<(), ContractRevert> {
        let sub = self
            .subscriptions
            .get_mut(&sub_id)
            .ok_or_else(|| ContractRevert::custom(InvalidSubscription {}))?;
        let old_balance = sub.balance;
        sub.balance = old_balance.saturating_add(amount);
        ctx.emit(&SubscriptionFunded {
            subId: sub_id,
            oldBalance: old_balance,
            newBalance: sub.balance,
        });
        Ok(())
    }

    pub fn add_consumer(
        &mut self,
        ctx: &mut CallContext<'_>,
        sub_id: u64,
        consumer: Address,
    ) -> Result<(), ContractRevert> {
        let sub = self.owned_subscription_mut(sub_id, ctx.sender())?;
        if sub.consumers.contains(&consumer) {
            return Ok(());
        }
        if sub.consumers.len() == MAX_CONSUMERS {
            return Err(ContractRevert::custom(TooManyConsumers {}));
        }
        sub.consumers.push(consumer);
        ctx.emit(&ConsumerAdded {
            subId: sub_id,
            consumer,
        });
        Ok(())
    }

    pub fn remove_consumer(
        &mut self,
        ctx: &mut CallContext<'_>,
        sub_id: u64,
        consumer: Address,
    ) -> Result<(), ContractRevert> {
        let sub = self.owned_subscription_mut(sub_id, ctx.sender())?;
        let position = sub
            .consumers
            .iter()
            .position(|c| *c == consumer)
            .ok_or_else(|| ContractRevert::custom(InvalidConsumer {}))?;
        sub.consumers.remove(position);
        ctx.emit(&ConsumerRemoved {
            subId: sub_id,
            consumer,
        });
        Ok(())
    }

    pub fn cancel_subscription(
        &mut self,
        ctx: &mut CallContext<'_>,
        sub_id: u64,
        to: Address,
    ) -> Result<(), ContractRevert> {
        let amount = self.owned_subscription_mut(sub_id, ctx.sender())?.balance;
        self.subscriptions.remove(&sub_id);
        ctx.emit(&SubscriptionCanceled {
            subId: sub_id,
            to,
            amount,
        });
        Ok(())
    }

    /// `(balance, reqCount, owner, consumers)`.
    pub fn get_subscription(
        &self,
        sub_id: u64,
    ) -> Result<(U256, u64, Address, Vec<Address>), ContractRevert> {
        let sub = self
            .subscriptions
            .get(&sub_id)
            .ok_or_else(|| ContractRevert::custom(InvalidSubscription {}))?;
        Ok((sub.balance, 0, sub.owner, sub.consumers.clone()))
    }

    pub fn consumer_is_added(&self, sub_id: u64, consumer: Address) -> bool {
        self.subscriptions
            .get(&sub_id)
            .is_some_and(|sub| sub.consumers.contains(&consumer))
    }

    pub fn pending_request(&self, request_id: U256) -> bool {
        self.requests.contains_key(&request_id)
    }

    /// Fulfill `request_id` with words derived from the request id.
    pub fn fulfill_random_words(
        &mut self,
        ctx: &mut CallContext<'_>,
        request_id: U256,
        consumer_address: Address,
        consumer: Option<&mut dyn VrfConsumerV2>,
    ) -> Result<(), ContractRevert> {
        self.fulfill_random_words_with_override(
            ctx,
            request_id,
            consumer_address,
            consumer,
            Vec::new(),
        )
    }

    /// Fulfill `request_id`, delivering `words` (or derived words when empty) to the consumer.
    ///
    /// A consumer that reverts (or has no code) does not revert the fulfillment; it is reported as
    /// `success = false` and its side effects are discarded.
    pub fn fulfill_random_words_with_override(
        &mut self,
        ctx: &mut CallContext<'_>,
        request_id: U256,
        consumer_address: Address,
        consumer: Option<&mut dyn VrfConsumerV2>,
        words: Vec<U256>,
    ) -> Result<(), ContractRevert> {
        let request = self
            .requests
            .get(&request_id)
            .cloned()
            .ok_or_else(|| ContractRevert::message("nonexistent request"))?;

        let words = if words.is_empty() {
            (0..request.num_words)
                .map(|i| derive_word(request_id, i))
                .collect()
        } else if words.len() != request.num_words as usize {
            return Err(ContractRevert::custom(InvalidRandomWords {}));
        } else {
            words
        };

        let billed_gas = SIMULATED_CALLBACK_GAS.min(u64::from(request.callback_gas_limit));
        let payment = self.base_fee + self.gas_price_link * U256::from(billed_gas);
        if !self
            .subscriptions
            .get(&request.sub_id)
            .is_some_and(|sub| sub.balance >= payment)
        {
            return Err(ContractRevert::custom(InsufficientBalance {}));
        }

        self.requests.remove(&request_id);

        let success = match consumer {
            Some(consumer) => {
                let checkpoint = ctx.checkpoint();
                let outcome = {
                    let mut callback = ctx.call(consumer_address);
                    consumer.raw_fulfill_random_words(&mut callback, request_id, &words)
                };
                if outcome.is_err() {
                    ctx.restore(checkpoint);
                }
                outcome.is_ok()
            }
            None => false,
        };

        if let Some(sub) = self.subscriptions.get_mut(&request.sub_id) {
            sub.balance -= payment;
        }

        ctx.emit(&RandomWordsFulfilled {
            requestId: request_id,
            outputSeed: request_id,
            payment,
            success,
        });
        Ok(())
    }

    fn owned_subscription_mut(
        &mut self,
        sub_id: u64,
        caller: Address,
    ) -> Result<&mut Subscription, ContractRevert> {
        let sub = self
            .subscriptions
            .get_mut(&sub_id)
            .ok_or_else(|| ContractRevert::custom(InvalidSubscription {}))?;
        if sub.owner != caller {
            return Err(ContractRevert::custom(MustBeSubOwner { owner: sub.owner }));
        }
        Ok(sub)
    }
}

impl VrfCoordinatorV2 for VrfCoordinatorV2Mock {
    fn request_random_words(
        &mut self,
        ctx: &mut CallContext<'_>,
        key_hash: B256,
        sub_id: u64,
        minimum_request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    ) -> Result<U256, ContractRevert> {
        let sub = self
            .subscriptions
            .get(&sub_id)
            .ok_or_else(|| ContractRevert::custom(InvalidSubscription {}))?;
        if !sub.consumers.contains(&ctx.sender()) {
            return Err(ContractRevert::custom(InvalidConsumer {}));
        }

        let request_id = self.next_request_id;
        let pre_seed = self.next_pre_seed;
        self.next_request_id += U256::from(1u64);
        self.next_pre_seed += U256::from(1u64);
        self.requests.insert(
            request_id,
            Request {
                sub_id,
                callback_gas_limit,
                num_words,
            },
        );

        ctx.emit(&RandomWordsRequested {
            keyHash: key_hash,
            requestId: request_id,
            preSeed: pre_seed,
            subId: sub_id,
            minimumRequestConfirmations: minimum_request_confirmations,
            callbackGasLimit: callback_gas_limit,
            numWords: num_words,
            sender: ctx.sender(),
        });
        Ok(request_id)
    }
}

/// `uint256(keccak256(abi.encode(requestId, i)))`.
fn derive_word(request_id: U256, index: u32) -> U256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&request_id.to_be_bytes::<32>());
    buf[32..].copy_from_slice(&U256::from(index).to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{BlockEnv, Ledger};
    use millionaire_types::mocks::{BASE_FEE, GAS_PRICE_LINK, VRF_SUB_FUND_AMOUNT};

    const BLOCK: BlockEnv = BlockEnv {
        number: 1,
        timestamp: 1_000,
        chain_id: 31337,
    };

    fn coordinator_address() -> Address {
        Address::repeat_byte(0xc0)
    }

    fn ctx<'a>(sender: Address, ledger: &'a mut Ledger) -> CallContext<'a> {
        CallContext::new(sender, coordinator_address(), U256::ZERO, BLOCK, ledger)
    }

    /// Records whatever it is fulfilled with, or reverts on demand.
    #[derive(Default)]
    struct RecordingConsumer {
        fail: bool,
        received: Vec<U256>,
    }

    impl VrfConsumerV2 for RecordingConsumer {
        fn raw_fulfill_random_words(
            &mut self,
            ctx: &mut CallContext<'_>,
            _request_id: U256,
            random_words: &[U256],
        ) -> Result<(), ContractRevert> {
            ctx.emit(&ConsumerAdded {
                subId: 0,
                consumer: ctx.this(),
            });
            if self.fail {
                return Err(ContractRevert::message("consumer failed"));
            }
            self.received = random_words.to_vec();
            Ok(())
        }
    }

    fn funded_mock(owner: Address, consumer: Address, ledger: &mut Ledger) -> (VrfCoordinatorV2Mock, u64) {
        let mut mock = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);
        let mut c = ctx(owner, ledger);
        let sub_id = mock.create_subscription(&mut c);
        mock.fund_subscription(&mut c, sub_id, VRF_SUB_FUND_AMOUNT).unwrap();
        mock.add_consumer(&mut c, sub_id, consumer).unwrap();
        (mock, sub_id)
    }

    #[test]
    fn subscriptions_start_at_one_and_track_owner() {
        let owner = Address::repeat_byte(1);
        let mut ledger = Ledger::default();
        let mut mock = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);
        let mut c = ctx(owner, &mut ledger);

        assert_eq!(mock.create_subscription(&mut c), 1);
        assert_eq!(mock.create_subscription(&mut c), 2);
        let (balance, _, sub_owner, consumers) = mock.get_subscription(1).unwrap();
        assert_eq!(balance, U256::ZERO);
        assert_eq!(sub_owner, owner);
        assert!(consumers.is_empty());
        assert!(mock.get_subscription(3).unwrap_err().is::<InvalidSubscription>());
    }

    #[test]
    fn only_owner_manages_consumers() {
        let owner = Address::repeat_byte(1);
        let stranger = Address::repeat_byte(2);
        let consumer = Address::repeat_byte(3);
        let mut ledger = Ledger::default();
        let (mut mock, sub_id) = funded_mock(owner, consumer, &mut ledger);

        let err = mock
            .add_consumer(&mut ctx(stranger, &mut ledger), sub_id, stranger)
            .unwrap_err();
        assert_eq!(err.decode::<MustBeSubOwner>().unwrap().owner, owner);

        let err = mock
            .remove_consumer(&mut ctx(owner, &mut ledger), sub_id, stranger)
            .unwrap_err();
        assert!(err.is::<InvalidConsumer>());

        mock.remove_consumer(&mut ctx(owner, &mut ledger), sub_id, consumer)
            .unwrap();
        assert!(!mock.consumer_is_added(sub_id, consumer));
    }

    #[test]
    fn consumer_limit_is_enforced() {
        let owner = Address::repeat_byte(1);
        let mut ledger = Ledger::default();
        let mut mock = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);
        let mut c = ctx(owner, &mut ledger);
        let sub_id = mock.create_subscription(&mut c);
        for i in 0..MAX_CONSUMERS {
            let consumer = Address::with_last_byte(i as u8 + 1);
            mock.add_consumer(&mut c, sub_id, consumer).unwrap();
        }
        let err = mock
            .add_consumer(&mut c, sub_id, Address::repeat_byte(0xff))
            .unwrap_err();
        assert!(err.is::<TooManyConsumers>());
    }

    #[test]
    fn unregistered_callers_cannot_request() {
        let owner = Address::repeat_byte(1);
        let consumer = Address::repeat_byte(3);
        let mut ledger = Ledger::default();
        let (mut mock, sub_id) = funded_mock(owner, consumer, &mut ledger);

        let err = mock
            .request_random_words(&mut ctx(owner, &mut ledger), B256::ZERO, sub_id, 3, 500_000, 1)
            .unwrap_err();
        assert!(err.is::<InvalidConsumer>());

        let err = mock
            .request_random_words(&mut ctx(consumer, &mut ledger), B256::ZERO, 99, 3, 500_000, 1)
            .unwrap_err();
        assert!(err.is::<InvalidSubscription>());
    }

    #[test]
    fn fulfillment_delivers_words_and_bills_subscription() {
        let owner = Address::repeat_byte(1);
        let consumer_address = Address::repeat_byte(3);
        let mut ledger = Ledger::default();
        let (mut mock, sub_id) = funded_mock(owner, consumer_address, &mut ledger);

        let request_id = mock
            .request_random_words(
                &mut ctx(consumer_address, &mut ledger),
                B256::ZERO,
                sub_id,
                3,
                500_000,
                2,
            )
            .unwrap();
        assert_eq!(request_id, U256::from(1u64));
        assert!(mock.pending_request(request_id));

        let mut consumer = RecordingConsumer::default();
        mock.fulfill_random_words(
            &mut ctx(owner, &mut ledger),
            request_id,
            consumer_address,
            Some(&mut consumer),
        )
        .unwrap();

        assert_eq!(
            consumer.received,
            vec![derive_word(request_id, 0), derive_word(request_id, 1)]
        );
        assert!(!mock.pending_request(request_id));
        let payment = BASE_FEE + GAS_PRICE_LINK * U256::from(SIMULATED_CALLBACK_GAS);
        let (balance, _, _, _) = mock.get_subscription(sub_id).unwrap();
        assert_eq!(balance, VRF_SUB_FUND_AMOUNT - payment);

        let err = mock
            .fulfill_random_words(&mut ctx(owner, &mut ledger), request_id, consumer_address, None)
            .unwrap_err();
        assert_eq!(err.reason().as_deref(), Some("nonexistent request"));
    }

    #[test]
    fn failing_consumer_is_reported_without_reverting() {
        let owner = Address::repeat_byte(1);
        let consumer_address = Address::repeat_byte(3);
        let mut ledger = Ledger::default();
        let (mut mock, sub_id) = funded_mock(owner, consumer_address, &mut ledger);
        let request_id = mock
            .request_random_words(
                &mut ctx(consumer_address, &mut ledger),
                B256::ZERO,
                sub_id,
                3,
                500_000,
                1,
            )
            .unwrap();
        ledger.take_logs();

        let mut consumer = RecordingConsumer {
            fail: true,
            ..RecordingConsumer::default()
        };
        mock.fulfill_random_words(
            &mut ctx(owner, &mut ledger),
            request_id,
            consumer_address,
            Some(&mut consumer),
        )
        .unwrap();

        // Only the coordinator's own event survives.
        let logs = ledger.take_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].address, coordinator_address());
        let fulfilled =
            <RandomWordsFulfilled as alloy_sol_types::SolEvent>::decode_log_data(&logs[0].data, true)
                .unwrap();
        assert!(!fulfilled.success);
        assert!(consumer.received.is_empty());
    }

    #[test]
    fn override_must_match_requested_word_count() {
        let owner = Address::repeat_byte(1);
        let consumer_address = Address::repeat_byte(3);
        let mut ledger = Ledger::default();
        let (mut mock, sub_id) = funded_mock(owner, consumer_address, &mut ledger);
        let request_id = mock
            .request_random_words(
                &mut ctx(consumer_address, &mut ledger),
                B256::ZERO,
                sub_id,
                3,
                500_000,
                1,
            )
            .unwrap();

        let err = mock
            .fulfill_random_words_with_override(
                &mut ctx(owner, &mut ledger),
                request_id,
                consumer_address,
                None,
                vec![U256::from(1u64), U256::from(2u64)],
            )
            .unwrap_err();
        assert!(err.is::<InvalidRandomWords>());
        assert!(mock.pending_request(request_id));
    }

    #[test]
    fn unfunded_subscription_cannot_pay() {
        let owner = Address::repeat_byte(1);
        let consumer_address = Address::repeat_byte(3);
        let mut ledger = Ledger::default();
        let mut mock = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);
        let sub_id = mock.create_subscription(&mut ctx(owner, &mut ledger));
        mock.add_consumer(&mut ctx(owner, &mut ledger), sub_id, consumer_address)
            .unwrap();
        let request_id = mock
            .request_random_words(
                &mut ctx(consumer_address, &mut ledger),
                B256::ZERO,
                sub_id,
                3,
                500_000,
                1,
            )
            .unwrap();

        let mut consumer = RecordingConsumer::default();
        let err = mock
            .fulfill_random_words(
                &mut ctx(owner, &mut ledger),
                request_id,
                consumer_address,
                Some(&mut consumer),
            )
            .unwrap_err();
        assert!(err.is::<InsufficientBalance>());
        assert!(mock.pending_request(request_id));
        assert!(consumer.received.is_empty());
        assert!(ledger.logs().iter().all(|log| log.address != consumer_address));
    }
}
