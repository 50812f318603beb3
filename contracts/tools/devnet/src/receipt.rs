//! Transaction receipts and typed event lookup.

use alloy_primitives::{Address, Log, B256, U256};
use alloy_sol_types::SolEvent;

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub effective_gas_price: U256,
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Total fee paid by the sender.
    pub fn gas_cost(&self) -> U256 {
        U256::from(self.gas_used) * self.effective_gas_price
    }

    /// Every `E` in the receipt, whichever contract emitted it.
    pub fn events<E: SolEvent>(&self) -> Vec<E> {
        self.logs
            .iter()
            .filter_map(|log| decode::<E>(log))
            .collect()
    }

    /// Every `E` emitted by `emitter`.
    pub fn events_from<E: SolEvent>(&self, emitter: Address) -> Vec<E> {
        self.logs
            .iter()
            .filter(|log| log.address == emitter)
            .filter_map(|log| decode::<E>(log))
            .collect()
    }

    /// The first `E` in the receipt.
    pub fn event<E: SolEvent>(&self) -> Option<E> {
        self.logs.iter().find_map(|log| decode::<E>(log))
    }

    /// The first `E` emitted by `emitter`.
    pub fn emitted<E: SolEvent>(&self, emitter: Address) -> Option<E> {
        self.logs
            .iter()
            .filter(|log| log.address == emitter)
            .find_map(|log| decode::<E>(log))
    }
}

fn decode<E: SolEvent>(log: &Log) -> Option<E> {
    if log.data.topics().first() != Some(&E::SIGNATURE_HASH) {
        return None;
    }
    E::decode_log_data(&log.data, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use millionaire::interfaces::{MillionaireEnter, WinnerPicked};

    fn receipt_with(logs: Vec<Log>) -> Receipt {
        Receipt {
            transaction_hash: B256::ZERO,
            block_number: 1,
            block_timestamp: 1,
            from: Address::ZERO,
            to: None,
            contract_address: None,
            gas_used: 21_000,
            effective_gas_price: U256::from(2u64),
            logs,
        }
    }

    fn log_of<E: SolEvent>(emitter: Address, event: &E) -> Log {
        Log {
            address: emitter,
            data: event.encode_log_data(),
        }
    }

    #[test]
    fn events_are_filtered_by_signature_and_emitter() {
        let raffle = Address::repeat_byte(0x11);
        let other = Address::repeat_byte(0x22);
        let player = Address::repeat_byte(0x33);
        let receipt = receipt_with(vec![
            log_of(other, &MillionaireEnter { player: other }),
            log_of(raffle, &MillionaireEnter { player }),
            log_of(raffle, &WinnerPicked { winner: player }),
        ]);

        assert_eq!(receipt.events::<MillionaireEnter>().len(), 2);
        assert_eq!(receipt.events_from::<MillionaireEnter>(raffle).len(), 1);
        assert_eq!(receipt.event::<MillionaireEnter>().unwrap().player, other);
        assert_eq!(
            receipt.emitted::<MillionaireEnter>(raffle).unwrap().player,
            player
        );
        assert_eq!(receipt.emitted::<WinnerPicked>(raffle).unwrap().winner, player);
        assert!(receipt.emitted::<WinnerPicked>(other).is_none());
    }

    #[test]
    fn gas_cost_is_gas_times_price() {
        assert_eq!(receipt_with(Vec::new()).gas_cost(), U256::from(42_000u64));
    }
}
