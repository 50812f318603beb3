//! Constructor parameters for the local VRF coordinator mock.

use alloy_primitives::U256;

/// Premium charged per randomness request: 0.25 LINK (18 decimals).
pub const BASE_FEE: U256 = U256::from_limbs([250_000_000_000_000_000, 0, 0, 0]);

/// LINK charged per unit of callback gas.
pub const GAS_PRICE_LINK: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// Amount each development subscription is funded with: 2 LINK.
pub const VRF_SUB_FUND_AMOUNT: U256 = U256::from_limbs([2_000_000_000_000_000_000, 0, 0, 0]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_fee_is_a_quarter_link() {
        let one_link = U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(BASE_FEE * U256::from(4u64), one_link);
        assert_eq!(GAS_PRICE_LINK, U256::from(1_000_000_000u64));
        assert_eq!(VRF_SUB_FUND_AMOUNT, one_link * U256::from(2u64));
    }
}
