use core::fmt;

use alloy_primitives::U256;

/// Lottery lifecycle. Serialised on-chain as a `uint8`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RaffleState {
    #[default]
    Open = 0,
    Calculating = 1,
}

impl TryFrom<u8> for RaffleState {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err(()),
        }
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        state as u8
    }
}

impl From<RaffleState> for U256 {
    fn from(state: RaffleState) -> Self {
        U256::from(state as u8)
    }
}

impl fmt::Display for RaffleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_serialises_as_zero() {
        assert_eq!(RaffleState::Open.to_string(), "0");
        let encoded: U256 = RaffleState::Calculating.into();
        assert_eq!(encoded, U256::from(1u8));
        assert_eq!(RaffleState::try_from(1), Ok(RaffleState::Calculating));
        assert_eq!(RaffleState::try_from(2), Err(()));
    }
}
