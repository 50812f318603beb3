/// Chain id reserved for the in-process development network.
pub const LOCAL_CHAIN_ID: u64 = 31337;

/// Network names treated as development chains (mocks are available there).
pub const DEVELOPMENT_CHAINS: [&str; 2] = ["hardhat", "localhost"];

/// Identity of the network a run is executing against.
///
/// Supplied once by whoever starts the run and passed explicitly to everything that needs it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NetworkContext {
    pub chain_id: u64,
    pub name: String,
}

impl NetworkContext {
    pub fn new(chain_id: u64, name: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
        }
    }

    /// The default in-process network (`hardhat`, chain id 31337).
    pub fn local() -> Self {
        Self::new(LOCAL_CHAIN_ID, "hardhat")
    }

    pub fn is_local(&self) -> bool {
        is_local_network(self.chain_id)
    }
}

/// Returns true iff `chain_id` designates the local ephemeral network.
///
/// Unknown ids are never local, so mocks are not deployed to them.
pub fn is_local_network(chain_id: u64) -> bool {
    chain_id == LOCAL_CHAIN_ID
}

/// Returns true iff `name` is listed in `development_chains`.
pub fn is_development_chain<S: AsRef<str>>(name: &str, development_chains: &[S]) -> bool {
    development_chains.iter().any(|c| c.as_ref() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_reserved_id_is_local() {
        assert!(is_local_network(31337));
        for id in [0, 1, 5, 137, 31336, 31338, 11155111, u64::MAX] {
            assert!(!is_local_network(id), "chain id {id} must not be local");
        }
    }

    #[test]
    fn development_chains_match_by_name() {
        assert!(is_development_chain("hardhat", &DEVELOPMENT_CHAINS));
        assert!(is_development_chain("localhost", &DEVELOPMENT_CHAINS));
        assert!(!is_development_chain("sepolia", &DEVELOPMENT_CHAINS));
        assert!(!is_development_chain("Hardhat", &DEVELOPMENT_CHAINS));
    }

    #[test]
    fn local_context_is_local() {
        let ctx = NetworkContext::local();
        assert_eq!(ctx.chain_id, LOCAL_CHAIN_ID);
        assert!(ctx.is_local());
        assert!(!NetworkContext::new(11155111, "sepolia").is_local());
    }
}
