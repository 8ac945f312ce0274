//! Human-readable network names.

use crate::provider::types::ChainId;

/// Map a chain id to the name of a well-known network.
///
/// Returns `None` for chains without a conventional name.
pub fn chain_id_to_network(chain_id: ChainId) -> Option<&'static str> {
    match chain_id.0 {
        1 => Some("mainnet"),
        3 => Some("ropsten"),
        4 => Some("rinkeby"),
        5 => Some("goerli"),
        42 => Some("kovan"),
        1337 => Some("ganache"),
        _ => None,
    }
}
