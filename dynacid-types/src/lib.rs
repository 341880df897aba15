pub mod alias;
pub mod chain;
pub mod pointer;
pub mod reply;

/// EIP-155 chain identifier, as used by the public chain registry.
pub type ChainId = u64;
