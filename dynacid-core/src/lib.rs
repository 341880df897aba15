//! Resolution pipeline: turns an identifier into a stored alias value or into the result of a
//! contract read-call described by a pointer document on IPFS.
pub mod alias;
pub mod chain;
pub mod classify;
pub mod contract;
pub mod encoder;
pub mod error;
pub mod gateway;
pub mod pointer;
pub mod resolver;

pub use error::ResolveError;
pub use resolver::Resolver;
