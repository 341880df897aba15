use thiserror::Error;

/// Every way a resolution, registration or update can fail.
///
/// Nothing here is fatal: the caller always turns it into an error reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Malformed alias, or a missing/oversized request field.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The alias is not registered, or has no value yet.
    #[error("not found: {0}")]
    NotFound(String),

    /// The gateway could not serve the pointer document or the chain record.
    #[error("upstream fetch failed: {0}")]
    Upstream(String),

    /// The RPC call failed, including ABI/argument mismatches from a bad pointer document.
    #[error("contract call failed: {0}")]
    ContractCall(String),

    /// The contract result could not be encoded as requested.
    #[error("encoding failed: {0}")]
    Encoding(String),
}

impl ResolveError {
    /// Short stable name, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Validation(_) => "validation",
            ResolveError::NotFound(_) => "not_found",
            ResolveError::Upstream(_) => "upstream",
            ResolveError::ContractCall(_) => "contract_call",
            ResolveError::Encoding(_) => "encoding",
        }
    }

    pub(crate) fn upstream(err: anyhow::Error) -> Self {
        ResolveError::Upstream(format!("{err:#}"))
    }

    pub(crate) fn contract_call(err: anyhow::Error) -> Self {
        ResolveError::ContractCall(format!("{err:#}"))
    }
}
