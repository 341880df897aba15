//! Payloads handed back to callers of the resolver.
use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;

/// A successful resolution.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Resolution {
    pub value: Value,

    /// Only ever set for aliases that carry a redirect target.
    #[serde(
        default,
        rename = "redirectTarget",
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect: Option<String>,
}

impl Resolution {
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            redirect: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorReply {
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AliasReply {
    pub alias: String,
}
