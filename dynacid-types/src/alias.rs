use serde_derive::Deserialize;
use serde_derive::Serialize;

/// What an alias points to. Persisted as one small JSON file per alias.
///
/// An empty `value` means the alias is registered but was never set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AliasRecord {
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl AliasRecord {
    pub fn is_set(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Request body of an alias update.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AliasUpdate {
    pub cid: String,

    #[serde(default)]
    pub redirect: Option<String>,
}
