//! Deciding, from the shape of an identifier alone, which resolution path it takes.

/// Length of every alias, both generated and accepted.
pub const ALIAS_LENGTH: usize = 6;

/// The bitcoin base-58 alphabet, which aliases are drawn from.
pub const ALIAS_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Identifier<'a> {
    /// A short registry key.
    Alias(&'a str),
    /// Anything else; handed to the gateway as-is.
    ContentPointer(&'a str),
}

/// Classifies `identifier`. Pure, no I/O.
pub fn classify(identifier: &str) -> Identifier<'_> {
    if is_alias(identifier) {
        Identifier::Alias(identifier)
    } else {
        Identifier::ContentPointer(identifier)
    }
}

/// Whether `candidate` has the form of an alias: exactly [`ALIAS_LENGTH`] characters that decode
/// as base-58.
pub fn is_alias(candidate: &str) -> bool {
    candidate.len() == ALIAS_LENGTH && bs58::decode(candidate).into_vec().is_ok()
}
