//! Account identity types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hex encoded account address
pub type Address = String;

/// The chain family of a connected network. This determines the way
/// addresses are returned to the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Aptos,
    Sui,
    Solana,
    Near,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Protocol::Aptos => "aptos",
            Protocol::Sui => "sui",
            Protocol::Solana => "solana",
            Protocol::Near => "near",
        };
        f.write_str(s)
    }
}

/// The public identity of a keypair exposed to a dapp.
///
/// Immutable once issued for a connection session: when the wallet's active
/// account changes the provider replaces the whole value, it never mutates
/// individual fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub public_key: String,
    pub address: Address,
    pub auth_key: String,
    pub protocol: Protocol,
}

/// Information about an account managed by the wallet, as presented to a
/// dapp inside [`crate::context::DappRequestContext`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Name of the account
    pub name: String,
    /// Normalized address of the account
    pub address: Address,
    /// Protocol of the account
    pub protocol: Protocol,
}
