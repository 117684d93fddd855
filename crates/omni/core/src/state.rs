//! Provider state snapshot

use crate::account::{Account, Protocol};
use serde::{Deserialize, Serialize};

/// The network the wallet currently exposes to the dapp
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub chain_id: String,
    pub protocol: Protocol,
}

/// State of the provider as observed by the dapp.
///
/// `omni_getProviderState` returns `null` instead of a snapshot while the
/// wallet is not connected; when connected the snapshot carries full
/// [`Account`] objects, not bare addresses. This is the resolved contract,
/// earlier revisions of the protocol were ambiguous on both points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderState {
    /// The account currently selected in the wallet, `None` when the wallet
    /// exposes no accounts
    pub current_account: Option<Account>,
    /// All accounts the wallet exposes to this dapp
    pub accounts: Option<Vec<Account>>,
    pub selected_network: Option<NetworkInfo>,
    pub is_connected: bool,
    pub is_unlocked: bool,
}

impl ProviderState {
    /// Whether the snapshot satisfies the state machine's invariant:
    /// `current_account` is present iff connected with at least one exposed
    /// account, and is then a member of `accounts`.
    pub fn is_consistent(&self) -> bool {
        match &self.current_account {
            None => {
                !self.is_connected
                    || self.accounts.as_ref().map(Vec::is_empty).unwrap_or(true)
            }
            Some(current) => {
                self.is_connected
                    && self
                        .accounts
                        .as_ref()
                        .map(|accounts| accounts.contains(current))
                        .unwrap_or(false)
            }
        }
    }
}
