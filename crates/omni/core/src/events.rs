//! The closed event vocabulary of the bridge

use crate::{account::Account, state::{NetworkInfo, ProviderState}};
use serde::{Deserialize, Serialize};

/// A state transition broadcast from the wallet to the dapp.
///
/// Delivered as the params of an `omni_event` notification, decoupled from
/// whatever request caused the transition. There is no replay: a subscriber
/// attached after an event fired never sees it, `omni_getProviderState`
/// exists for exactly that reason.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OmniEvent {
    /// The wallet connected to the dapp; carries the resulting state
    Connect(ProviderState),
    /// The wallet disconnected from the dapp
    Disconnect,
    /// The set of exposed accounts changed while connected
    AccountsChanged(Vec<Account>),
    /// The selected network changed while connected
    NetworkChanged(NetworkInfo),
    /// The wallet locked or unlocked
    UnlockStateChanged(bool),
}

impl OmniEvent {
    /// The wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            OmniEvent::Connect(_) => "connect",
            OmniEvent::Disconnect => "disconnect",
            OmniEvent::AccountsChanged(_) => "accountsChanged",
            OmniEvent::NetworkChanged(_) => "networkChanged",
            OmniEvent::UnlockStateChanged(_) => "unlockStateChanged",
        }
    }
}
