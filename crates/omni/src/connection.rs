//! The connection/account/lock state machine.
//!
//! [`ConnectionManager`] is the single writer of the provider state: every
//! other component reads a snapshot or receives diffs through the event
//! channel. Events are emitted while the write lock is held, so no reader
//! ever observes a state between two related changes.

use crate::pubsub::EventListeners;
use omni_core::{
    account::Account,
    events::OmniEvent,
    state::{NetworkInfo, ProviderState},
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::trace;

/// Connection status towards the dapp
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Quiescent initial state
    Disconnected,
    /// A connect flow is outstanding
    Connecting,
    Connected,
}

/// Outcome of a connect flow, shared between the leading call and any calls
/// coalesced onto it
#[derive(Clone, Debug)]
pub(crate) enum ConnectOutcome {
    /// The flow finished; `false` means the wallet had no accounts to expose
    Done(bool),
    /// The user declined
    Rejected(String),
    /// The flow failed for another reason
    Failed(String),
}

pub(crate) enum ConnectFlow {
    AlreadyConnected,
    /// This call runs the consent flow and publishes the outcome
    Lead(watch::Sender<Option<ConnectOutcome>>),
    /// Another call is already connecting; await its outcome
    Follow(watch::Receiver<Option<ConnectOutcome>>),
}

#[derive(Debug)]
struct Inner {
    status: ConnectionState,
    accounts: Option<Vec<Account>>,
    current_account: Option<Account>,
    network: Option<NetworkInfo>,
    unlocked: bool,
}

/// Owner of the provider state
pub struct ConnectionManager {
    inner: RwLock<Inner>,
    listeners: EventListeners,
    pending_connect: Mutex<Option<watch::Receiver<Option<ConnectOutcome>>>>,
}

impl ConnectionManager {
    pub fn new(listeners: EventListeners, unlocked: bool) -> Self {
        Self {
            inner: RwLock::new(Inner {
                status: ConnectionState::Disconnected,
                accounts: None,
                current_account: None,
                network: None,
                unlocked,
            }),
            listeners,
            pending_connect: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.read().status
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn is_unlocked(&self) -> bool {
        self.inner.read().unlocked
    }

    pub fn current_account(&self) -> Option<Account> {
        self.inner.read().current_account.clone()
    }

    /// A consistent snapshot of the provider state, `None` while not
    /// connected (the resolved `omni_getProviderState` contract)
    pub fn snapshot(&self) -> Option<ProviderState> {
        let inner = self.inner.read();
        if inner.status != ConnectionState::Connected {
            return None;
        }
        Some(Self::provider_state(&inner))
    }

    fn provider_state(inner: &Inner) -> ProviderState {
        ProviderState {
            current_account: inner.current_account.clone(),
            accounts: inner.accounts.clone(),
            selected_network: inner.network.clone(),
            is_connected: inner.status == ConnectionState::Connected,
            is_unlocked: inner.unlocked,
        }
    }

    /// Starts or joins a connect flow.
    ///
    /// A second `omni_connect` arriving while one is outstanding never
    /// starts a second consent flow; it observes the same outcome.
    pub(crate) fn begin_connect(&self) -> ConnectFlow {
        let mut pending = self.pending_connect.lock();
        let mut inner = self.inner.write();
        match inner.status {
            ConnectionState::Connected => ConnectFlow::AlreadyConnected,
            ConnectionState::Connecting => match pending.as_ref() {
                Some(rx) => ConnectFlow::Follow(rx.clone()),
                // the previous leader died before publishing; take over
                None => {
                    let (tx, rx) = watch::channel(None);
                    *pending = Some(rx);
                    ConnectFlow::Lead(tx)
                }
            },
            ConnectionState::Disconnected => {
                let (tx, rx) = watch::channel(None);
                *pending = Some(rx);
                inner.status = ConnectionState::Connecting;
                trace!(target: "bridge", "connect flow started");
                ConnectFlow::Lead(tx)
            }
        }
    }

    /// Publishes the connect outcome to coalesced callers and clears the
    /// pending flow
    pub(crate) fn finish_connect(
        &self,
        tx: watch::Sender<Option<ConnectOutcome>>,
        outcome: ConnectOutcome,
    ) {
        *self.pending_connect.lock() = None;
        let _ = tx.send(Some(outcome));
    }

    /// Transitions to `Connected` and emits exactly one `connect` event
    pub(crate) fn establish(&self, accounts: Vec<Account>, network: NetworkInfo) -> ProviderState {
        let mut inner = self.inner.write();
        inner.status = ConnectionState::Connected;
        inner.current_account = accounts.first().cloned();
        inner.accounts = Some(accounts);
        inner.network = Some(network);
        let state = Self::provider_state(&inner);
        debug_assert!(state.is_consistent());
        trace!(target: "bridge", "connected");
        self.listeners.notify(OmniEvent::Connect(state.clone()));
        state
    }

    /// Rolls a failed connect flow back to `Disconnected` without emitting
    pub(crate) fn abort_connect(&self) {
        let mut inner = self.inner.write();
        if inner.status == ConnectionState::Connecting {
            inner.status = ConnectionState::Disconnected;
        }
    }

    /// Transitions to `Disconnected`; idempotent. Also the path taken for
    /// external revocation.
    pub fn disconnect(&self) {
        let mut inner = self.inner.write();
        if inner.status != ConnectionState::Connected {
            return;
        }
        inner.status = ConnectionState::Disconnected;
        inner.accounts = None;
        inner.current_account = None;
        inner.network = None;
        trace!(target: "bridge", "disconnected");
        self.listeners.notify(OmniEvent::Disconnect);
    }

    /// Applies wallet-side account and/or network changes as one atomic
    /// update. Ignored while not connected.
    ///
    /// An empty account set is an implicit disconnect: a dapp that can no
    /// longer see a current account is not connected in any useful sense,
    /// so the state machine reflects that rather than reporting
    /// `isConnected` with a null account.
    pub fn update_session(&self, accounts: Option<Vec<Account>>, network: Option<NetworkInfo>) {
        let mut inner = self.inner.write();
        if inner.status != ConnectionState::Connected {
            return;
        }

        if let Some(accounts) = &accounts {
            if accounts.is_empty() {
                inner.status = ConnectionState::Disconnected;
                inner.accounts = None;
                inner.current_account = None;
                inner.network = None;
                trace!(target: "bridge", "all accounts revoked, disconnecting");
                self.listeners.notify(OmniEvent::Disconnect);
                return;
            }
        }

        if let Some(accounts) = accounts {
            let retained = inner
                .current_account
                .as_ref()
                .filter(|current| accounts.contains(current))
                .cloned();
            inner.current_account = retained.or_else(|| accounts.first().cloned());
            inner.accounts = Some(accounts.clone());
            debug_assert!(Self::provider_state(&inner).is_consistent());
            self.listeners.notify(OmniEvent::AccountsChanged(accounts));
        }
        if let Some(network) = network {
            inner.network = Some(network.clone());
            self.listeners.notify(OmniEvent::NetworkChanged(network));
        }
    }

    /// Toggles the lock state. Deliberately decoupled from the account set:
    /// locking does not revoke the connection unless the wallet also does so.
    pub fn set_unlocked(&self, unlocked: bool) {
        let mut inner = self.inner.write();
        if inner.unlocked == unlocked {
            return;
        }
        inner.unlocked = unlocked;
        self.listeners.notify(OmniEvent::UnlockStateChanged(unlocked));
    }
}
