//! The in-page provider object: the typed API a dapp programs against.
//!
//! [`OmniProvider`] wraps the correlating [`RpcClient`] with one typed
//! method per RPC method and keeps a read-only mirror of the session state,
//! fed purely by the wallet's event notifications. The mirror answers
//! synchronous questions (`connected()`, `public_account()`) without a round
//! trip; `omni_getProviderState` remains the authoritative answer.

use crate::{
    pubsub::{EventListeners, EventStream},
    transport::{BridgeConn, RpcClient, TransportError},
};
use omni_core::{
    account::Account,
    context::SiteMetadata,
    events::OmniEvent,
    request::OmniRequest,
    state::{NetworkInfo, ProviderState},
    transaction::{
        RequestFaucetParams, RequestFaucetResult, SignAndSendRawTransactionParams,
        SignAndSendTransactionParams, SignAndSendTransactionResult, SignMessageParams,
        SignMessageResult, SimulateTransactionParams, SimulateTransactionResult,
        UserTransactionRequest,
    },
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

#[derive(Debug, Default)]
struct MirrorInner {
    connected: bool,
    current_account: Option<Account>,
    accounts: Vec<Account>,
    network: Option<NetworkInfo>,
    unlocked: bool,
}

/// Page-side replica of the session state, updated only from wallet events
#[derive(Debug, Default)]
pub(crate) struct SessionMirror {
    inner: RwLock<MirrorInner>,
}

impl SessionMirror {
    pub(crate) fn connected(&self) -> bool {
        self.inner.read().connected
    }

    fn current_account(&self) -> Option<Account> {
        self.inner.read().current_account.clone()
    }

    fn network(&self) -> Option<NetworkInfo> {
        self.inner.read().network.clone()
    }

    fn unlocked(&self) -> bool {
        self.inner.read().unlocked
    }

    pub(crate) fn apply(&self, event: &OmniEvent) {
        let mut inner = self.inner.write();
        match event {
            OmniEvent::Connect(state) => {
                inner.connected = true;
                inner.current_account = state.current_account.clone();
                inner.accounts = state.accounts.clone().unwrap_or_default();
                inner.network = state.selected_network.clone();
                inner.unlocked = state.is_unlocked;
            }
            OmniEvent::Disconnect => {
                inner.connected = false;
                inner.current_account = None;
                inner.accounts.clear();
                inner.network = None;
            }
            OmniEvent::AccountsChanged(accounts) => {
                // the selected account survives the change if it is still a
                // member, otherwise the first account takes over
                let current = inner.current_account.take();
                inner.current_account = current
                    .filter(|account| accounts.contains(account))
                    .or_else(|| accounts.first().cloned());
                inner.accounts = accounts.clone();
            }
            OmniEvent::NetworkChanged(network) => inner.network = Some(network.clone()),
            OmniEvent::UnlockStateChanged(unlocked) => inner.unlocked = *unlocked,
        }
    }
}

/// The dapp-facing endpoint of the bridge
pub struct OmniProvider {
    client: RpcClient,
    listeners: EventListeners,
    mirror: Arc<SessionMirror>,
    connecting: AtomicBool,
}

impl OmniProvider {
    /// Wraps the page endpoint of a bridge connection
    pub fn new(conn: BridgeConn, request_timeout: Option<Duration>) -> Self {
        let listeners = EventListeners::new();
        let mirror = Arc::new(SessionMirror::default());
        let client =
            RpcClient::new(conn, request_timeout, listeners.clone(), Arc::clone(&mirror));
        Self { client, listeners, mirror, connecting: AtomicBool::new(false) }
    }

    /// Resolves once the wallet has announced it is ready to serve
    pub async fn ready(&self) -> Result<(), TransportError> {
        self.client.ready().await
    }

    /// Subscribes to the typed event channel
    pub fn events(&self) -> EventStream {
        self.listeners.subscribe()
    }

    /// Mirrored connection flag
    pub fn connected(&self) -> bool {
        self.mirror.connected()
    }

    /// Whether a `connect()` call is currently outstanding
    pub fn connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    /// Mirrored selected account
    pub fn public_account(&self) -> Option<Account> {
        self.mirror.current_account()
    }

    /// Mirrored selected network
    pub fn network(&self) -> Option<NetworkInfo> {
        self.mirror.network()
    }

    /// Mirrored lock state
    pub fn unlocked(&self) -> bool {
        self.mirror.unlocked()
    }

    /// Calls `omni_getProviderState`; `None` while not connected
    pub async fn get_provider_state(&self) -> Result<Option<ProviderState>, TransportError> {
        self.call(OmniRequest::GetProviderState(())).await
    }

    /// Calls `omni_sendSiteMetadata`
    pub async fn send_site_metadata(&self, meta: SiteMetadata) -> Result<bool, TransportError> {
        self.call(OmniRequest::SendSiteMetadata(meta)).await
    }

    /// Calls `omni_connect`; `false` means the wallet had no accounts
    pub async fn connect(&self) -> Result<bool, TransportError> {
        self.connecting.store(true, Ordering::SeqCst);
        let result = self.call(OmniRequest::ConnectWallet(())).await;
        self.connecting.store(false, Ordering::SeqCst);
        result
    }

    /// Calls `omni_disconnect`
    pub async fn disconnect(&self) -> Result<bool, TransportError> {
        self.call(OmniRequest::DisconnectWallet(())).await
    }

    /// Calls `omni_signMessage`
    pub async fn sign_message(
        &self,
        data: impl Into<String>,
    ) -> Result<SignMessageResult, TransportError> {
        self.call(OmniRequest::SignMessage(SignMessageParams { data: data.into() })).await
    }

    /// Calls `omni_requestFaucet`
    pub async fn request_faucet(
        &self,
        address: impl Into<String>,
        amount: u64,
    ) -> Result<RequestFaucetResult, TransportError> {
        self.call(OmniRequest::RequestFaucet(RequestFaucetParams {
            address: address.into(),
            amount,
        }))
        .await
    }

    /// Calls `omni_signAndSendTransaction`
    pub async fn sign_and_send_transaction(
        &self,
        params: SignAndSendTransactionParams,
    ) -> Result<SignAndSendTransactionResult, TransportError> {
        self.call(OmniRequest::SignAndSendTransaction(params)).await
    }

    /// Calls `omni_signAndSendRawTransaction`
    pub async fn sign_and_send_raw_transaction(
        &self,
        params: SignAndSendRawTransactionParams,
    ) -> Result<SignAndSendTransactionResult, TransportError> {
        self.call(OmniRequest::SignAndSendRawTransaction(params)).await
    }

    /// Calls `omni_simulateTransaction`
    pub async fn simulate_transaction(
        &self,
        request: UserTransactionRequest,
    ) -> Result<SimulateTransactionResult, TransportError> {
        self.call(OmniRequest::SimulateTransaction(SimulateTransactionParams { request })).await
    }

    async fn call<T: DeserializeOwned>(&self, request: OmniRequest) -> Result<T, TransportError> {
        let value = self.client.request(&request).await?;
        Ok(serde_json::from_value(value)?)
    }
}
