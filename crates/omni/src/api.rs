//! The wallet-side RPC endpoint.
//!
//! [`OmniApi`] owns the dispatch of validated [`OmniRequest`]s onto the
//! connection state machine and the transaction lifecycle. It is `Clone` and
//! cheap to share; the transport spawns one task per method call against the
//! same instance.

use crate::{
    connection::{ConnectFlow, ConnectOutcome, ConnectionManager},
    error::{BridgeError, Result, ToRpcResponseResult},
    lifecycle::TransactionLifecycle,
    pubsub::{EventListeners, EventStream},
    wallet::{WalletAction, WalletContext},
    BridgeConfig,
};
use omni_core::{
    account::Account,
    context::{DappRequestContext, SiteMetadata},
    request::OmniRequest,
    state::{NetworkInfo, ProviderState},
    transaction::{
        RequestFaucetParams, RequestFaucetResult, SignAndSendRawTransactionParams,
        SignAndSendTransactionParams, SignAndSendTransactionResult, SignMessageParams,
        SignMessageResult, SimulateTransactionParams, SimulateTransactionResult,
    },
};
use omni_rpc::response::ResponseResult;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

/// The entry point for executing bridge requests
#[derive(Clone)]
pub struct OmniApi {
    connection: Arc<ConnectionManager>,
    lifecycle: Arc<TransactionLifecycle>,
    wallet: WalletContext,
    /// Metadata of the calling site, updated by `omni_sendSiteMetadata`
    context: Arc<RwLock<DappRequestContext>>,
    listeners: EventListeners,
}

impl OmniApi {
    pub fn new(wallet: WalletContext, config: BridgeConfig) -> Self {
        let listeners = EventListeners::new();
        let connection =
            Arc::new(ConnectionManager::new(listeners.clone(), wallet.unlocked));
        let lifecycle = Arc::new(TransactionLifecycle::new(wallet.clone(), config.clone()));
        Self {
            connection,
            lifecycle,
            wallet,
            context: Arc::new(RwLock::new(DappRequestContext::unknown(config.origin))),
            listeners,
        }
    }

    /// Executes the request and returns the wire-level result
    pub async fn execute(&self, request: OmniRequest) -> ResponseResult {
        trace!(target: "rpc", method = request.method_name(), "executing request");
        match request {
            OmniRequest::GetProviderState(()) => self.get_provider_state().to_rpc_result(),
            OmniRequest::SendSiteMetadata(meta) => self.send_site_metadata(meta).to_rpc_result(),
            OmniRequest::ConnectWallet(()) => self.connect_wallet().await.to_rpc_result(),
            OmniRequest::DisconnectWallet(()) => self.disconnect_wallet().to_rpc_result(),
            OmniRequest::SignMessage(params) => self.sign_message(params).await.to_rpc_result(),
            OmniRequest::RequestFaucet(params) => {
                self.request_faucet(params).await.to_rpc_result()
            }
            OmniRequest::SignAndSendTransaction(params) => {
                self.sign_and_send_transaction(params).await.to_rpc_result()
            }
            OmniRequest::SignAndSendRawTransaction(params) => {
                self.sign_and_send_raw_transaction(params).await.to_rpc_result()
            }
            OmniRequest::SimulateTransaction(params) => {
                self.simulate_transaction(params).await.to_rpc_result()
            }
        }
    }

    /// Handler for `omni_getProviderState`
    pub fn get_provider_state(&self) -> Result<Option<ProviderState>> {
        Ok(self.connection.snapshot())
    }

    /// Handler for `omni_sendSiteMetadata`
    pub fn send_site_metadata(&self, meta: SiteMetadata) -> Result<bool> {
        trace!(target: "rpc", name = %meta.name, "received site metadata");
        let mut ctx = self.context.write();
        ctx.dapp_name = meta.name;
        ctx.icon = meta.icon;
        Ok(true)
    }

    /// Handler for `omni_connect`.
    ///
    /// Only one consent flow may be outstanding; a concurrent call joins the
    /// running flow and observes the same outcome. Returns `false` when
    /// consent was granted but the wallet had no accounts to expose.
    pub async fn connect_wallet(&self) -> Result<bool> {
        match self.connection.begin_connect() {
            ConnectFlow::AlreadyConnected => Ok(true),
            ConnectFlow::Follow(mut rx) => loop {
                let outcome = rx.borrow_and_update().clone();
                if let Some(outcome) = outcome {
                    return match outcome {
                        ConnectOutcome::Done(connected) => Ok(connected),
                        ConnectOutcome::Rejected(msg) => Err(BridgeError::UserRejected(msg)),
                        ConnectOutcome::Failed(msg) => Err(BridgeError::Internal(msg)),
                    };
                }
                if rx.changed().await.is_err() {
                    return Err(BridgeError::Internal("connect flow abandoned".to_string()));
                }
            },
            ConnectFlow::Lead(tx) => {
                let ctx = self.request_context();
                match self.wallet.consent.review(&ctx, WalletAction::Connect).await {
                    Ok(()) => {
                        if self.wallet.accounts.is_empty() {
                            self.connection.abort_connect();
                            self.connection.finish_connect(tx, ConnectOutcome::Done(false));
                            Ok(false)
                        } else {
                            self.connection.establish(
                                self.wallet.accounts.clone(),
                                self.wallet.network.clone(),
                            );
                            self.connection.finish_connect(tx, ConnectOutcome::Done(true));
                            Ok(true)
                        }
                    }
                    Err(err) => {
                        self.connection.abort_connect();
                        let outcome = match &err {
                            BridgeError::UserRejected(msg) => {
                                ConnectOutcome::Rejected(msg.clone())
                            }
                            other => ConnectOutcome::Failed(other.to_string()),
                        };
                        self.connection.finish_connect(tx, outcome);
                        Err(err)
                    }
                }
            }
        }
    }

    /// Handler for `omni_disconnect`, idempotent
    pub fn disconnect_wallet(&self) -> Result<bool> {
        self.connection.disconnect();
        Ok(true)
    }

    /// Handler for `omni_signMessage`
    pub async fn sign_message(&self, params: SignMessageParams) -> Result<SignMessageResult> {
        let account = self.require_account()?;
        let ctx = self.request_context();
        self.wallet.consent.review(&ctx, WalletAction::SignMessage(&params.data)).await?;
        let signature = self.wallet.signer.sign_message(&account, &params.data).await?;
        Ok(SignMessageResult { signature })
    }

    /// Handler for `omni_requestFaucet`
    pub async fn request_faucet(
        &self,
        params: RequestFaucetParams,
    ) -> Result<RequestFaucetResult> {
        self.require_account()?;
        let ctx = self.request_context();
        self.wallet
            .consent
            .review(
                &ctx,
                WalletAction::Faucet { address: &params.address, amount: params.amount },
            )
            .await?;
        let txs = self.wallet.chain.request_faucet(&params.address, params.amount).await?;
        Ok(RequestFaucetResult { txs })
    }

    /// Handler for `omni_signAndSendTransaction`
    pub async fn sign_and_send_transaction(
        &self,
        params: SignAndSendTransactionParams,
    ) -> Result<SignAndSendTransactionResult> {
        let account = self.require_account()?;
        let ctx = self.request_context();
        self.lifecycle.sign_and_send(&ctx, &account, params).await
    }

    /// Handler for `omni_signAndSendRawTransaction`
    pub async fn sign_and_send_raw_transaction(
        &self,
        params: SignAndSendRawTransactionParams,
    ) -> Result<SignAndSendTransactionResult> {
        let account = self.require_account()?;
        let ctx = self.request_context();
        self.lifecycle.sign_and_send_raw(&ctx, &account, params).await
    }

    /// Handler for `omni_simulateTransaction`. A dry run needs no consent
    /// and no connection.
    pub async fn simulate_transaction(
        &self,
        params: SimulateTransactionParams,
    ) -> Result<SimulateTransactionResult> {
        self.lifecycle.simulate(params).await
    }

    /// Subscribes to the typed event channel
    pub fn subscribe_events(&self) -> EventStream {
        self.listeners.subscribe()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    // Wallet-side hooks: the hosting extension calls these when its own
    // state changes, outside any dapp request.

    /// Replaces the exposed account set; an empty set disconnects
    pub fn set_accounts(&self, accounts: Vec<Account>) {
        self.connection.update_session(Some(accounts), None);
    }

    /// Switches the targeted network
    pub fn set_network(&self, network: NetworkInfo) {
        self.connection.update_session(None, Some(network));
    }

    /// Updates the wallet lock state
    pub fn set_unlocked(&self, unlocked: bool) {
        self.connection.set_unlocked(unlocked);
    }

    /// Revokes the dapp's session from the wallet side
    pub fn revoke_connection(&self) {
        self.connection.disconnect();
    }

    fn require_account(&self) -> Result<Account> {
        self.connection.current_account().ok_or(BridgeError::NotConnected)
    }

    fn request_context(&self) -> DappRequestContext {
        self.context.read().clone()
    }
}
