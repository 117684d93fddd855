//! External collaborators of the bridge core.
//!
//! Key custody, chain access and consent UI are black boxes to the engine;
//! the hosting wallet supplies them through these traits when constructing a
//! [`WalletContext`].

use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use omni_core::{
    account::{Account, Address},
    bytes::HexBytes,
    context::DappRequestContext,
    state::NetworkInfo,
    transaction::{
        AccountSignature, OnChainTransaction, PendingTransaction, SigningMessageRequest,
        SubmitTransactionRequest, UserTransactionRequest,
    },
};
use std::sync::Arc;

/// The action a consent decision is requested for
#[derive(Debug)]
pub enum WalletAction<'a> {
    /// Expose accounts to the dapp
    Connect,
    /// Sign an arbitrary message
    SignMessage(&'a str),
    /// Sign a transaction request
    SignTransaction(&'a SigningMessageRequest),
    /// Fund an address from the faucet
    Faucet { address: &'a str, amount: u64 },
}

/// Key custody boundary: derives signing messages and produces signatures.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Derives the canonical encoded signing message for a request.
    ///
    /// This is the integrity anchor of raw signing: the engine never signs a
    /// message it did not re-derive from the claimed request.
    fn signing_message(&self, request: &SigningMessageRequest) -> Result<HexBytes>;

    /// Signs an arbitrary message on behalf of the account
    async fn sign_message(&self, account: &Account, data: &str) -> Result<String>;

    /// Signs an encoded signing message on behalf of the account
    async fn sign_signing_message(
        &self,
        account: &Account,
        message: &HexBytes,
    ) -> Result<AccountSignature>;

    /// Signs the message for each co-signing address the wallet manages,
    /// for a multi-agent transaction
    async fn sign_secondary(
        &self,
        addresses: &[Address],
        message: &HexBytes,
    ) -> Result<Vec<AccountSignature>> {
        let _ = message;
        Err(BridgeError::Signer(format!(
            "no key material for secondary signers {addresses:?}"
        )))
    }
}

/// Chain access boundary: submission, confirmation and simulation.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Next sequence number of the account on chain
    async fn sequence_number(&self, address: &str) -> Result<u64>;

    /// Submits a signed transaction, returning the pending acknowledgment
    async fn submit(&self, tx: &SubmitTransactionRequest) -> Result<PendingTransaction>;

    /// Waits until the submitted transaction reaches finality
    async fn wait_for_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> Result<OnChainTransaction>;

    /// Computes the effects of the request without submitting anything
    async fn simulate(&self, request: &UserTransactionRequest) -> Result<Vec<OnChainTransaction>>;

    /// Asks the faucet to fund the address; returns submitted tx hashes
    async fn request_faucet(&self, address: &str, amount: u64) -> Result<Vec<String>>;
}

/// Consent UI boundary.
#[async_trait]
pub trait ConsentHandler: Send + Sync {
    /// Asks the user to approve the action; rejections surface as
    /// [`BridgeError::UserRejected`]
    async fn review(&self, ctx: &DappRequestContext, action: WalletAction<'_>) -> Result<()>;

    /// Presents a failure in the wallet's own UI instead of the dapp,
    /// used when a call set `showErrorsInWallet`
    fn report_error(&self, ctx: &DappRequestContext, error: &BridgeError);
}

/// Everything the hosting wallet contributes to a bridge instance
#[derive(Clone)]
pub struct WalletContext {
    pub signer: Arc<dyn TransactionSigner>,
    pub chain: Arc<dyn ChainClient>,
    pub consent: Arc<dyn ConsentHandler>,
    /// Accounts the wallet will expose when the dapp connects
    pub accounts: Vec<Account>,
    /// Network the wallet currently targets
    pub network: NetworkInfo,
    /// Whether the wallet starts unlocked
    pub unlocked: bool,
}
