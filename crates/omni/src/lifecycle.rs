//! The transaction signing lifecycle: propose, optionally simulate, sign,
//! submit, optionally await confirmation.
//!
//! Stages are strictly sequential because each stage's output is the next
//! stage's input. Errors before signing abort with no partial effect; errors
//! after a successful submission still return the submission evidence to the
//! caller, only the confirmation is omitted.

use crate::{
    config::BridgeConfig,
    error::{BridgeError, Result},
    wallet::{WalletAction, WalletContext},
};
use omni_core::{
    account::{Account, Address},
    bytes::HexBytes,
    context::DappRequestContext,
    transaction::{
        AccountSignature, OnChainTransaction, PendingTransaction, SignAndSendRawTransactionParams,
        SignAndSendTransactionParams, SignAndSendTransactionResult, SigningMessageRequest,
        SimulateTransactionParams, SimulateTransactionResult, SubmitTransactionRequest,
        TXSendOptions, TransactionOptions, TransactionPayload, TransactionSignature,
        UserTransactionRequest,
    },
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{trace, warn};

/// Orchestrates the multi-step signing flows against the wallet's
/// collaborators
pub struct TransactionLifecycle {
    wallet: WalletContext,
    config: BridgeConfig,
}

impl TransactionLifecycle {
    pub fn new(wallet: WalletContext, config: BridgeConfig) -> Self {
        Self { wallet, config }
    }

    /// Full lifecycle: build a request from the payload and overrides, sign,
    /// submit, and await confirmation unless `skipConfirmation` is set
    pub async fn sign_and_send(
        &self,
        ctx: &DappRequestContext,
        account: &Account,
        params: SignAndSendTransactionParams,
    ) -> Result<SignAndSendTransactionResult> {
        let send_options = params.send_options;
        let flow = async {
            let options = params.options.unwrap_or_default();
            let request = self.build_request(account, params.payload, &options).await?;
            let signing_request = SigningMessageRequest {
                request,
                secondary_signers: options.secondary_signers,
            };
            self.wallet
                .consent
                .review(ctx, WalletAction::SignTransaction(&signing_request))
                .await?;

            let message = self.wallet.signer.signing_message(&signing_request)?;
            self.sign_submit_confirm(account, signing_request, &message, None, send_options)
                .await
        };
        self.guard_errors(ctx, send_options, flow).await
    }

    /// Raw lifecycle: the caller supplies a pre-built signing request and its
    /// encoded message. The message is re-derived from the request and
    /// compared byte-for-byte before anything is signed; this is the
    /// integrity boundary against a compromised or buggy caller.
    pub async fn sign_and_send_raw(
        &self,
        ctx: &DappRequestContext,
        account: &Account,
        params: SignAndSendRawTransactionParams,
    ) -> Result<SignAndSendTransactionResult> {
        let expected = self.wallet.signer.signing_message(&params.request)?;
        if expected != params.message {
            warn!(target: "bridge", "raw signing message does not match its request");
            return Err(BridgeError::SigningMessageMismatch);
        }

        let send_options = params.send_options;
        let flow = async {
            self.wallet
                .consent
                .review(ctx, WalletAction::SignTransaction(&params.request))
                .await?;
            self.sign_submit_confirm(
                account,
                params.request,
                &params.message,
                params.multi_agent_signature.map(|ma| {
                    (ma.secondary_signer_addresses, ma.secondary_signers)
                }),
                send_options,
            )
            .await
        };
        self.guard_errors(ctx, send_options, flow).await
    }

    /// Dry run. Touches neither the connection state nor the event channel.
    pub async fn simulate(
        &self,
        params: SimulateTransactionParams,
    ) -> Result<SimulateTransactionResult> {
        let txs = self.wallet.chain.simulate(&params.request).await?;
        Ok(SimulateTransactionResult { txs })
    }

    /// Shared downstream stages of both entry points
    async fn sign_submit_confirm(
        &self,
        account: &Account,
        signing_request: SigningMessageRequest,
        message: &HexBytes,
        supplied_secondary: Option<(Vec<Address>, Vec<AccountSignature>)>,
        send_options: TXSendOptions,
    ) -> Result<SignAndSendTransactionResult> {
        let sender_signature =
            self.wallet.signer.sign_signing_message(account, message).await?;

        let signature = match (supplied_secondary, signing_request.secondary_signers.clone()) {
            // multi-agent material supplied by the caller, attached without
            // re-deriving the primary signer's message
            (Some((addresses, signers)), _) => TransactionSignature::MultiAgentSignature {
                sender: sender_signature,
                secondary_signer_addresses: addresses,
                secondary_signers: signers,
            },
            (None, Some(addresses)) if !addresses.is_empty() => {
                let signers = self.wallet.signer.sign_secondary(&addresses, message).await?;
                TransactionSignature::MultiAgentSignature {
                    sender: sender_signature,
                    secondary_signer_addresses: addresses,
                    secondary_signers: signers,
                }
            }
            _ => TransactionSignature::Ed25519Signature(sender_signature),
        };

        let signed_tx = SubmitTransactionRequest { request: signing_request.request, signature };
        let pending = self.wallet.chain.submit(&signed_tx).await?;
        trace!(target: "bridge", hash = %pending.hash, "transaction submitted");

        let confirmed = if send_options.skip_confirmation {
            None
        } else {
            self.await_confirmation(&pending).await
        };

        Ok(SignAndSendTransactionResult { signed_tx, result: pending, confirmed })
    }

    /// A failed confirmation wait must not discard real submission evidence,
    /// so it degrades to an absent `confirmed` instead of an error
    async fn await_confirmation(&self, pending: &PendingTransaction) -> Option<OnChainTransaction> {
        match self.wallet.chain.wait_for_confirmation(pending).await {
            Ok(confirmed) => Some(confirmed),
            Err(err) => {
                warn!(target: "bridge", hash = %pending.hash, %err, "confirmation wait failed");
                None
            }
        }
    }

    /// Applies the `showErrorsInWallet` policy: the wallet presents the real
    /// failure and the dapp receives a generic one
    async fn guard_errors<T>(
        &self,
        ctx: &DappRequestContext,
        send_options: TXSendOptions,
        flow: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        match flow.await {
            Ok(value) => Ok(value),
            Err(err) if send_options.show_errors_in_wallet => {
                self.wallet.consent.report_error(ctx, &err);
                Err(BridgeError::AbsorbedFailure)
            }
            Err(err) => Err(err),
        }
    }

    async fn build_request(
        &self,
        account: &Account,
        payload: TransactionPayload,
        options: &TransactionOptions,
    ) -> Result<UserTransactionRequest> {
        let sequence_number = match options.sequence_number {
            Some(sequence_number) => sequence_number,
            None => self.wallet.chain.sequence_number(&account.address).await?,
        };
        Ok(UserTransactionRequest {
            sender: account.address.clone(),
            sequence_number,
            max_gas_amount: options.max_gas_amount.unwrap_or(self.config.max_gas_amount),
            gas_unit_price: options.gas_unit_price.unwrap_or(self.config.gas_unit_price),
            expiration_timestamp_secs: options
                .expiration_timestamp_secs
                .unwrap_or_else(|| unix_now() + self.config.transaction_expiry_secs),
            payload,
        })
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}
