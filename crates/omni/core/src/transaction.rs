//! Transaction artifacts and per-method parameter types.
//!
//! The artifact chain is ordered: a [`SigningMessageRequest`] is signed into
//! a [`SubmitTransactionRequest`], submission yields a
//! [`PendingTransaction`], and the confirmation wait yields an
//! [`OnChainTransaction`]. Each stage's output is the next stage's input.

use crate::{
    account::Address,
    bytes::HexBytes,
};
use serde::{Deserialize, Serialize};

/// The unsigned payload of a transaction.
///
/// Chain specific encoding is out of scope for the bridge; the payload is an
/// opaque JSON document handed through to the wallet's signing logic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionPayload(pub serde_json::Value);

/// A fully formed transaction request ready to be encoded for signing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserTransactionRequest {
    pub sender: Address,
    pub sequence_number: u64,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub payload: TransactionPayload,
}

/// The request from which a signing message is derived, optionally naming
/// secondary signers for a multi-agent transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningMessageRequest {
    #[serde(flatten)]
    pub request: UserTransactionRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_signers: Option<Vec<Address>>,
}

/// Signature material for a single-signer account
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSignature {
    pub public_key: String,
    pub signature: HexBytes,
}

/// Secondary signer material attached to a multi-agent transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiAgentSignature {
    pub secondary_signer_addresses: Vec<Address>,
    pub secondary_signers: Vec<AccountSignature>,
}

/// The signature attached to a [`SubmitTransactionRequest`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionSignature {
    Ed25519Signature(AccountSignature),
    MultiAgentSignature {
        sender: AccountSignature,
        secondary_signer_addresses: Vec<Address>,
        secondary_signers: Vec<AccountSignature>,
    },
}

/// A signed transaction ready for submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTransactionRequest {
    #[serde(flatten)]
    pub request: UserTransactionRequest,
    pub signature: TransactionSignature,
}

/// Acknowledgment of a submitted but not yet confirmed transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
    #[serde(flatten)]
    pub request: UserTransactionRequest,
}

/// A transaction that reached the chain
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainTransaction {
    pub hash: String,
    pub version: u64,
    pub success: bool,
    pub vm_status: String,
    pub gas_used: u64,
}

/// Additional options when sending a transaction. Per-call modifiers, never
/// persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TXSendOptions {
    /// If true, the call returns as soon as the transaction is submitted
    /// instead of waiting for confirmation.
    ///
    /// Defaults to false.
    #[serde(default)]
    pub skip_confirmation: bool,
    /// If true, transaction errors are presented in the wallet rather than
    /// being propagated to the dapp.
    ///
    /// Defaults to false.
    #[serde(default)]
    pub show_errors_in_wallet: bool,
}

/// Overrides a dapp may supply when building a transaction request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransactionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_gas_amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_unit_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_timestamp_secs: Option<u64>,
    /// Additional signers for a multi-agent transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_signers: Option<Vec<Address>>,
}

/// Parameters for `omni_signMessage`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageParams {
    pub data: String,
}

/// Result of `omni_signMessage`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignMessageResult {
    pub signature: String,
}

/// Parameters for `omni_requestFaucet`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFaucetParams {
    pub address: Address,
    pub amount: u64,
}

/// Result of `omni_requestFaucet`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFaucetResult {
    /// Identifiers of the transactions the faucet submitted
    pub txs: Vec<String>,
}

/// Parameters for `omni_signAndSendTransaction`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAndSendTransactionParams {
    pub payload: TransactionPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<TransactionOptions>,
    #[serde(flatten)]
    pub send_options: TXSendOptions,
}

/// Parameters for `omni_signAndSendRawTransaction`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAndSendRawTransactionParams {
    /// The request being signed
    pub request: SigningMessageRequest,
    /// The encoded signing message of the given request.
    ///
    /// Validated byte-for-byte against the message re-derived from
    /// `request` before anything is signed.
    pub message: HexBytes,
    /// Additional signers for a multi-agent signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_agent_signature: Option<MultiAgentSignature>,
    #[serde(flatten)]
    pub send_options: TXSendOptions,
}

/// Result of both transaction sending methods
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignAndSendTransactionResult {
    #[serde(rename = "signedTX")]
    pub signed_tx: SubmitTransactionRequest,
    pub result: PendingTransaction,
    /// Present exactly when the call waited for confirmation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<OnChainTransaction>,
}

/// Parameters for `omni_simulateTransaction`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateTransactionParams {
    /// The request being simulated
    pub request: UserTransactionRequest,
}

/// Result of `omni_simulateTransaction`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateTransactionResult {
    /// The transactions that would result from the simulation
    pub txs: Vec<OnChainTransaction>,
}
