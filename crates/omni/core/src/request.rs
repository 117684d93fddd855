//! The method registry: every RPC call the bridge supports.

use crate::{
    context::SiteMetadata,
    transaction::{
        RequestFaucetParams, SignAndSendRawTransactionParams, SignAndSendTransactionParams,
        SignMessageParams, SimulateTransactionParams,
    },
};
use serde::{Deserialize, Serialize};

/// A validated RPC call addressed to the wallet.
///
/// The enum is the closed catalog of the protocol surface: each variant pins
/// a wire method name to its exact parameter shape, so dispatch stays
/// exhaustive and an unknown method is a deserialization failure rather than
/// an extensible case. The wallet-side handler maps serde's "unknown
/// variant" failure to a `MethodNotFound` error, which is the runtime
/// defensive check for the trust boundary between page and extension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum OmniRequest {
    /// Returns the provider state, `null` while not connected. Never fails
    /// for that reason alone.
    #[serde(rename = "omni_getProviderState")]
    GetProviderState(#[serde(with = "crate::serde_helpers::empty_params")] ()),

    /// Announces the calling site's name and icon. Informational only.
    #[serde(rename = "omni_sendSiteMetadata")]
    SendSiteMetadata(SiteMetadata),

    #[serde(rename = "omni_connect")]
    ConnectWallet(#[serde(with = "crate::serde_helpers::empty_params")] ()),

    /// Idempotent if already disconnected
    #[serde(rename = "omni_disconnect")]
    DisconnectWallet(#[serde(with = "crate::serde_helpers::empty_params")] ()),

    /// Pure signing, no chain interaction
    #[serde(rename = "omni_signMessage")]
    SignMessage(SignMessageParams),

    /// Delegates to an external faucet
    #[serde(rename = "omni_requestFaucet")]
    RequestFaucet(RequestFaucetParams),

    #[serde(rename = "omni_signAndSendTransaction")]
    SignAndSendTransaction(SignAndSendTransactionParams),

    #[serde(rename = "omni_signAndSendRawTransaction")]
    SignAndSendRawTransaction(SignAndSendRawTransactionParams),

    /// Dry run, no state change, no submission
    #[serde(rename = "omni_simulateTransaction")]
    SimulateTransaction(SimulateTransactionParams),
}

impl OmniRequest {
    /// The wire method name
    pub fn method_name(&self) -> &'static str {
        match self {
            OmniRequest::GetProviderState(_) => "omni_getProviderState",
            OmniRequest::SendSiteMetadata(_) => "omni_sendSiteMetadata",
            OmniRequest::ConnectWallet(_) => "omni_connect",
            OmniRequest::DisconnectWallet(_) => "omni_disconnect",
            OmniRequest::SignMessage(_) => "omni_signMessage",
            OmniRequest::RequestFaucet(_) => "omni_requestFaucet",
            OmniRequest::SignAndSendTransaction(_) => "omni_signAndSendTransaction",
            OmniRequest::SignAndSendRawTransaction(_) => "omni_signAndSendRawTransaction",
            OmniRequest::SimulateTransaction(_) => "omni_simulateTransaction",
        }
    }
}
