//! Aggregated error type for the bridge engine

use omni_rpc::{error::RpcError, response::ResponseResult};
use serde::Serialize;
use tracing::error;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors produced while executing a bridge request.
///
/// The variants map onto the wire-level taxonomy a dapp needs: consent
/// errors ("ask the user again"), validation errors ("retry won't help"),
/// and failures from the wallet's collaborators.
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("Provider is not connected to the dapp")]
    NotConnected,
    #[error("User rejected the request: {0}")]
    UserRejected(String),
    #[error("Signing message does not match the supplied request")]
    SigningMessageMismatch,
    #[error("Signer error: {0}")]
    Signer(String),
    #[error("Chain client error: {0}")]
    Chain(String),
    /// The real failure was presented in the wallet because the call asked
    /// for `showErrorsInWallet`; the dapp only learns that the transaction
    /// failed.
    #[error("Transaction failed")]
    AbsorbedFailure,
    #[error("Rpc error {0:?}")]
    RpcError(RpcError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RpcError> for BridgeError {
    fn from(err: RpcError) -> Self {
        BridgeError::RpcError(err)
    }
}

/// Helper trait to convert a call result into an [`ResponseResult`]
pub(crate) trait ToRpcResponseResult {
    fn to_rpc_result(self) -> ResponseResult;
}

/// Converts a serializable value into a [`ResponseResult`]
pub fn to_rpc_result<T: Serialize>(val: T) -> ResponseResult {
    match serde_json::to_value(val) {
        Ok(success) => ResponseResult::Success(success),
        Err(err) => {
            error!(target: "rpc", "failed to serialize rpc response: {err:?}");
            ResponseResult::error(RpcError::internal_error())
        }
    }
}

impl<T: Serialize> ToRpcResponseResult for Result<T> {
    fn to_rpc_result(self) -> ResponseResult {
        match self {
            Ok(val) => to_rpc_result(val),
            Err(err) => match err {
                BridgeError::NotConnected => RpcError::disconnected(),
                BridgeError::UserRejected(msg) => RpcError::user_rejected(msg),
                BridgeError::SigningMessageMismatch => {
                    RpcError::validation_error("signing message does not match request")
                }
                BridgeError::Signer(msg) => RpcError::transaction_rejected(msg),
                BridgeError::Chain(msg) => RpcError::transaction_rejected(msg),
                BridgeError::AbsorbedFailure => {
                    RpcError::transaction_rejected("transaction failed")
                }
                BridgeError::RpcError(err) => err,
                BridgeError::Internal(msg) => RpcError::internal_error_with(msg),
            }
            .into(),
        }
    }
}
