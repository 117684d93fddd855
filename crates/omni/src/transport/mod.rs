//! The duplex message channel between the in-page provider and the wallet,
//! and the wallet-side serving loop.
//!
//! Frames are newline-less strings carrying one JSON document each. The
//! wallet announces readiness with an `omni_ready` notification before
//! serving anything, pushes `omni_event` notifications for state changes,
//! and answers method calls in completion order, which may differ from
//! arrival order.

use crate::api::OmniApi;
use omni_core::{request::OmniRequest, EVENT_NOTIFICATION, OMNI_READY_EVENT};
use omni_rpc::{
    error::RpcError,
    request::{RequestParams, RpcCall, RpcMethodCall, RpcNotification},
    response::RpcResponse,
};
use serde::Serialize;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{error, trace, warn};

pub mod client;

pub use client::{RpcClient, TransportError};

/// One endpoint of the page/wallet message channel
pub struct BridgeConn {
    tx: UnboundedSender<String>,
    rx: UnboundedReceiver<String>,
}

impl BridgeConn {
    /// Sends a frame to the peer; fails when the peer endpoint is gone
    pub fn send(&self, frame: String) -> Result<(), mpsc::error::SendError<String>> {
        self.tx.send(frame)
    }

    /// Receives the next frame, `None` once the peer endpoint is gone
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub(crate) fn split(self) -> (UnboundedSender<String>, UnboundedReceiver<String>) {
        (self.tx, self.rx)
    }
}

/// Creates a connected pair of endpoints, page side first
pub fn channel() -> (BridgeConn, BridgeConn) {
    let (page_tx, wallet_rx) = mpsc::unbounded_channel();
    let (wallet_tx, page_rx) = mpsc::unbounded_channel();
    (BridgeConn { tx: page_tx, rx: page_rx }, BridgeConn { tx: wallet_tx, rx: wallet_rx })
}

/// Serves bridge requests arriving on the connection until the page side
/// hangs up
pub fn serve(api: OmniApi, conn: BridgeConn) -> JoinHandle<()> {
    use futures::StreamExt;
    tokio::spawn(async move {
        let (tx, mut rx) = conn.split();
        let mut events = api.subscribe_events();

        // the provider buffers calls until it sees this
        write_json(&tx, &RpcNotification::new(OMNI_READY_EVENT, RequestParams::None));

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    let Some(frame) = frame else {
                        trace!(target: "rpc", "connection closed by peer");
                        break
                    };
                    handle_frame(&api, &tx, frame);
                }
                event = events.next() => {
                    let Some(event) = event else { break };
                    trace!(target: "rpc", event = event.name(), "pushing event");
                    match serde_json::to_value(&event) {
                        Ok(value) => write_json(
                            &tx,
                            &RpcNotification::new(EVENT_NOTIFICATION, value.into()),
                        ),
                        Err(err) => {
                            error!(target: "rpc", %err, "failed to serialize event")
                        }
                    }
                }
            }
        }

        // a session must not outlive its channel: nothing can be consented
        // to or revoked over a dead connection
        api.revoke_connection();
    })
}

fn handle_frame(api: &OmniApi, tx: &UnboundedSender<String>, frame: String) {
    match serde_json::from_str::<RpcCall>(&frame) {
        Ok(RpcCall::MethodCall(call)) => {
            trace!(target: "rpc", method = %call.method, id = %call.id, "received method call");
            let api = api.clone();
            let tx = tx.clone();
            // responses are written as calls complete, not in arrival order
            tokio::spawn(async move {
                let response = execute_call(api, call).await;
                write_json(&tx, &response);
            });
        }
        Ok(RpcCall::Notification(notification)) => {
            trace!(target: "rpc", method = %notification.method, "ignoring notification");
        }
        Ok(RpcCall::Invalid { id }) => {
            warn!(target: "rpc", %id, "invalid request");
            write_json(tx, &RpcResponse::invalid_request(id));
        }
        Err(err) => {
            warn!(target: "rpc", %err, "request is not parsable json");
            write_json(tx, &RpcResponse::from(RpcError::parse_error()));
        }
    }
}

/// Validates the call against the method registry and executes it.
///
/// An unknown method surfaces as serde's "unknown variant" failure, which is
/// the wire-level `MethodNotFound`; any other shape failure is
/// `InvalidParams`.
async fn execute_call(api: OmniApi, call: RpcMethodCall) -> RpcResponse {
    let RpcMethodCall { method, params, id, .. } = call;
    let params = serde_json::Value::from(params);
    let call = serde_json::json!({ "method": method, "params": params });
    match serde_json::from_value::<OmniRequest>(call) {
        Ok(request) => RpcResponse::new(id, api.execute(request).await),
        Err(err) => {
            let err = err.to_string();
            let error = if err.contains("unknown variant") {
                warn!(target: "rpc", %method, "method not found");
                RpcError::method_not_found()
            } else {
                warn!(target: "rpc", %method, %err, "failed to deserialize params");
                RpcError::invalid_params(err)
            };
            RpcResponse::new(id, error)
        }
    }
}

fn write_json<T: Serialize>(tx: &UnboundedSender<String>, value: &T) {
    match serde_json::to_string(value) {
        Ok(frame) => {
            // send only fails once the peer is gone; the loop notices that
            // through its own receiver
            let _ = tx.send(frame);
        }
        Err(err) => error!(target: "rpc", %err, "failed to serialize outgoing message"),
    }
}
