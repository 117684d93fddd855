//! Page-side RPC client: correlates method calls with their responses over
//! the message channel.
//!
//! Every outgoing call gets a fresh numeric id and a parked oneshot; the
//! reader task routes each incoming response to its oneshot by id. Responses
//! whose id is unknown, including late arrivals after a timeout already
//! rejected the call, are dropped.

use crate::{
    provider::SessionMirror,
    pubsub::EventListeners,
    transport::BridgeConn,
};
use omni_core::{events::OmniEvent, request::OmniRequest, EVENT_NOTIFICATION, OMNI_READY_EVENT};
use omni_rpc::{
    error::RpcError,
    request::{Id, RpcMethodCall, RpcNotification},
    response::{ResponseResult, RpcResponse},
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::{
    mpsc::{UnboundedReceiver, UnboundedSender},
    oneshot, watch,
};
use tracing::{trace, warn};

/// Errors surfaced by the page-side client
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// No response arrived within the configured request timeout
    #[error("request timed out")]
    Timeout,
    /// The wallet side of the channel is gone
    #[error("connection to the wallet is closed")]
    ChannelClosed,
    /// The wallet answered with an error
    #[error("{0}")]
    Rpc(RpcError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

type PendingRequests = Arc<Mutex<HashMap<u64, oneshot::Sender<ResponseResult>>>>;

/// Correlating RPC client over a [`BridgeConn`]
pub struct RpcClient {
    to_wallet: UnboundedSender<String>,
    pending: PendingRequests,
    next_id: AtomicU64,
    timeout: Option<Duration>,
    ready: watch::Receiver<bool>,
}

impl RpcClient {
    /// Takes over the connection and spawns the reader task
    pub(crate) fn new(
        conn: BridgeConn,
        timeout: Option<Duration>,
        listeners: EventListeners,
        mirror: Arc<SessionMirror>,
    ) -> Self {
        let (to_wallet, from_wallet) = conn.split();
        let pending: PendingRequests = Arc::new(Mutex::new(HashMap::new()));
        let (ready_tx, ready) = watch::channel(false);
        tokio::spawn(read_loop(from_wallet, Arc::clone(&pending), ready_tx, listeners, mirror));
        Self { to_wallet, pending, next_id: AtomicU64::new(1), timeout, ready }
    }

    /// Resolves once the wallet has announced `omni_ready`
    pub async fn ready(&self) -> Result<(), TransportError> {
        let mut ready = self.ready.clone();
        ready.wait_for(|ready| *ready).await.map_err(|_| TransportError::ChannelClosed)?;
        Ok(())
    }

    /// Sends the request and awaits its correlated response
    pub async fn request(
        &self,
        request: &OmniRequest,
    ) -> Result<serde_json::Value, TransportError> {
        let params = serde_json::to_value(request)?
            .get("params")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let call = RpcMethodCall::new(id, request.method_name(), params.into());
        let frame = serde_json::to_string(&call)?;

        // the oneshot is parked before the frame leaves, so even an
        // immediate response finds its slot
        let (done_tx, done_rx) = oneshot::channel();
        self.pending.lock().insert(id, done_tx);
        if self.to_wallet.send(frame).is_err() {
            self.pending.lock().remove(&id);
            return Err(TransportError::ChannelClosed);
        }
        trace!(target: "rpc", id, method = request.method_name(), "sent request");

        let response = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, done_rx).await {
                Ok(response) => response,
                Err(_) => {
                    // remove the slot so a late response is dropped as
                    // unsolicited instead of resolving a dead call
                    self.pending.lock().remove(&id);
                    return Err(TransportError::Timeout);
                }
            },
            None => done_rx.await,
        };
        match response {
            Ok(ResponseResult::Success(value)) => Ok(value),
            Ok(ResponseResult::Error(error)) => Err(TransportError::Rpc(error)),
            Err(_) => Err(TransportError::ChannelClosed),
        }
    }
}

async fn read_loop(
    mut from_wallet: UnboundedReceiver<String>,
    pending: PendingRequests,
    ready_tx: watch::Sender<bool>,
    listeners: EventListeners,
    mirror: Arc<SessionMirror>,
) {
    while let Some(frame) = from_wallet.recv().await {
        if let Ok(notification) = serde_json::from_str::<RpcNotification>(&frame) {
            match notification.method.as_str() {
                OMNI_READY_EVENT => {
                    trace!(target: "rpc", "wallet is ready");
                    let _ = ready_tx.send(true);
                }
                EVENT_NOTIFICATION => {
                    match serde_json::from_value::<OmniEvent>(notification.params.into()) {
                        Ok(event) => {
                            mirror.apply(&event);
                            listeners.notify(event);
                        }
                        Err(err) => warn!(target: "rpc", %err, "malformed event payload"),
                    }
                }
                method => trace!(target: "rpc", method, "ignoring unknown notification"),
            }
            continue
        }
        match serde_json::from_str::<RpcResponse>(&frame) {
            Ok(response) => deliver_response(&pending, response),
            Err(err) => warn!(target: "rpc", %err, "unparsable frame from wallet"),
        }
    }

    // wallet side hung up: dropping the parked oneshots rejects every
    // in-flight call, and a connected mirror observes a disconnect
    pending.lock().clear();
    if mirror.connected() {
        mirror.apply(&OmniEvent::Disconnect);
        listeners.notify(OmniEvent::Disconnect);
    }
}

fn deliver_response(pending: &PendingRequests, response: RpcResponse) {
    let id = match response.id() {
        Some(Id::Number(id)) => *id,
        id => {
            warn!(target: "rpc", ?id, "response with no usable id");
            return
        }
    };
    match pending.lock().remove(&id) {
        Some(done_tx) => {
            // a receiver dropped after timing out is fine to miss
            let _ = done_tx.send(response.into_result());
        }
        None => warn!(target: "rpc", id, "unsolicited response"),
    }
}
