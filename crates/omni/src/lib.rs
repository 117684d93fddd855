//! In-page wallet provider bridge.
//!
//! Connects a dapp running in a page to a browser-extension wallet over a
//! duplex message channel. The page side exposes the typed
//! [`OmniProvider`]; the wallet side runs an [`OmniApi`] behind a serving
//! loop. Between them sit a JSON-RPC framing layer, an id-correlating
//! client, a connection/account/lock state machine and the transaction
//! signing lifecycle.
//!
//! A minimal embedding wires both sides with [`spawn`]:
//!
//! ```ignore
//! let (api, handle) = omni::spawn(wallet, BridgeConfig::default());
//! handle.provider().ready().await?;
//! let connected = handle.provider().connect().await?;
//! ```

pub mod api;
pub mod config;
pub mod connection;
pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod pubsub;
pub mod transport;
pub mod wallet;

pub use api::OmniApi;
pub use config::BridgeConfig;
pub use connection::ConnectionState;
pub use error::{BridgeError, Result};
pub use provider::OmniProvider;
pub use pubsub::EventStream;
pub use transport::{RpcClient, TransportError};
pub use wallet::{ChainClient, ConsentHandler, TransactionSigner, WalletAction, WalletContext};

use tokio::task::JoinHandle;

/// A running bridge: the page-side provider plus the wallet-side serving
/// task
pub struct BridgeHandle {
    provider: OmniProvider,
    task: JoinHandle<()>,
}

impl BridgeHandle {
    pub fn provider(&self) -> &OmniProvider {
        &self.provider
    }

    /// Tears the bridge down. In-flight page-side calls reject with
    /// [`TransportError::ChannelClosed`] and a connected provider observes
    /// a disconnect.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

/// Wires a complete in-process bridge: wallet endpoint served in a spawned
/// task, page endpoint wrapped in a provider
pub fn spawn(wallet: WalletContext, config: BridgeConfig) -> (OmniApi, BridgeHandle) {
    let request_timeout = config.request_timeout;
    let api = OmniApi::new(wallet, config);
    let (page_conn, wallet_conn) = transport::channel();
    let task = transport::serve(api.clone(), wallet_conn);
    let provider = OmniProvider::new(page_conn, request_timeout);
    (api, BridgeHandle { provider, task })
}
