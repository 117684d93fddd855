//! JSON-RPC types for the omni wallet provider bridge.
//!
//! The bridge speaks plain JSON-RPC 2.0 envelopes over an arbitrary duplex
//! channel: `{id, method, params}` requests, `{id, result}`/`{id, error}`
//! responses, and id-less notifications for wallet initiated events.
//! Batch envelopes are intentionally unsupported; correlation between a
//! request and its response is strictly 1:1.

pub mod error;
pub mod request;
pub mod response;
