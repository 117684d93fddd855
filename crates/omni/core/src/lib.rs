//! Core types of the omni wallet provider bridge.
//!
//! This crate is the single source of truth for the protocol surface: the
//! closed method registry ([`request::OmniRequest`]), the data model shared
//! by both sides of the bridge, and the event vocabulary. Everything here is
//! plain data; the runtime behavior lives in the `omni` crate.

pub mod account;
pub mod bytes;
pub mod context;
pub mod events;
pub mod request;
pub mod serde_helpers;
pub mod state;
pub mod transaction;

/// Method name of the notification that announces a wallet provider to the
/// hosting page. Page load scripts listen for this before constructing the
/// bridge.
pub const OMNI_READY_EVENT: &str = "omni_ready";

/// Method name of the notification that carries [`events::OmniEvent`]s from
/// the wallet to the dapp.
pub const EVENT_NOTIFICATION: &str = "omni_event";
