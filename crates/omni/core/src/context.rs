//! Calling site identity

use crate::account::AccountInfo;
use serde::{Deserialize, Serialize};

/// Site metadata a dapp announces via `omni_sendSiteMetadata`.
///
/// Informational only; the wallet may use it for consent UI but it never
/// affects connection state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMetadata {
    pub name: String,
    pub icon: Option<String>,
}

/// Identifies the calling site for the wallet's own policy decisions.
///
/// Read-only from the bridge core's perspective; only `omni_sendSiteMetadata`
/// updates the name and icon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DappRequestContext {
    pub dapp_name: String,
    pub icon: Option<String>,
    pub origin: String,
    pub wallet: Option<AccountInfo>,
}

impl DappRequestContext {
    /// Context for a site that has not announced any metadata yet
    pub fn unknown(origin: impl Into<String>) -> Self {
        Self { dapp_name: String::new(), icon: None, origin: origin.into(), wallet: None }
    }
}
