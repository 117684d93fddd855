//! Bridge configuration

use std::time::Duration;

/// Configuration of a bridge instance.
///
/// Transaction defaults apply when a dapp does not override the matching
/// field in its `TransactionOptions`.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// How long a dapp-side call waits for its response before rejecting
    /// with a timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// Default maximum gas units per transaction
    pub max_gas_amount: u64,
    /// Default gas unit price
    pub gas_unit_price: u64,
    /// Default lifetime of a built transaction request, in seconds from now
    pub transaction_expiry_secs: u64,
    /// Origin of the dapp this bridge serves
    pub origin: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            max_gas_amount: 2_000,
            gas_unit_price: 1,
            transaction_expiry_secs: 30,
            origin: "unknown".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_max_gas_amount(mut self, max_gas_amount: u64) -> Self {
        self.max_gas_amount = max_gas_amount;
        self
    }

    pub fn with_gas_unit_price(mut self, gas_unit_price: u64) -> Self {
        self.gas_unit_price = gas_unit_price;
        self
    }

    pub fn with_transaction_expiry(mut self, secs: u64) -> Self {
        self.transaction_expiry_secs = secs;
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}
