//! Shared fixtures: deterministic mock collaborators and a bridge spawner.

use async_trait::async_trait;
use omni::{
    BridgeConfig, BridgeError, BridgeHandle, ChainClient, ConsentHandler, OmniApi,
    TransactionSigner, WalletAction, WalletContext,
};
use omni_core::{
    account::{Account, Address, Protocol},
    bytes::HexBytes,
    context::DappRequestContext,
    state::NetworkInfo,
    transaction::{
        AccountSignature, OnChainTransaction, PendingTransaction, SigningMessageRequest,
        SubmitTransactionRequest, TransactionPayload, UserTransactionRequest,
    },
};
use parking_lot::Mutex;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// Wires test tracing to `RUST_LOG`
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Lets in-flight frames drain before asserting that nothing arrived
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

pub fn test_account(n: u64) -> Account {
    Account {
        public_key: format!("0xpub{n}"),
        address: format!("0x{n:02x}"),
        auth_key: format!("0xauth{n}"),
        protocol: Protocol::Aptos,
    }
}

pub fn test_network() -> NetworkInfo {
    NetworkInfo { chain_id: "omni-devnet".to_string(), protocol: Protocol::Aptos }
}

pub fn transfer_payload() -> TransactionPayload {
    TransactionPayload(serde_json::json!({
        "function": "0x1::coin::transfer",
        "arguments": ["0xcafe", 100],
    }))
}

/// Signer whose signing message is the serialized request, so mismatches
/// are easy to construct in tests
#[derive(Default)]
pub struct MockSigner {
    pub signatures: AtomicUsize,
}

#[async_trait]
impl TransactionSigner for MockSigner {
    fn signing_message(&self, request: &SigningMessageRequest) -> omni::Result<HexBytes> {
        let bytes =
            serde_json::to_vec(request).map_err(|err| BridgeError::Signer(err.to_string()))?;
        Ok(HexBytes(bytes))
    }

    async fn sign_message(&self, account: &Account, data: &str) -> omni::Result<String> {
        self.signatures.fetch_add(1, Ordering::SeqCst);
        Ok(format!("sig:{}:{data}", account.address))
    }

    async fn sign_signing_message(
        &self,
        account: &Account,
        message: &HexBytes,
    ) -> omni::Result<AccountSignature> {
        self.signatures.fetch_add(1, Ordering::SeqCst);
        Ok(AccountSignature {
            public_key: account.public_key.clone(),
            signature: HexBytes(message.0.iter().rev().copied().collect()),
        })
    }

    async fn sign_secondary(
        &self,
        addresses: &[Address],
        message: &HexBytes,
    ) -> omni::Result<Vec<AccountSignature>> {
        Ok(addresses
            .iter()
            .map(|address| AccountSignature {
                public_key: format!("{address}-pub"),
                signature: message.clone(),
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MockChain {
    pub submitted: Mutex<Vec<SubmitTransactionRequest>>,
    pub confirmations: AtomicUsize,
    pub fail_submit: AtomicBool,
    pub fail_confirmation: AtomicBool,
}

#[async_trait]
impl ChainClient for MockChain {
    async fn sequence_number(&self, _address: &str) -> omni::Result<u64> {
        Ok(7)
    }

    async fn submit(&self, tx: &SubmitTransactionRequest) -> omni::Result<PendingTransaction> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BridgeError::Chain("submit failed".to_string()))
        }
        let mut submitted = self.submitted.lock();
        let hash = format!("0xhash{}", submitted.len());
        submitted.push(tx.clone());
        Ok(PendingTransaction { hash, request: tx.request.clone() })
    }

    async fn wait_for_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> omni::Result<OnChainTransaction> {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        if self.fail_confirmation.load(Ordering::SeqCst) {
            return Err(BridgeError::Chain("confirmation timed out".to_string()))
        }
        Ok(OnChainTransaction {
            hash: pending.hash.clone(),
            version: 1,
            success: true,
            vm_status: "Executed successfully".to_string(),
            gas_used: 9,
        })
    }

    async fn simulate(
        &self,
        request: &UserTransactionRequest,
    ) -> omni::Result<Vec<OnChainTransaction>> {
        Ok(vec![OnChainTransaction {
            hash: "0xsimulated".to_string(),
            version: 0,
            success: true,
            vm_status: "Executed successfully".to_string(),
            gas_used: request.max_gas_amount / 2,
        }])
    }

    async fn request_faucet(&self, _address: &str, amount: u64) -> omni::Result<Vec<String>> {
        Ok(vec![format!("0xfaucet{amount}")])
    }
}

pub struct MockConsent {
    pub approve: AtomicBool,
    pub reviews: AtomicUsize,
    pub reported: Mutex<Vec<String>>,
    /// Keeps the consent UI "open" long enough for tests to race a second
    /// call against it
    pub delay: Option<Duration>,
}

impl Default for MockConsent {
    fn default() -> Self {
        Self {
            approve: AtomicBool::new(true),
            reviews: AtomicUsize::new(0),
            reported: Mutex::new(Vec::new()),
            delay: None,
        }
    }
}

#[async_trait]
impl ConsentHandler for MockConsent {
    async fn review(
        &self,
        _ctx: &DappRequestContext,
        _action: WalletAction<'_>,
    ) -> omni::Result<()> {
        self.reviews.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.approve.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BridgeError::UserRejected("declined in test wallet".to_string()))
        }
    }

    fn report_error(&self, _ctx: &DappRequestContext, error: &BridgeError) {
        self.reported.lock().push(error.to_string());
    }
}

/// Fully wired in-process bridge with handles onto every mock
pub struct TestBridge {
    pub api: OmniApi,
    pub handle: BridgeHandle,
    pub signer: Arc<MockSigner>,
    pub chain: Arc<MockChain>,
    pub consent: Arc<MockConsent>,
}

impl TestBridge {
    pub async fn spawn(accounts: Vec<Account>) -> Self {
        Self::spawn_with(accounts, MockConsent::default(), BridgeConfig::default()).await
    }

    pub async fn spawn_with(
        accounts: Vec<Account>,
        consent: MockConsent,
        config: BridgeConfig,
    ) -> Self {
        init_tracing();
        let signer = Arc::new(MockSigner::default());
        let chain = Arc::new(MockChain::default());
        let consent = Arc::new(consent);
        let wallet = WalletContext {
            signer: signer.clone(),
            chain: chain.clone(),
            consent: consent.clone(),
            accounts,
            network: test_network(),
            unlocked: true,
        };
        let (api, handle) = omni::spawn(wallet, config);
        handle.provider().ready().await.unwrap();
        Self { api, handle, signer, chain, consent }
    }

    /// Connects through the provider, panicking unless the wallet exposed
    /// accounts
    pub async fn connect(&self) {
        assert!(self.handle.provider().connect().await.unwrap());
    }
}
