//! Wallet-side state changes and their propagation to the page.

use crate::support::{test_account, TestBridge};
use futures::{FutureExt, StreamExt};
use omni_core::{account::Protocol, events::OmniEvent, state::NetworkInfo};

#[tokio::test]
async fn accounts_changed_reaches_the_page() {
    let bridge = TestBridge::spawn(vec![test_account(1)]).await;
    bridge.connect().await;
    let mut events = bridge.handle.provider().events();

    bridge.api.set_accounts(vec![test_account(1), test_account(3)]);

    match events.next().await.unwrap() {
        OmniEvent::AccountsChanged(accounts) => {
            assert_eq!(accounts, vec![test_account(1), test_account(3)])
        }
        event => panic!("expected accountsChanged, got {event:?}"),
    }
    // the selected account was still a member and survives
    assert_eq!(bridge.handle.provider().public_account(), Some(test_account(1)));
}

#[tokio::test]
async fn removing_the_selected_account_moves_the_selection() {
    let bridge = TestBridge::spawn(vec![test_account(1), test_account(2)]).await;
    bridge.connect().await;
    let mut events = bridge.handle.provider().events();

    bridge.api.set_accounts(vec![test_account(2)]);

    assert!(matches!(events.next().await.unwrap(), OmniEvent::AccountsChanged(_)));
    assert_eq!(bridge.handle.provider().public_account(), Some(test_account(2)));
    let state = bridge.handle.provider().get_provider_state().await.unwrap().unwrap();
    assert_eq!(state.current_account, Some(test_account(2)));
    assert!(state.is_consistent());
}

#[tokio::test]
async fn empty_account_set_disconnects() {
    let bridge = TestBridge::spawn(vec![test_account(1)]).await;
    bridge.connect().await;
    let mut events = bridge.handle.provider().events();

    bridge.api.set_accounts(Vec::new());

    // a single disconnect, never an accountsChanged with an empty list
    assert!(matches!(events.next().await.unwrap(), OmniEvent::Disconnect));
    crate::support::settle().await;
    assert!(events.next().now_or_never().flatten().is_none());
    assert!(!bridge.handle.provider().connected());
    assert!(bridge.handle.provider().get_provider_state().await.unwrap().is_none());
}

#[tokio::test]
async fn network_change_reaches_the_page() {
    let bridge = TestBridge::spawn(vec![test_account(1)]).await;
    bridge.connect().await;
    let mut events = bridge.handle.provider().events();

    let network = NetworkInfo { chain_id: "omni-mainnet".to_string(), protocol: Protocol::Aptos };
    bridge.api.set_network(network.clone());

    match events.next().await.unwrap() {
        OmniEvent::NetworkChanged(changed) => assert_eq!(changed, network),
        event => panic!("expected networkChanged, got {event:?}"),
    }
    assert_eq!(bridge.handle.provider().network(), Some(network));
}

#[tokio::test]
async fn session_changes_are_ignored_while_disconnected() {
    let bridge = TestBridge::spawn(vec![test_account(1)]).await;
    let mut events = bridge.handle.provider().events();

    bridge.api.set_accounts(vec![test_account(2)]);
    bridge.api.set_network(NetworkInfo {
        chain_id: "omni-mainnet".to_string(),
        protocol: Protocol::Aptos,
    });

    crate::support::settle().await;
    assert!(events.next().now_or_never().flatten().is_none());
}

#[tokio::test]
async fn locking_keeps_the_session() {
    let bridge = TestBridge::spawn(vec![test_account(1)]).await;
    bridge.connect().await;
    let mut events = bridge.handle.provider().events();

    bridge.api.set_unlocked(false);

    match events.next().await.unwrap() {
        OmniEvent::UnlockStateChanged(unlocked) => assert!(!unlocked),
        event => panic!("expected unlockStateChanged, got {event:?}"),
    }
    // locking hides nothing: accounts stay exposed until a disconnect
    let state = bridge.handle.provider().get_provider_state().await.unwrap().unwrap();
    assert!(state.is_connected);
    assert!(!state.is_unlocked);
    assert_eq!(state.current_account, Some(test_account(1)));

    // repeating the same lock state emits nothing
    bridge.api.set_unlocked(false);
    crate::support::settle().await;
    assert!(events.next().now_or_never().flatten().is_none());
}

#[tokio::test]
async fn wallet_side_revocation_disconnects_the_page() {
    let bridge = TestBridge::spawn(vec![test_account(1)]).await;
    bridge.connect().await;
    let mut events = bridge.handle.provider().events();

    bridge.api.revoke_connection();

    assert!(matches!(events.next().await.unwrap(), OmniEvent::Disconnect));
    assert!(!bridge.handle.provider().connected());
    assert!(bridge.handle.provider().public_account().is_none());
}

#[tokio::test]
async fn events_are_not_replayed_to_late_subscribers() {
    let bridge = TestBridge::spawn(vec![test_account(1)]).await;
    let mut early = bridge.handle.provider().events();
    bridge.connect().await;

    // the early subscriber observing the event proves it was delivered
    assert!(matches!(early.next().await.unwrap(), OmniEvent::Connect(_)));

    // a subscriber registered afterwards sees nothing
    let mut late = bridge.handle.provider().events();
    crate::support::settle().await;
    assert!(late.next().now_or_never().flatten().is_none());
}
