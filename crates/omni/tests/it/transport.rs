//! Wire-level tests against the framing layer and the correlating client.

use crate::support::{test_account, test_network, MockChain, MockConsent, MockSigner, TestBridge};
use futures::StreamExt;
use omni::{transport, BridgeConfig, OmniApi, OmniProvider, TransportError, WalletContext};
use omni_core::events::OmniEvent;
use omni_rpc::{
    error::ErrorCode,
    request::RpcNotification,
    response::{ResponseResult, RpcResponse},
};
use std::{sync::Arc, time::Duration};

/// Serves a real api and hands back the raw page endpoint
fn serve_raw() -> transport::BridgeConn {
    let wallet = WalletContext {
        signer: Arc::new(MockSigner::default()),
        chain: Arc::new(MockChain::default()),
        consent: Arc::new(MockConsent::default()),
        accounts: vec![test_account(1)],
        network: test_network(),
        unlocked: true,
    };
    let api = OmniApi::new(wallet, BridgeConfig::default());
    let (page_conn, wallet_conn) = transport::channel();
    transport::serve(api, wallet_conn);
    page_conn
}

#[tokio::test]
async fn ready_is_announced_before_anything_else() {
    let mut page = serve_raw();
    let frame = page.recv().await.unwrap();
    let notification: RpcNotification = serde_json::from_str(&frame).unwrap();
    assert_eq!(notification.method, "omni_ready");
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let mut page = serve_raw();
    page.recv().await.unwrap(); // omni_ready

    page.send(r#"{"jsonrpc":"2.0","id":1,"method":"omni_stealKeys","params":null}"#.to_string())
        .unwrap();

    let response: RpcResponse = serde_json::from_str(&page.recv().await.unwrap()).unwrap();
    assert_eq!(response.id().unwrap().to_string(), "1");
    match response.into_result() {
        ResponseResult::Error(error) => assert_eq!(error.code, ErrorCode::MethodNotFound),
        result => panic!("expected an error, got {result:?}"),
    }
}

#[tokio::test]
async fn malformed_params_are_invalid_params() {
    let mut page = serve_raw();
    page.recv().await.unwrap();

    page.send(
        r#"{"jsonrpc":"2.0","id":2,"method":"omni_signMessage","params":{"datum":"x"}}"#
            .to_string(),
    )
    .unwrap();

    let response: RpcResponse = serde_json::from_str(&page.recv().await.unwrap()).unwrap();
    match response.into_result() {
        ResponseResult::Error(error) => assert_eq!(error.code, ErrorCode::InvalidParams),
        result => panic!("expected an error, got {result:?}"),
    }
}

#[tokio::test]
async fn garbage_is_a_parse_error() {
    let mut page = serve_raw();
    page.recv().await.unwrap();

    page.send("not json at all".to_string()).unwrap();

    let response: RpcResponse = serde_json::from_str(&page.recv().await.unwrap()).unwrap();
    assert!(response.id().is_none());
    match response.into_result() {
        ResponseResult::Error(error) => assert_eq!(error.code, ErrorCode::ParseError),
        result => panic!("expected an error, got {result:?}"),
    }
}

#[tokio::test]
async fn invalid_request_echoes_the_id() {
    let mut page = serve_raw();
    page.recv().await.unwrap();

    // carries an id but is not a method call
    page.send(r#"{"id":7,"jsonrpc":"1.0","method":"omni_connect"}"#.to_string()).unwrap();

    let response: RpcResponse = serde_json::from_str(&page.recv().await.unwrap()).unwrap();
    assert_eq!(response.id().unwrap().to_string(), "7");
    match response.into_result() {
        ResponseResult::Error(error) => assert_eq!(error.code, ErrorCode::InvalidRequest),
        result => panic!("expected an error, got {result:?}"),
    }
}

#[tokio::test]
async fn notifications_are_not_answered() {
    let mut page = serve_raw();
    page.recv().await.unwrap();

    // no id, so no response may be produced
    page.send(r#"{"jsonrpc":"2.0","method":"omni_disconnect","params":null}"#.to_string())
        .unwrap();
    page.send(
        r#"{"jsonrpc":"2.0","id":3,"method":"omni_getProviderState","params":null}"#.to_string(),
    )
    .unwrap();

    // the next frame answers the method call, not the notification
    let response: RpcResponse = serde_json::from_str(&page.recv().await.unwrap()).unwrap();
    assert_eq!(response.id().unwrap().to_string(), "3");
    assert!(matches!(response.into_result(), ResponseResult::Success(_)));
}

/// A wallet endpoint that never answers, for timing out the client
fn silent_wallet(timeout: Duration) -> (OmniProvider, transport::BridgeConn) {
    let (page_conn, wallet_conn) = transport::channel();
    (OmniProvider::new(page_conn, Some(timeout)), wallet_conn)
}

#[tokio::test]
async fn requests_time_out_and_late_responses_are_dropped() {
    let (provider, mut wallet) = silent_wallet(Duration::from_millis(50));

    let err = provider.get_provider_state().await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout));

    // answer the timed out call now; the client must drop it silently
    let frame = wallet.recv().await.unwrap();
    let call: omni_rpc::request::RpcMethodCall = serde_json::from_str(&frame).unwrap();
    let late = RpcResponse::new(call.id(), ResponseResult::Success(serde_json::json!(true)));
    wallet.send(serde_json::to_string(&late).unwrap()).unwrap();

    // the client keeps working and correlates the next call correctly
    let pending = provider.disconnect();
    let answer = async {
        let frame = wallet.recv().await.unwrap();
        let call: omni_rpc::request::RpcMethodCall = serde_json::from_str(&frame).unwrap();
        let response =
            RpcResponse::new(call.id(), ResponseResult::Success(serde_json::json!(true)));
        wallet.send(serde_json::to_string(&response).unwrap()).unwrap();
    };
    let (result, ()) = tokio::join!(pending, answer);
    assert!(result.unwrap());
}

#[tokio::test]
async fn dropping_the_wallet_rejects_in_flight_calls() {
    let (provider, wallet) = silent_wallet(Duration::from_secs(5));

    let pending = provider.get_provider_state();
    let dropper = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(wallet);
    };
    let (result, ()) = tokio::join!(pending, dropper);
    assert!(matches!(result.unwrap_err(), TransportError::ChannelClosed));

    // later calls fail fast on the dead channel
    let err = provider.disconnect().await.unwrap_err();
    assert!(matches!(err, TransportError::ChannelClosed));
}

#[tokio::test]
async fn shutdown_disconnects_a_connected_provider() {
    let bridge = TestBridge::spawn(vec![test_account(1)]).await;
    bridge.connect().await;
    let mut events = bridge.handle.provider().events();

    bridge.handle.shutdown();

    assert!(matches!(events.next().await.unwrap(), OmniEvent::Disconnect));
    assert!(!bridge.handle.provider().connected());
    let err = bridge.handle.provider().disconnect().await.unwrap_err();
    assert!(matches!(err, TransportError::ChannelClosed));
}

#[tokio::test]
async fn wallet_state_resets_when_the_page_goes_away() {
    let wallet = WalletContext {
        signer: Arc::new(MockSigner::default()),
        chain: Arc::new(MockChain::default()),
        consent: Arc::new(MockConsent::default()),
        accounts: vec![test_account(1)],
        network: test_network(),
        unlocked: true,
    };
    let (api, handle) = omni::spawn(wallet, BridgeConfig::default());
    handle.provider().ready().await.unwrap();
    assert!(handle.provider().connect().await.unwrap());
    assert!(api.connection().is_connected());

    // the page endpoint disappears with the session still established
    drop(handle);

    crate::support::settle().await;
    assert!(!api.connection().is_connected());
    assert!(api.connection().snapshot().is_none());
}

#[tokio::test]
async fn responses_arrive_in_completion_order() {
    // a slow consent keeps omni_connect busy while a state query overtakes it
    let consent =
        MockConsent { delay: Some(Duration::from_millis(50)), ..Default::default() };
    let bridge = TestBridge::spawn_with(
        vec![test_account(1)],
        consent,
        BridgeConfig::default(),
    )
    .await;

    let provider = bridge.handle.provider();
    let connect = provider.connect();
    let state = async {
        // issued after connect but answered first
        tokio::time::sleep(Duration::from_millis(5)).await;
        provider.get_provider_state().await
    };
    let (connected, state) = tokio::join!(connect, state);
    assert!(connected.unwrap());
    // answered while the connect was still reviewing consent
    assert!(state.unwrap().is_none());
}
