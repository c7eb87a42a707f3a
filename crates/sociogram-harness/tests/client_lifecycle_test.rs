//! Session client lifecycle against the simulated platform.
//!
//! Covers connection (including the timeout race), lazy re-initialization,
//! the sign-in redirect flow, sign-out cleanup, and error classification of
//! contract rejections.

use std::time::Duration;

use sociogram_client::{
    AccountId, ClientConfig, ClientError, ClientState, RedirectParams, RejectionKind,
    SessionClient,
};
use sociogram_harness::{SimEnv, SimNetwork, SimPlatform, approve_redirect};

fn client(platform: SimPlatform) -> SessionClient<SimPlatform, SimEnv> {
    SessionClient::new(platform, SimEnv::default(), ClientConfig::default())
}

fn chat_network() -> SimNetwork {
    let network = SimNetwork::new()
        .with_user("alice.testnet", "Alice")
        .with_user("bob.testnet", "Bob")
        .with_user("carol.testnet", "");
    network.deliver("alice.testnet", "bob.testnet", "hi");
    network.deliver("bob.testnet", "alice.testnet", "yo");
    network
}

#[tokio::test]
async fn initialize_without_stored_session_is_signed_out() {
    let network = chat_network();
    let client = client(SimPlatform::new(&network));

    assert_eq!(client.initialize().await, Ok(ClientState::SignedOut));
    assert!(!client.is_signed_in().await);
    assert!(!client.has_contract().await);
}

#[tokio::test]
async fn stored_session_is_restored_with_contract() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));

    let state = client.initialize().await.unwrap();

    assert_eq!(state, ClientState::SignedIn { account_id: "alice.testnet".into() });
    assert!(client.has_contract().await);
    assert_eq!(client.current_account().await, Some(AccountId::from("alice.testnet")));
}

#[tokio::test]
async fn reads_without_contract_are_empty() {
    let network = chat_network();
    let client = client(SimPlatform::new(&network));

    assert!(client.list_users().await.is_empty());
    assert!(client.get_messages(&"alice.testnet".into()).await.is_empty());
}

#[tokio::test]
async fn reads_degrade_to_empty_on_failure() {
    let network = chat_network();
    network.set_fail_views(true);
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));

    assert!(client.list_users().await.is_empty());
    assert!(client.get_messages(&"alice.testnet".into()).await.is_empty());
    assert_eq!(network.calls().view_users, 1);
}

#[tokio::test]
async fn first_call_initializes_lazily() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));
    assert_eq!(client.state().await, ClientState::Uninitialized);

    let users = client.list_users().await;

    let names: Vec<_> = users.iter().map(|u| u.display_name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "carol"]);
    assert_eq!(network.calls().connect, 1);
}

#[tokio::test]
async fn concurrent_first_calls_connect_once() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));
    let alice = AccountId::from("alice.testnet");

    let (users, messages) = tokio::join!(client.list_users(), client.get_messages(&alice));

    assert_eq!(users.len(), 3);
    assert_eq!(messages.len(), 2);
    assert_eq!(network.calls().connect, 1);
}

#[tokio::test]
async fn contract_refusal_is_proxy_unavailable() {
    let network = chat_network();
    network.set_refuse_contract(true);
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));

    let err = client.send_message(&"bob.testnet".into(), "hello").await.unwrap_err();

    assert_eq!(err, ClientError::ProxyUnavailable);
    assert_eq!(network.calls().send_message, 0);
}

#[tokio::test]
async fn unreachable_network_is_proxy_unavailable_for_writes() {
    let network = chat_network();
    network.set_fail_connect(true);
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));

    let err = client.register_username("alice").await.unwrap_err();

    assert_eq!(err, ClientError::ProxyUnavailable);
    assert_eq!(client.state().await, ClientState::Uninitialized);
}

#[tokio::test(start_paused = true)]
async fn slow_connection_times_out() {
    let network = chat_network();
    network.set_connect_delay(Some(Duration::from_secs(30)));
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));

    let err = client.initialize().await.unwrap_err();

    assert!(matches!(err, ClientError::ConnectTimeout { elapsed } if elapsed == Duration::from_secs(10)));
    assert_eq!(client.state().await, ClientState::Uninitialized);

    network.set_connect_delay(None);
    assert!(client.initialize().await.is_ok());
}

#[tokio::test]
async fn writes_require_a_session() {
    let network = chat_network();
    let client = client(SimPlatform::new(&network));

    let err = client.send_message(&"bob.testnet".into(), "hello").await.unwrap_err();

    assert_eq!(err, ClientError::NotSignedIn);
    assert!(err.requires_sign_in());
    assert_eq!(network.calls().changes(), 0);
}

#[tokio::test]
async fn empty_content_is_rejected_locally() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));

    let err = client.send_message(&"bob.testnet".into(), "  \t").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));

    let err = client.register_username("").await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidInput(_)));
    assert_eq!(network.calls().changes(), 0);
}

#[tokio::test]
async fn redirect_sign_in_establishes_session() {
    let network = chat_network();
    let platform = SimPlatform::new(&network);
    let client = client(platform.clone());

    assert_eq!(client.request_sign_in().await.unwrap_err(), ClientError::NotInitialized);

    client.initialize().await.unwrap();
    let redirect = client.request_sign_in().await.unwrap();
    assert!(redirect.url.starts_with("sim://wallet/login/"));
    assert!(redirect.url.contains("success_url=http%3A%2F%2Flocalhost%3A5173%2Fchat"));
    assert_eq!(client.state().await, ClientState::AwaitingRedirect);

    let params = RedirectParams::parse(&approve_redirect("bob.testnet")).unwrap();
    let account = client.complete_sign_in(&params).await.unwrap();

    assert_eq!(account, AccountId::from("bob.testnet"));
    assert!(client.has_contract().await);
    assert_eq!(platform.stored_session(), Some(account));
}

#[tokio::test]
async fn sign_out_clears_session_and_contract() {
    let network = chat_network();
    let platform = SimPlatform::with_session(&network, "alice.testnet");
    let client = client(platform.clone());
    client.initialize().await.unwrap();

    client.sign_out().await;

    assert!(!client.is_signed_in().await);
    assert_eq!(client.current_account().await, None);
    assert!(!client.has_contract().await);
    assert_eq!(client.state().await, ClientState::SignedOut);
    assert_eq!(platform.stored_session(), None);
}

#[tokio::test]
async fn reset_drops_handles_but_not_wallet_storage() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));
    client.initialize().await.unwrap();

    client.reset().await;
    assert_eq!(client.state().await, ClientState::Uninitialized);
    assert!(!client.has_contract().await);

    client.initialize().await.unwrap();
    assert!(client.has_contract().await);
    assert_eq!(network.calls().connect, 2);
}

#[tokio::test]
async fn duplicate_registration_is_classified() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "bob.testnet"));

    let err = client.register_username("bob").await.unwrap_err();

    assert_eq!(err, ClientError::RemoteRejected {
        message: "Smart contract panicked: User already registered".into(),
        kind: RejectionKind::AlreadyRegistered,
    });
    assert_eq!(client.current_account().await, Some(AccountId::from("bob.testnet")));
}

#[tokio::test]
async fn unregistered_receiver_is_classified() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));

    let err = client.send_message(&"dave.testnet".into(), "hello").await.unwrap_err();

    assert_eq!(err.rejection_kind(), Some(RejectionKind::ReceiverNotRegistered));
}

#[tokio::test]
async fn unregistered_sender_is_classified() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "dave.testnet"));

    let err = client.send_message(&"bob.testnet".into(), "hello").await.unwrap_err();

    assert_eq!(err.rejection_kind(), Some(RejectionKind::SenderNotRegistered));
}

#[tokio::test]
async fn missing_key_is_session_expiry() {
    let network = chat_network();
    network.expire_session("alice.testnet");
    let client = client(SimPlatform::with_session(&network, "alice.testnet"));

    let err = client.send_message(&"bob.testnet".into(), "hello").await.unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired { .. }));
    assert!(err.requires_sign_in());
}

#[tokio::test]
async fn accepted_send_is_stored() {
    let network = chat_network();
    let client = client(SimPlatform::with_session(&network, "carol.testnet"));

    let outcome = client.send_message(&"alice.testnet".into(), "hey alice").await.unwrap();

    assert!(outcome.transaction_hash.is_some());
    let stored = network.messages();
    let last = stored.last().unwrap();
    assert_eq!(last.sender, AccountId::from("carol.testnet"));
    assert_eq!(last.content, "hey alice");
}
