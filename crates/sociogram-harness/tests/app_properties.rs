//! Property-based tests for App state machine.
//!
//! Tests verify that invariants hold under arbitrary event sequences,
//! including remote results that arrive late, out of order, or for peers that
//! are no longer selected. This ensures behavioral correctness across all
//! possible execution paths.

use sociogram_app::{App, AppAction, AppEvent, Delivery, KeyInput};
use sociogram_client::{AccountId, ClientError, Message, User};
use sociogram_harness::{InvariantRegistry, SystemSnapshot, ViewSnapshot};
use proptest::prelude::*;

const ACCOUNTS: &[&str] = &["alice.testnet", "bob.testnet", "carol.testnet", "dave.testnet"];

fn account() -> impl Strategy<Value = AccountId> {
    prop::sample::select(ACCOUNTS).prop_map(AccountId::from)
}

fn message() -> impl Strategy<Value = Message> {
    (account(), account(), "[a-z ]{0,8}").prop_map(|(sender, receiver, content)| Message {
        sender,
        receiver,
        content,
        timestamp: 0,
    })
}

/// Generate random printable characters for input.
fn printable_char() -> impl Strategy<Value = char> {
    prop::char::range(' ', '~')
}

/// Generate random key inputs.
fn key_strategy() -> impl Strategy<Value = KeyInput> {
    prop_oneof![
        4 => printable_char().prop_map(KeyInput::Char),
        1 => Just(KeyInput::Enter),
        1 => Just(KeyInput::Backspace),
        1 => Just(KeyInput::Tab),
        1 => Just(KeyInput::Up),
        1 => Just(KeyInput::Down),
        1 => Just(KeyInput::Left),
        1 => Just(KeyInput::Right),
    ]
}

/// Generate random app events, local and remote.
fn event_strategy() -> impl Strategy<Value = AppEvent> {
    prop_oneof![
        6 => key_strategy().prop_map(AppEvent::Key),
        1 => Just(AppEvent::Tick),
        1 => (1u16..200, 1u16..100).prop_map(|(c, r)| AppEvent::Resize(c, r)),
        1 => prop::option::of(account()).prop_map(|account| AppEvent::Initialized { account }),
        1 => account().prop_map(|account| AppEvent::SignedIn { account }),
        1 => Just(AppEvent::SignedOut),
        2 => prop::sample::subsequence(ACCOUNTS, 0..=ACCOUNTS.len()).prop_map(|ids| {
            AppEvent::UsersLoaded {
                users: ids.into_iter().map(|id| User::from_listing(id.into(), "")).collect(),
            }
        }),
        3 => (account(), prop::collection::vec(message(), 0..8))
            .prop_map(|(peer, messages)| AppEvent::MessagesLoaded { peer, messages }),
        2 => (account(), "[a-z]{1,6}", any::<u64>()).prop_map(|(receiver, content, timestamp)| {
            AppEvent::MessageSent { receiver, content, timestamp }
        }),
        1 => account().prop_map(|receiver| AppEvent::SendFailed {
            receiver,
            error: ClientError::SessionExpired { message: "no matching key pair found".into() },
        }),
    ]
}

fn snapshot(app: &App) -> SystemSnapshot {
    SystemSnapshot::single(ViewSnapshot::from_app("prop", app))
}

/// Alice signed in with every other account listed and bob selected.
fn chatting_app() -> App {
    let mut app = App::new();
    let _ = app.start();
    let _ = app.handle(AppEvent::Initialized { account: Some("alice.testnet".into()) });
    let _ = app.handle(AppEvent::UsersLoaded {
        users: ACCOUNTS.iter().map(|id| User::from_listing((*id).into(), "")).collect(),
    });
    let _ = app.select_peer(&"bob.testnet".into());
    app
}

proptest! {
    /// App invariants hold under arbitrary event sequences.
    #[test]
    fn prop_app_invariants_hold(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut app = App::new();
        let _ = app.start();
        let invariants = InvariantRegistry::standard();

        for event in events {
            let _ = app.handle(event.clone());

            prop_assert!(
                invariants.check_all(&snapshot(&app)).is_ok(),
                "Invariant violated after {:?}", event
            );
        }
    }

    /// Loaded threads never contain a message outside the selected pair,
    /// whatever the contract returns.
    #[test]
    fn prop_loaded_thread_matches_pair(messages in prop::collection::vec(message(), 0..20)) {
        let mut app = chatting_app();
        let _ = app.handle(AppEvent::MessagesLoaded { peer: "bob.testnet".into(), messages });

        let alice = AccountId::from("alice.testnet");
        let bob = AccountId::from("bob.testnet");
        prop_assert!(app.thread().iter().all(|m| m.message.is_between(&alice, &bob)));
    }

    /// An accepted send clears the input and appends exactly one local entry.
    #[test]
    fn prop_accepted_send_appends_once(content in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,30}") {
        let mut app = chatting_app();
        let before = app.thread().len();
        app.set_input(content.clone());

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));
        prop_assert!(actions.contains(&AppAction::SendMessage {
            receiver: "bob.testnet".into(),
            content: content.clone(),
        }), "accepted send must emit SendMessage");

        let _ = app.handle(AppEvent::MessageSent {
            receiver: "bob.testnet".into(),
            content,
            timestamp: 1,
        });

        prop_assert!(app.input_buffer().is_empty());
        prop_assert_eq!(app.thread().len(), before + 1);
        prop_assert_eq!(
            app.thread().iter().filter(|m| m.delivery == Delivery::Optimistic).count(),
            1
        );
    }

    /// While signed out, no input sequence produces a remote write.
    #[test]
    fn prop_signed_out_never_writes(keys in prop::collection::vec(key_strategy(), 0..80)) {
        let mut app = App::new();
        let _ = app.start();
        let _ = app.handle(AppEvent::Initialized { account: None });

        for key in keys {
            let actions = app.handle(AppEvent::Key(key));
            prop_assert!(!actions.iter().any(|a| matches!(
                a,
                AppAction::SendMessage { .. } | AppAction::RegisterUsername { .. }
            )), "signed-out input must not produce a remote write");
        }
    }

    /// Input buffer operations are consistent.
    #[test]
    fn prop_cursor_within_bounds(keys in prop::collection::vec(key_strategy(), 0..100)) {
        let mut app = App::new();

        for key in keys {
            let _ = app.handle(AppEvent::Key(key));
            prop_assert!(app.input_cursor() <= app.input_buffer().chars().count());
        }
    }
}
