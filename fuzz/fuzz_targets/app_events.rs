//! Fuzz target for the App state machine
//!
//! Drives the view with arbitrary keys and remote results, including results
//! for peers that are no longer selected and sessions that already ended.
//!
//! # Invariants
//!
//! - The open thread only ever holds messages between the signed-in account
//!   and the selected peer
//! - The selected peer is always a listed contact, never the account itself
//! - Signed out means an empty view
//! - The compose cursor stays within the buffer

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sociogram_app::{App, AppEvent, KeyInput};
use sociogram_client::{AccountId, ClientError, Message, RejectionKind, User};

const ACCOUNTS: [&str; 4] = ["alice.testnet", "bob.testnet", "carol.testnet", "dave.testnet"];

#[derive(Debug, Clone, Copy, Arbitrary)]
struct Account(u8);

impl Account {
    fn id(self) -> AccountId {
        AccountId::from(ACCOUNTS[usize::from(self.0) % ACCOUNTS.len()])
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, Arbitrary)]
enum Input {
    Key(Key),
    Line(String),
    Initialized(Option<Account>),
    SignedIn(Account),
    SignedOut,
    UsersLoaded(Vec<Account>),
    MessagesLoaded { peer: Account, messages: Vec<(Account, Account, String)> },
    MessageSent { receiver: Account, content: String },
    SendFailed { receiver: Account, expired: bool },
    RegisterFailed { taken: bool },
}

fn key(key: Key) -> KeyInput {
    match key {
        Key::Char(c) => KeyInput::Char(c),
        Key::Enter => KeyInput::Enter,
        Key::Backspace => KeyInput::Backspace,
        Key::Delete => KeyInput::Delete,
        Key::Tab => KeyInput::Tab,
        Key::Left => KeyInput::Left,
        Key::Right => KeyInput::Right,
        Key::Up => KeyInput::Up,
        Key::Down => KeyInput::Down,
        Key::Home => KeyInput::Home,
        Key::End => KeyInput::End,
    }
}

fn rejected(kind: RejectionKind) -> ClientError {
    ClientError::RemoteRejected { message: "rejected".into(), kind }
}

fn apply(app: &mut App, input: Input) {
    let _ = match input {
        Input::Key(k) => app.handle(AppEvent::Key(key(k))),
        Input::Line(line) => {
            app.set_input(line);
            app.handle(AppEvent::Key(KeyInput::Enter))
        },
        Input::Initialized(account) => {
            app.handle(AppEvent::Initialized { account: account.map(Account::id) })
        },
        Input::SignedIn(account) => app.handle(AppEvent::SignedIn { account: account.id() }),
        Input::SignedOut => app.handle(AppEvent::SignedOut),
        Input::UsersLoaded(accounts) => app.handle(AppEvent::UsersLoaded {
            users: accounts.into_iter().map(|a| User::from_listing(a.id(), "")).collect(),
        }),
        Input::MessagesLoaded { peer, messages } => app.handle(AppEvent::MessagesLoaded {
            peer: peer.id(),
            messages: messages
                .into_iter()
                .map(|(sender, receiver, content)| Message {
                    sender: sender.id(),
                    receiver: receiver.id(),
                    content,
                    timestamp: 0,
                })
                .collect(),
        }),
        Input::MessageSent { receiver, content } => {
            app.handle(AppEvent::MessageSent { receiver: receiver.id(), content, timestamp: 1 })
        },
        Input::SendFailed { receiver, expired } => {
            let error = if expired {
                ClientError::SessionExpired { message: "no matching key pair found".into() }
            } else {
                rejected(RejectionKind::ReceiverNotRegistered)
            };
            app.handle(AppEvent::SendFailed { receiver: receiver.id(), error })
        },
        Input::RegisterFailed { taken } => {
            let kind = if taken { RejectionKind::AlreadyRegistered } else { RejectionKind::Other };
            app.handle(AppEvent::RegisterFailed { error: rejected(kind) })
        },
    };
}

fn check(app: &App) {
    assert!(app.input_cursor() <= app.input_buffer().chars().count());

    let Some(account) = app.account() else {
        assert!(app.contacts().is_empty());
        assert!(app.selected_peer().is_none());
        assert!(app.thread().is_empty());
        return;
    };

    assert!(app.contacts().iter().all(|u| &u.account_id != account));
    match app.selected_peer() {
        Some(peer) => {
            assert!(app.contacts().iter().any(|u| &u.account_id == peer));
            assert!(app.thread().iter().all(|m| m.message.is_between(account, peer)));
        },
        None => assert!(app.thread().is_empty()),
    }
}

fuzz_target!(|inputs: Vec<Input>| {
    let mut app = App::new();
    let _ = app.start();

    for input in inputs {
        apply(&mut app, input);
        check(&app);
    }
});
