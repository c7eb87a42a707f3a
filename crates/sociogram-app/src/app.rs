//! Application state machine.
//!
//! [`App`] manages the interactive state of the chat view completely
//! decoupled from I/O: it consumes [`crate::AppEvent`] inputs and produces
//! [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Session view state, the contact listing and the selected peer.
//! - The open thread: filtered by the unordered `{me, peer}` pair, replaced
//!   wholesale on every refetch, with optimistic entries appended after an
//!   accepted send.
//! - In-flight bookkeeping: at most one remote call per `(action, target)`.
//! - The compose buffer and slash commands.

use std::collections::HashSet;

use sociogram_client::{AccountId, ClientError, Message, RejectionKind, User, thread_between};

use crate::{
    AppAction, AppEvent, KeyInput,
    commands::{self, Command},
    input::ComposeBuffer,
    state::{AfterConnect, Delivery, InFlight, SessionState, ThreadMessage},
};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Session as last reported by the bridge.
    session: SessionState,
    /// Registered users other than the signed-in account, in contract order.
    contacts: Vec<User>,
    /// Whether the signed-in account appeared in the last listing.
    self_registered: bool,
    /// Peer whose thread is open. Always one of `contacts`.
    selected: Option<AccountId>,
    /// Thread with `selected`.
    thread: Vec<ThreadMessage>,
    /// Remote calls awaiting a result.
    in_flight: HashSet<InFlight>,
    /// Peers whose thread must be refetched once the current fetch returns.
    refetch_queued: HashSet<AccountId>,
    /// Work deferred until the connection is established.
    after_connect: Option<AfterConnect>,
    /// Compose line.
    input: ComposeBuffer,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
    /// Sign-in help that outlives status updates.
    sign_in_notice: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create a new App in disconnected state.
    pub fn new() -> Self {
        Self {
            session: SessionState::Disconnected,
            contacts: Vec::new(),
            self_registered: false,
            selected: None,
            thread: Vec::new(),
            in_flight: HashSet::new(),
            refetch_queued: HashSet::new(),
            after_connect: None,
            input: ComposeBuffer::default(),
            terminal_size: (80, 24),
            status_message: None,
            sign_in_notice: None,
        }
    }

    /// Process the wallet redirect `redirect` as soon as the client connects.
    #[must_use]
    pub fn with_callback(mut self, redirect: impl Into<String>) -> Self {
        self.after_connect = Some(AfterConnect::CompleteSignIn { redirect: redirect.into() });
        self
    }

    /// Show `notice` whenever the user is not signed in, e.g. how to
    /// approve access in an offline wallet.
    #[must_use]
    pub fn with_sign_in_notice(mut self, notice: impl Into<String>) -> Self {
        self.sign_in_notice = Some(notice.into());
        self
    }

    /// Actions to run once at startup.
    pub fn start(&mut self) -> Vec<AppAction> {
        self.session = SessionState::Connecting;
        vec![AppAction::Initialize, AppAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::Initialized { account } => self.on_initialized(account),
            AppEvent::ConnectFailed { message } => {
                self.session = SessionState::Disconnected;
                self.after_connect = None;
                self.status_message =
                    Some(format!("Connection failed: {message}. /signin to retry"));
                vec![AppAction::Render]
            },
            AppEvent::SignInStarted { url } => {
                self.reset_view();
                self.session = SessionState::AwaitingRedirect { url: url.clone() };
                self.status_message =
                    Some("Approve access in the wallet, then /callback <redirect-url>".into());
                vec![AppAction::OpenWallet { url }, AppAction::Render]
            },
            AppEvent::SignedIn { account } => {
                let mut actions = self.enter_session(account);
                actions.push(AppAction::Render);
                actions
            },
            AppEvent::SignInFailed { message } => {
                self.in_flight.remove(&InFlight::SignIn);
                self.status_message = Some(format!("Sign-in failed: {message}"));
                vec![AppAction::Render]
            },
            AppEvent::SignedOut => {
                self.reset_view();
                self.input.clear();
                self.session = SessionState::SignedOut;
                self.status_message = Some("Signed out".into());
                vec![AppAction::Render]
            },
            AppEvent::UsersLoaded { users } => self.on_users_loaded(users),
            AppEvent::MessagesLoaded { peer, messages } => self.on_messages_loaded(peer, &messages),
            AppEvent::MessageSent { receiver, content, timestamp } => {
                self.on_message_sent(receiver, content, timestamp)
            },
            AppEvent::SendFailed { receiver, error } => self.on_send_failed(receiver, &error),
            AppEvent::Registered { username } => {
                self.in_flight.remove(&InFlight::Register);
                if self.session.account().is_none() {
                    return vec![];
                }
                self.self_registered = true;
                self.status_message = Some(format!("Registered as {username}"));
                let mut actions = self.load_users();
                actions.push(AppAction::Render);
                actions
            },
            AppEvent::RegisterFailed { error } => self.on_register_failed(&error),
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Start the wallet sign-in, connecting first if needed.
    pub fn request_sign_in(&mut self) -> Vec<AppAction> {
        match self.session {
            SessionState::Disconnected => {
                self.after_connect = Some(AfterConnect::SignIn);
                self.session = SessionState::Connecting;
                vec![AppAction::Initialize]
            },
            SessionState::Connecting => {
                self.after_connect = Some(AfterConnect::SignIn);
                vec![]
            },
            _ => {
                if self.in_flight.insert(InFlight::SignIn) {
                    vec![AppAction::RequestSignIn]
                } else {
                    vec![]
                }
            },
        }
    }

    /// Process wallet redirect parameters, connecting first if needed.
    pub fn complete_sign_in(&mut self, redirect: String) -> Vec<AppAction> {
        match self.session {
            SessionState::Disconnected => {
                self.after_connect = Some(AfterConnect::CompleteSignIn { redirect });
                self.session = SessionState::Connecting;
                vec![AppAction::Initialize]
            },
            SessionState::Connecting => {
                self.after_connect = Some(AfterConnect::CompleteSignIn { redirect });
                vec![]
            },
            _ => vec![AppAction::CompleteSignIn { redirect }],
        }
    }

    /// End the session. The view resets when the bridge confirms.
    pub fn sign_out(&mut self) -> Vec<AppAction> {
        if !self.session.is_connected() {
            self.status_message = Some("Not connected".into());
            return vec![AppAction::Render];
        }
        vec![AppAction::SignOut, AppAction::Render]
    }

    /// Register `username` for the signed-in account.
    pub fn register(&mut self, username: &str) -> Vec<AppAction> {
        let username = username.trim();
        if self.session.account().is_none() {
            self.status_message = Some("Sign in before registering".into());
            let mut actions = self.request_sign_in();
            actions.push(AppAction::Render);
            return actions;
        }
        if username.is_empty() {
            self.status_message = Some("usage: /register <name>".into());
            return vec![AppAction::Render];
        }
        if self.self_registered {
            self.status_message = Some("You are already registered".into());
            let mut actions = self.load_users();
            actions.push(AppAction::Render);
            return actions;
        }
        if !self.in_flight.insert(InFlight::Register) {
            return vec![];
        }

        self.status_message = Some(format!("Registering {username}..."));
        vec![AppAction::RegisterUsername { username: username.to_owned() }, AppAction::Render]
    }

    /// Send `content` to the selected peer.
    ///
    /// Whitespace-only content is dropped locally. While signed out no remote
    /// call is made and sign-in is requested instead. A second send to the
    /// same peer while one is pending is ignored.
    pub fn send_message(&mut self, content: String) -> Vec<AppAction> {
        if content.trim().is_empty() {
            return vec![];
        }
        if self.session.account().is_none() {
            self.status_message = Some("Sign in to send messages".into());
            let mut actions = self.request_sign_in();
            actions.push(AppAction::Render);
            return actions;
        }
        let Some(receiver) = self.selected.clone() else {
            self.status_message = Some("Select a contact first (Tab or /select <account>)".into());
            return vec![AppAction::Render];
        };
        if !self.in_flight.insert(InFlight::Send { receiver: receiver.clone() }) {
            return vec![];
        }

        vec![AppAction::SendMessage { receiver, content }, AppAction::Render]
    }

    /// Open the thread with `peer`, one of the listed contacts.
    ///
    /// Selecting triggers a full refetch. Re-selecting the open peer keeps
    /// its thread on screen and refetches it, coalescing with any fetch
    /// already in flight.
    pub fn select_peer(&mut self, peer: &AccountId) -> Vec<AppAction> {
        if self.session.account().is_none() {
            self.status_message = Some("Sign in to see contacts".into());
            return vec![AppAction::Render];
        }
        if !self.contacts.iter().any(|user| &user.account_id == peer) {
            self.status_message = Some(format!("Unknown contact {peer}"));
            return vec![AppAction::Render];
        }
        if self.selected.as_ref() != Some(peer) {
            self.selected = Some(peer.clone());
            self.thread.clear();
        }
        let mut actions = self.load_thread();
        actions.push(AppAction::Render);
        actions
    }

    /// Reload contacts and the open thread.
    pub fn refresh(&mut self) -> Vec<AppAction> {
        let mut actions = self.load_users();
        actions.extend(self.load_thread());
        actions.push(AppAction::Render);
        actions
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Replace the compose line.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input.set(text);
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<AppAction> {
        match key {
            KeyInput::Enter => self.submit(),
            KeyInput::Tab | KeyInput::Down => self.cycle_contact(true),
            KeyInput::Up => self.cycle_contact(false),
            KeyInput::Esc => self.quit(),
            other => {
                if self.input.edit(other) {
                    vec![AppAction::Render]
                } else {
                    vec![]
                }
            },
        }
    }

    /// Enter: commands run and clear the line; message text stays until the
    /// send is accepted.
    fn submit(&mut self) -> Vec<AppAction> {
        if self.input.is_empty() {
            return vec![];
        }

        match commands::parse(self.input.text()) {
            Command::Message { content } => self.send_message(content),
            command => {
                self.input.clear();
                self.run_command(command)
            },
        }
    }

    fn run_command(&mut self, command: Command) -> Vec<AppAction> {
        match command {
            Command::SignIn => {
                self.status_message = Some("Opening wallet...".into());
                let mut actions = self.request_sign_in();
                actions.push(AppAction::Render);
                actions
            },
            Command::Callback { redirect } => {
                let mut actions = self.complete_sign_in(redirect);
                actions.push(AppAction::Render);
                actions
            },
            Command::SignOut => self.sign_out(),
            Command::Register { username } => self.register(&username),
            Command::Refresh => self.refresh(),
            Command::Users => {
                let mut actions = self.load_users();
                actions.push(AppAction::Render);
                actions
            },
            Command::Select { account } => self.select_peer(&account),
            Command::Help => {
                self.status_message = Some(commands::HELP.into());
                vec![AppAction::Render]
            },
            Command::Quit => self.quit(),
            Command::Message { content } => self.send_message(content),
            Command::Unknown { input } => {
                self.status_message = Some(format!("Unknown command: /{input}"));
                vec![AppAction::Render]
            },
            Command::InvalidArgs { command, error } => {
                self.status_message = Some(format!("/{command}: {error}"));
                vec![AppAction::Render]
            },
        }
    }

    /// Select the next (or previous) contact, wrapping around.
    fn cycle_contact(&mut self, forward: bool) -> Vec<AppAction> {
        let len = self.contacts.len();
        if len == 0 {
            return vec![];
        }

        let current = self
            .selected
            .as_ref()
            .and_then(|peer| self.contacts.iter().position(|user| &user.account_id == peer));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(idx), true) => (idx + 1) % len,
            (Some(idx), false) => (idx + len - 1) % len,
        };

        match self.contacts.get(next).map(|user| user.account_id.clone()) {
            Some(peer) => self.select_peer(&peer),
            None => vec![],
        }
    }

    fn on_initialized(&mut self, account: Option<AccountId>) -> Vec<AppAction> {
        let mut actions = match account {
            Some(account) => self.enter_session(account),
            None => {
                self.reset_view();
                self.session = SessionState::SignedOut;
                self.status_message = Some("Not signed in. /signin to connect a wallet".into());
                vec![]
            },
        };

        match self.after_connect.take() {
            Some(AfterConnect::SignIn) => actions.extend(self.request_sign_in()),
            Some(AfterConnect::CompleteSignIn { redirect }) => {
                actions.extend(self.complete_sign_in(redirect));
            },
            None => {},
        }
        actions.push(AppAction::Render);
        actions
    }

    fn enter_session(&mut self, account: AccountId) -> Vec<AppAction> {
        if self.session.account() != Some(&account) {
            self.reset_view();
        }
        self.status_message = Some(format!("Signed in as {account}"));
        self.session = SessionState::SignedIn { account_id: account };
        self.load_users()
    }

    fn on_users_loaded(&mut self, users: Vec<User>) -> Vec<AppAction> {
        self.in_flight.remove(&InFlight::LoadUsers);
        let Some(me) = self.session.account().cloned() else {
            return vec![];
        };

        self.self_registered = users.iter().any(|user| user.account_id == me);
        self.contacts = users.into_iter().filter(|user| user.account_id != me).collect();

        let selection_gone = self
            .selected
            .as_ref()
            .is_some_and(|peer| !self.contacts.iter().any(|user| &user.account_id == peer));
        if selection_gone {
            self.selected = None;
            self.thread.clear();
        }

        if !self.self_registered {
            self.status_message = Some("Not registered yet. /register <name> to join".into());
        }
        vec![AppAction::Render]
    }

    fn on_messages_loaded(&mut self, peer: AccountId, messages: &[Message]) -> Vec<AppAction> {
        self.in_flight.remove(&InFlight::LoadMessages { peer: peer.clone() });
        let requeued = self.refetch_queued.remove(&peer);

        let Some(me) = self.session.account().cloned() else {
            return vec![];
        };
        if self.selected.as_ref() != Some(&peer) {
            tracing::debug!(%peer, "discarding messages for a peer no longer selected");
            return vec![];
        }

        // A queued refetch means this response may predate an accepted
        // send; its optimistic entry stays until the newer fetch lands.
        let unconfirmed: Vec<_> = if requeued {
            self.thread.drain(..).filter(|m| m.delivery == Delivery::Optimistic).collect()
        } else {
            vec![]
        };
        self.thread = thread_between(messages, &me, &peer)
            .into_iter()
            .map(ThreadMessage::confirmed)
            .chain(unconfirmed)
            .collect();

        let mut actions = if requeued { self.load_thread() } else { vec![] };
        actions.push(AppAction::Render);
        actions
    }

    fn on_message_sent(
        &mut self,
        receiver: AccountId,
        content: String,
        timestamp: u64,
    ) -> Vec<AppAction> {
        self.in_flight.remove(&InFlight::Send { receiver: receiver.clone() });
        let Some(me) = self.session.account().cloned() else {
            return vec![];
        };

        if self.input.text() == content {
            self.input.clear();
        }
        if self.selected.as_ref() == Some(&receiver) {
            self.thread.push(ThreadMessage::optimistic(Message {
                sender: me,
                receiver,
                content,
                timestamp,
            }));
        }

        let mut actions = self.load_thread();
        actions.push(AppAction::Render);
        actions
    }

    fn on_send_failed(&mut self, receiver: AccountId, error: &ClientError) -> Vec<AppAction> {
        self.in_flight.remove(&InFlight::Send { receiver });
        if self.session.account().is_none() {
            return vec![];
        }

        if error.requires_sign_in() {
            self.status_message = Some("Session expired. Sign in again to send".into());
            let mut actions = self.request_sign_in();
            actions.push(AppAction::Render);
            return actions;
        }
        self.status_message = Some(format!("Send failed: {error}"));
        vec![AppAction::Render]
    }

    fn on_register_failed(&mut self, error: &ClientError) -> Vec<AppAction> {
        self.in_flight.remove(&InFlight::Register);
        if self.session.account().is_none() {
            return vec![];
        }

        if error.requires_sign_in() {
            self.status_message = Some("Session expired. Sign in again to register".into());
            let mut actions = self.request_sign_in();
            actions.push(AppAction::Render);
            return actions;
        }

        let mut actions = if error.rejection_kind() == Some(RejectionKind::AlreadyRegistered) {
            self.status_message = Some("Name taken: this account is already registered".into());
            self.load_users()
        } else {
            self.status_message = Some(format!("Registration failed: {error}"));
            vec![]
        };
        actions.push(AppAction::Render);
        actions
    }

    fn load_users(&mut self) -> Vec<AppAction> {
        if self.session.account().is_none() || !self.in_flight.insert(InFlight::LoadUsers) {
            return vec![];
        }
        vec![AppAction::LoadUsers]
    }

    /// Refetch the open thread, or queue a refetch behind the pending one.
    fn load_thread(&mut self) -> Vec<AppAction> {
        let (Some(me), Some(peer)) = (self.session.account().cloned(), self.selected.clone())
        else {
            return vec![];
        };
        if !self.in_flight.insert(InFlight::LoadMessages { peer: peer.clone() }) {
            self.refetch_queued.insert(peer);
            return vec![];
        }
        vec![AppAction::LoadMessages { account: me, peer }]
    }

    /// Drop everything scoped to the session. The compose line survives.
    fn reset_view(&mut self) {
        self.contacts.clear();
        self.self_registered = false;
        self.selected = None;
        self.thread.clear();
        self.in_flight.clear();
        self.refetch_queued.clear();
    }

    /// Session state.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Signed-in account. `None` if signed out.
    pub fn account(&self) -> Option<&AccountId> {
        self.session.account()
    }

    /// Contacts (registered users other than the signed-in account).
    pub fn contacts(&self) -> &[User] {
        &self.contacts
    }

    /// Whether the signed-in account is registered.
    pub fn is_registered(&self) -> bool {
        self.self_registered
    }

    /// Selected peer. `None` if no thread is open.
    pub fn selected_peer(&self) -> Option<&AccountId> {
        self.selected.as_ref()
    }

    /// Contact entry of the selected peer.
    pub fn selected_user(&self) -> Option<&User> {
        let peer = self.selected.as_ref()?;
        self.contacts.iter().find(|user| &user.account_id == peer)
    }

    /// Open thread.
    pub fn thread(&self) -> &[ThreadMessage] {
        &self.thread
    }

    /// Whether `call` is awaiting a result.
    pub fn is_pending(&self, call: &InFlight) -> bool {
        self.in_flight.contains(call)
    }

    /// All pending remote calls.
    pub fn in_flight(&self) -> impl Iterator<Item = &InFlight> {
        self.in_flight.iter()
    }

    /// Whether a send to the selected peer is pending.
    pub fn is_sending(&self) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|peer| self.is_pending(&InFlight::Send { receiver: peer.clone() }))
    }

    /// Compose line contents.
    pub fn input_buffer(&self) -> &str {
        self.input.text()
    }

    /// Cursor position in the compose line, in characters.
    pub fn input_cursor(&self) -> usize {
        self.input.cursor()
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Sign-in help set at construction.
    pub fn sign_in_notice(&self) -> Option<&str> {
        self.sign_in_notice.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from("alice.testnet")
    }

    fn bob() -> AccountId {
        AccountId::from("bob.testnet")
    }

    fn msg(sender: &str, receiver: &str, content: &str) -> Message {
        Message { sender: sender.into(), receiver: receiver.into(), content: content.into(), timestamp: 0 }
    }

    /// Alice signed in, contacts listed, bob selected and his thread loaded.
    fn chatting_app() -> App {
        let mut app = App::new();
        let _ = app.start();
        let _ = app.handle(AppEvent::Initialized { account: Some(alice()) });
        let _ = app.handle(AppEvent::UsersLoaded {
            users: vec![
                User::from_listing(alice(), "Alice"),
                User::from_listing(bob(), "Bob"),
                User::from_listing("carol.testnet".into(), ""),
            ],
        });
        let _ = app.select_peer(&bob());
        let _ = app.handle(AppEvent::MessagesLoaded {
            peer: bob(),
            messages: vec![msg("alice.testnet", "bob.testnet", "hi")],
        });
        app
    }

    #[test]
    fn start_initializes_client() {
        let mut app = App::new();
        assert_eq!(app.start(), vec![AppAction::Initialize, AppAction::Render]);
        assert_eq!(app.session(), &SessionState::Connecting);
    }

    #[test]
    fn sign_in_notice_survives_status_updates() {
        let mut app = App::new().with_sign_in_notice("/callback ?account_id=dave.testnet");
        let _ = app.start();
        let _ = app.handle(AppEvent::Initialized { account: None });
        let _ = app.handle(AppEvent::SignInStarted { url: "sim://wallet/login/".into() });

        assert_ne!(app.status_message(), Some("/callback ?account_id=dave.testnet"));
        assert_eq!(app.sign_in_notice(), Some("/callback ?account_id=dave.testnet"));
    }

    #[test]
    fn restored_session_loads_contacts() {
        let mut app = App::new();
        let _ = app.start();
        let actions = app.handle(AppEvent::Initialized { account: Some(alice()) });

        assert_eq!(actions, vec![AppAction::LoadUsers, AppAction::Render]);
        assert_eq!(app.account(), Some(&alice()));
    }

    #[test]
    fn contacts_exclude_signed_in_account() {
        let app = chatting_app();
        let ids: Vec<_> = app.contacts().iter().map(|u| u.account_id.as_str()).collect();

        assert_eq!(ids, vec!["bob.testnet", "carol.testnet"]);
        assert!(app.is_registered());
        assert_eq!(app.contacts()[1].display_name, "carol");
    }

    #[test]
    fn selecting_refetches_and_reselecting_coalesces() {
        let mut app = chatting_app();
        let carol = AccountId::from("carol.testnet");

        let actions = app.select_peer(&carol);
        assert_eq!(actions, vec![
            AppAction::LoadMessages { account: alice(), peer: carol.clone() },
            AppAction::Render
        ]);
        assert!(app.thread().is_empty());

        // Fetch still in flight: the second selection only queues a refetch.
        assert_eq!(app.select_peer(&carol), vec![AppAction::Render]);
        let actions = app.handle(AppEvent::MessagesLoaded {
            peer: carol.clone(),
            messages: vec![msg("carol.testnet", "alice.testnet", "hey")],
        });
        assert!(actions.contains(&AppAction::LoadMessages { account: alice(), peer: carol.clone() }));
    }

    #[test]
    fn reselecting_open_peer_keeps_thread_and_refetches() {
        let mut app = chatting_app();
        let _ = app.handle(AppEvent::MessagesLoaded {
            peer: bob(),
            messages: vec![msg("bob.testnet", "alice.testnet", "yo")],
        });

        let actions = app.select_peer(&bob());

        assert_eq!(actions, vec![
            AppAction::LoadMessages { account: alice(), peer: bob() },
            AppAction::Render
        ]);
        assert_eq!(app.thread().len(), 1);
        assert_eq!(app.selected_peer(), Some(&bob()));
    }

    #[test]
    fn selecting_unknown_account_is_refused() {
        let mut app = chatting_app();
        let actions = app.select_peer(&"mallory.testnet".into());

        assert_eq!(actions, vec![AppAction::Render]);
        assert_eq!(app.selected_peer(), Some(&bob()));
    }

    #[test]
    fn messages_for_deselected_peer_are_discarded() {
        let mut app = chatting_app();
        let _ = app.select_peer(&"carol.testnet".into());

        let actions = app.handle(AppEvent::MessagesLoaded {
            peer: bob(),
            messages: vec![msg("bob.testnet", "alice.testnet", "late")],
        });

        assert!(actions.is_empty());
        assert!(app.thread().is_empty());
    }

    #[test]
    fn loaded_thread_is_filtered_by_pair() {
        let mut app = chatting_app();
        let _ = app.refresh();
        let _ = app.handle(AppEvent::MessagesLoaded {
            peer: bob(),
            messages: vec![
                msg("alice.testnet", "bob.testnet", "hi"),
                msg("carol.testnet", "bob.testnet", "hey"),
                msg("alice.testnet", "carol.testnet", "psst"),
                msg("bob.testnet", "alice.testnet", "yo"),
            ],
        });

        let contents: Vec<_> = app.thread().iter().map(|m| m.message.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "yo"]);
    }

    #[test]
    fn accepted_send_appends_one_optimistic_message_and_clears_input() {
        let mut app = chatting_app();
        app.set_input("hello bob");

        let actions = app.handle(AppEvent::Key(KeyInput::Enter));
        assert_eq!(actions, vec![
            AppAction::SendMessage { receiver: bob(), content: "hello bob".into() },
            AppAction::Render
        ]);
        assert!(app.is_sending());
        assert_eq!(app.input_buffer(), "hello bob");

        let actions = app.handle(AppEvent::MessageSent {
            receiver: bob(),
            content: "hello bob".into(),
            timestamp: 42,
        });

        assert!(app.input_buffer().is_empty());
        assert!(!app.is_sending());
        assert_eq!(app.thread().len(), 2);
        let last = &app.thread()[1];
        assert_eq!(last.delivery, Delivery::Optimistic);
        assert_eq!(last.message.timestamp, 42);
        assert!(actions.contains(&AppAction::LoadMessages { account: alice(), peer: bob() }));
    }

    #[test]
    fn refetch_replaces_optimistic_entry() {
        let mut app = chatting_app();
        let _ = app.send_message("hello".into());
        let _ = app.handle(AppEvent::MessageSent {
            receiver: bob(),
            content: "hello".into(),
            timestamp: 1,
        });
        let _ = app.handle(AppEvent::MessagesLoaded {
            peer: bob(),
            messages: vec![
                msg("alice.testnet", "bob.testnet", "hi"),
                msg("alice.testnet", "bob.testnet", "hello"),
            ],
        });

        assert_eq!(app.thread().len(), 2);
        assert!(app.thread().iter().all(|m| m.delivery == Delivery::Confirmed));
    }

    #[test]
    fn stale_fetch_keeps_unconfirmed_send() {
        let mut app = chatting_app();
        let _ = app.refresh();
        let _ = app.send_message("hello".into());
        let _ = app.handle(AppEvent::MessageSent {
            receiver: bob(),
            content: "hello".into(),
            timestamp: 1,
        });

        // Issued before the send landed, so it lacks "hello".
        let actions = app.handle(AppEvent::MessagesLoaded {
            peer: bob(),
            messages: vec![msg("alice.testnet", "bob.testnet", "hi")],
        });
        assert!(actions.contains(&AppAction::LoadMessages { account: alice(), peer: bob() }));
        let contents: Vec<_> = app.thread().iter().map(|m| m.message.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello"]);
        assert_eq!(app.thread()[1].delivery, Delivery::Optimistic);

        let _ = app.handle(AppEvent::MessagesLoaded {
            peer: bob(),
            messages: vec![
                msg("alice.testnet", "bob.testnet", "hi"),
                msg("alice.testnet", "bob.testnet", "hello"),
            ],
        });
        assert_eq!(app.thread().len(), 2);
        assert!(app.thread().iter().all(|m| m.delivery == Delivery::Confirmed));
    }

    #[test]
    fn resubmitting_while_pending_is_ignored() {
        let mut app = chatting_app();
        app.set_input("again");

        let first = app.handle(AppEvent::Key(KeyInput::Enter));
        let second = app.handle(AppEvent::Key(KeyInput::Enter));

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
    }

    #[test]
    fn whitespace_message_is_dropped_locally() {
        let mut app = chatting_app();
        assert!(app.send_message("   ".into()).is_empty());
    }

    #[test]
    fn sending_while_signed_out_requests_sign_in() {
        let mut app = App::new();
        let _ = app.start();
        let _ = app.handle(AppEvent::Initialized { account: None });

        let actions = app.send_message("hello".into());

        assert_eq!(actions, vec![AppAction::RequestSignIn, AppAction::Render]);
        assert!(!actions.iter().any(|a| matches!(a, AppAction::SendMessage { .. })));
    }

    #[test]
    fn expired_session_on_send_requests_sign_in() {
        let mut app = chatting_app();
        let _ = app.send_message("hello".into());

        let actions = app.handle(AppEvent::SendFailed {
            receiver: bob(),
            error: ClientError::SessionExpired { message: "no matching key pair found".into() },
        });

        assert!(actions.contains(&AppAction::RequestSignIn));
        assert!(!app.is_sending());
    }

    #[test]
    fn other_send_failure_surfaces_message() {
        let mut app = chatting_app();
        let _ = app.send_message("hello".into());
        let _ = app.handle(AppEvent::SendFailed {
            receiver: bob(),
            error: ClientError::RemoteRejected {
                message: "Smart contract panicked: Receiver not registered".into(),
                kind: RejectionKind::ReceiverNotRegistered,
            },
        });

        assert_eq!(
            app.status_message(),
            Some("Send failed: Smart contract panicked: Receiver not registered")
        );
        assert_eq!(app.thread().len(), 1);
    }

    #[test]
    fn already_registered_rejection_reports_and_refreshes() {
        let mut app = App::new();
        let _ = app.start();
        let _ = app.handle(AppEvent::Initialized { account: Some(bob()) });
        let _ = app.handle(AppEvent::UsersLoaded { users: vec![] });

        let actions = app.register("bob");
        assert_eq!(actions, vec![
            AppAction::RegisterUsername { username: "bob".into() },
            AppAction::Render
        ]);

        let actions = app.handle(AppEvent::RegisterFailed {
            error: ClientError::RemoteRejected {
                message: "Smart contract panicked: User already registered".into(),
                kind: RejectionKind::AlreadyRegistered,
            },
        });

        assert!(app.status_message().is_some_and(|s| s.contains("already registered")));
        assert!(actions.contains(&AppAction::LoadUsers));
        assert_eq!(app.account(), Some(&bob()));
    }

    #[test]
    fn registering_when_listed_skips_remote_call() {
        let mut app = chatting_app();
        let actions = app.register("Alice2");

        assert!(!actions.iter().any(|a| matches!(a, AppAction::RegisterUsername { .. })));
        assert_eq!(app.status_message(), Some("You are already registered"));
    }

    #[test]
    fn sign_out_resets_view() {
        let mut app = chatting_app();
        app.set_input("draft");

        assert_eq!(app.handle(AppEvent::Key(KeyInput::Char('/'))), vec![AppAction::Render]);
        app.set_input("/signout");
        let actions = app.handle(AppEvent::Key(KeyInput::Enter));
        assert_eq!(actions, vec![AppAction::SignOut, AppAction::Render]);

        let _ = app.handle(AppEvent::SignedOut);
        assert_eq!(app.session(), &SessionState::SignedOut);
        assert!(app.contacts().is_empty());
        assert!(app.selected_peer().is_none());
        assert!(app.thread().is_empty());
        assert_eq!(app.in_flight().count(), 0);
        assert!(app.input_buffer().is_empty());
    }

    #[test]
    fn results_after_sign_out_are_ignored() {
        let mut app = chatting_app();
        let _ = app.send_message("hello".into());
        let _ = app.handle(AppEvent::SignedOut);

        let actions = app.handle(AppEvent::MessageSent {
            receiver: bob(),
            content: "hello".into(),
            timestamp: 1,
        });

        assert!(actions.is_empty());
        assert!(app.thread().is_empty());
    }

    #[test]
    fn tab_and_arrows_cycle_contacts() {
        let mut app = chatting_app();

        let _ = app.handle(AppEvent::Key(KeyInput::Tab));
        assert_eq!(app.selected_peer(), Some(&AccountId::from("carol.testnet")));

        let _ = app.handle(AppEvent::Key(KeyInput::Down));
        assert_eq!(app.selected_peer(), Some(&bob()));

        let _ = app.handle(AppEvent::Key(KeyInput::Up));
        assert_eq!(app.selected_peer(), Some(&AccountId::from("carol.testnet")));
    }

    #[test]
    fn sign_in_while_disconnected_connects_first() {
        let mut app = App::new();
        let actions = app.request_sign_in();
        assert_eq!(actions, vec![AppAction::Initialize]);

        let actions = app.handle(AppEvent::Initialized { account: None });
        assert_eq!(actions, vec![AppAction::RequestSignIn, AppAction::Render]);

        let actions = app.handle(AppEvent::SignInStarted { url: "https://wallet/login/".into() });
        assert_eq!(actions, vec![
            AppAction::OpenWallet { url: "https://wallet/login/".into() },
            AppAction::Render
        ]);
    }

    #[test]
    fn callback_is_processed_after_connect() {
        let mut app = App::new().with_callback("?account_id=alice.testnet");
        let _ = app.start();

        let actions = app.handle(AppEvent::Initialized { account: None });
        assert!(actions.contains(&AppAction::CompleteSignIn {
            redirect: "?account_id=alice.testnet".into()
        }));
    }

    #[test]
    fn refetch_requested_during_fetch_is_queued() {
        let mut app = chatting_app();
        let first = app.refresh();
        assert!(first.contains(&AppAction::LoadMessages { account: alice(), peer: bob() }));

        let second = app.refresh();
        assert!(!second.iter().any(|a| matches!(a, AppAction::LoadMessages { .. })));

        let after = app.handle(AppEvent::MessagesLoaded { peer: bob(), messages: vec![] });
        assert!(after.contains(&AppAction::LoadMessages { account: alice(), peer: bob() }));
    }
}
