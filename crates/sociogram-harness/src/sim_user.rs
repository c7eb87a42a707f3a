//! A simulated user: App and Bridge driven inline.
//!
//! Unlike the full [`sociogram_app::Runtime`], a [`SimUser`] executes every
//! remote action immediately and feeds the results back until no work is
//! left. That gives tests a deterministic, step-by-step view of the state
//! machine, with invariants checked after every event. For interleavings
//! (results arriving late or out of order) use [`SimUser::run_remote`] and
//! [`SimUser::deliver`] directly.

use std::{collections::VecDeque, sync::Arc};

use sociogram_app::{App, AppAction, AppEvent, Bridge, KeyInput};
use sociogram_client::{ClientConfig, SessionClient};

use crate::{
    invariants::{InvariantRegistry, SystemSnapshot, ViewSnapshot},
    sim_env::SimEnv,
    sim_network::{SimNetwork, SimPlatform, approve_redirect},
};

/// Client type used by simulated users.
pub type SimClient = SessionClient<SimPlatform, SimEnv>;

/// One user's App and Bridge over a shared [`SimNetwork`].
pub struct SimUser {
    label: String,
    app: App,
    bridge: Bridge<SimPlatform, SimEnv>,
    network: SimNetwork,
    invariants: InvariantRegistry,
    actions: Vec<AppAction>,
    opened_urls: Vec<String>,
    quit: bool,
}

impl SimUser {
    /// User with empty wallet storage.
    pub fn new(label: &str, network: &SimNetwork, env: SimEnv) -> Self {
        Self::with_platform(label, SimPlatform::new(network), env)
    }

    /// User whose wallet storage already holds a session for `account`.
    pub fn signed_in(account: &str, network: &SimNetwork, env: SimEnv) -> Self {
        Self::with_platform(account, SimPlatform::with_session(network, account), env)
    }

    /// User over an explicit platform.
    pub fn with_platform(label: &str, platform: SimPlatform, env: SimEnv) -> Self {
        let network = platform.network().clone();
        let client = SessionClient::new(platform, env, ClientConfig::default());
        Self {
            label: label.to_owned(),
            app: App::new(),
            bridge: Bridge::new(Arc::new(client)),
            network,
            invariants: InvariantRegistry::standard(),
            actions: Vec::new(),
            opened_urls: Vec::new(),
            quit: false,
        }
    }

    /// Process the wallet redirect `redirect` once the client connects.
    #[must_use]
    pub fn with_callback(mut self, redirect: impl Into<String>) -> Self {
        self.app = App::new().with_callback(redirect);
        self
    }

    /// Start the App and run until idle.
    pub async fn start(&mut self) {
        let actions = self.app.start();
        self.dispatch(actions).await;
    }

    /// Feed an event and run until idle.
    pub async fn handle(&mut self, event: AppEvent) {
        let actions = self.app.handle(event);
        self.check("after event");
        self.dispatch(actions).await;
    }

    /// Press a key and run until idle.
    pub async fn key(&mut self, key: KeyInput) {
        self.handle(AppEvent::Key(key)).await;
    }

    /// Type `line`, press Enter, and run until idle.
    pub async fn type_line(&mut self, line: &str) {
        for c in line.chars() {
            let actions = self.app.handle(AppEvent::Key(KeyInput::Char(c)));
            self.dispatch(actions).await;
        }
        self.key(KeyInput::Enter).await;
    }

    /// Sign in through the wallet redirect as `account`.
    pub async fn sign_in_as(&mut self, account: &str) {
        self.type_line("/signin").await;
        let redirect = approve_redirect(account);
        self.type_line(&format!("/callback {redirect}")).await;
    }

    /// Execute actions, feeding results back, until no work is left.
    pub async fn dispatch(&mut self, actions: Vec<AppAction>) {
        let mut queue: VecDeque<_> = actions.into();
        while let Some(action) = queue.pop_front() {
            self.actions.push(action.clone());
            match action {
                AppAction::Render => {},
                AppAction::Quit => self.quit = true,
                AppAction::OpenWallet { url } => self.opened_urls.push(url),
                remote => {
                    for event in self.bridge.process_app_action(remote).await {
                        queue.extend(self.app.handle(event));
                        self.check("after remote result");
                    }
                },
            }
        }
    }

    /// Execute a single remote action and return its events without feeding
    /// them to the App.
    pub async fn run_remote(&self, action: AppAction) -> Vec<AppEvent> {
        self.bridge.process_app_action(action).await
    }

    /// Feed an event to the App without executing the resulting actions.
    pub fn deliver(&mut self, event: AppEvent) -> Vec<AppAction> {
        let actions = self.app.handle(event);
        self.check("after delivered event");
        actions
    }

    /// Every action the App produced through [`Self::dispatch`], in order.
    pub fn actions(&self) -> &[AppAction] {
        &self.actions
    }

    /// Forget recorded actions.
    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    /// Wallet URLs the App asked to present.
    pub fn opened_urls(&self) -> &[String] {
        &self.opened_urls
    }

    /// Whether the App asked to quit.
    pub fn has_quit(&self) -> bool {
        self.quit
    }

    /// The App.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The App, mutably (for direct API calls in tests).
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// The shared client.
    pub fn client(&self) -> &Arc<SimClient> {
        self.bridge.client()
    }

    /// The shared network.
    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    /// Capture this user's view.
    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot::from_app(self.label.clone(), &self.app)
    }

    /// Assert every standard invariant against this view and the contract.
    pub fn check(&self, context: &str) {
        let snapshot = SystemSnapshot::single(self.snapshot()).with_contract(self.network.snapshot());
        self.invariants.assert_all(&snapshot, &format!("[{}] {context}", self.label));
    }
}
