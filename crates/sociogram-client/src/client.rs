//! Session/contract client.
//!
//! [`SessionClient`] owns the three handles the chat needs (platform
//! connection, wallet session, contract proxy) and exposes the contract's
//! operations to the view layer. It is constructed explicitly, shared behind
//! an `Arc`, and is the only writer of session state.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──initialize──▶ Connecting ──▶ SignedOut ──request_sign_in──▶ AwaitingRedirect
//!       ▲                                         ▲  │                             │
//!       │                                 sign_out│  └──────complete_sign_in───────┤
//!     reset                                       │                                ▼
//!                                                 └─────────────────────────── SignedIn
//! ```
//!
//! The contract proxy exists only while signed in. An operation that finds it
//! missing makes exactly one lazy re-initialization attempt before failing.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::{
    AccountId, CallOutcome, ClientConfig, ClientError, Message, User,
    env::Environment,
    platform::{ContractProxy, Platform, RedirectParams, SignInRedirect, Wallet},
};

/// Lifecycle state of a [`SessionClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    /// No connection attempt made yet (or after [`SessionClient::reset`]).
    Uninitialized,
    /// Connection attempt in progress.
    Connecting,
    /// Connected without a wallet session.
    SignedOut,
    /// Control handed to the wallet; waiting for the redirect parameters.
    AwaitingRedirect,
    /// Connected with a wallet session.
    SignedIn {
        /// Signed-in account.
        account_id: AccountId,
    },
}

impl ClientState {
    /// Whether the client finished connecting.
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::Uninitialized | Self::Connecting)
    }
}

/// Handles guarded together so they never disagree.
struct Session<P: Platform> {
    state: ClientState,
    wallet: Option<P::Wallet>,
    contract: Option<Arc<P::Contract>>,
}

impl<P: Platform> Session<P> {
    fn empty() -> Self {
        Self { state: ClientState::Uninitialized, wallet: None, contract: None }
    }

    fn signed_in_account(&self) -> Option<AccountId> {
        self.wallet.as_ref().filter(|w| w.is_signed_in()).and_then(Wallet::account_id)
    }
}

/// Client for the chat contract.
///
/// Generic over the [`Platform`] (NEAR RPC in production, in-memory in
/// simulation) and the [`Environment`] (wall clock, sleep, randomness).
pub struct SessionClient<P: Platform, E: Environment> {
    platform: P,
    env: E,
    config: ClientConfig,
    session: RwLock<Session<P>>,
    /// Serializes connection attempts so concurrent first calls connect once.
    connecting: Mutex<()>,
}

impl<P: Platform, E: Environment> SessionClient<P, E> {
    /// Create an uninitialized client.
    pub fn new(platform: P, env: E, config: ClientConfig) -> Self {
        Self {
            platform,
            env,
            config,
            session: RwLock::new(Session::empty()),
            connecting: Mutex::new(()),
        }
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Client environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Underlying platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ClientState {
        self.session.read().await.state.clone()
    }

    /// Connect to the platform and restore any stored session.
    ///
    /// The connection attempt races against the configured timeout; losing
    /// the race is a failure and leaves the client uninitialized. Calling this
    /// on an initialized client returns the current state.
    pub async fn initialize(&self) -> Result<ClientState, ClientError> {
        let _connecting = self.connecting.lock().await;
        {
            let mut session = self.session.write().await;
            if session.state.is_initialized() {
                return Ok(session.state.clone());
            }
            session.state = ClientState::Connecting;
        }

        tracing::debug!(network = %self.config.network_id, node = %self.config.node_url, "connecting");
        let timeout = self.config.connect_timeout;
        let connected = tokio::select! {
            result = self.platform.connect() => {
                result.map_err(|e| ClientError::Platform(e.to_string()))
            }
            () = self.env.sleep(timeout) => Err(ClientError::ConnectTimeout { elapsed: timeout }),
        };

        let mut session = self.session.write().await;
        let wallet = match connected {
            Ok(wallet) => wallet,
            Err(err) => {
                tracing::warn!(error = %err, "connection failed");
                session.state = ClientState::Uninitialized;
                return Err(err);
            },
        };

        session.wallet = Some(wallet);
        session.contract = None;
        session.state = match session.signed_in_account() {
            Some(account_id) => {
                session.contract = self.open_contract(&session);
                ClientState::SignedIn { account_id }
            },
            None => ClientState::SignedOut,
        };

        tracing::debug!(state = ?session.state, "connected");
        Ok(session.state.clone())
    }

    /// Drop every handle and return to [`ClientState::Uninitialized`].
    pub async fn reset(&self) {
        let mut session = self.session.write().await;
        *session = Session::empty();
        tracing::debug!("client reset");
    }

    /// Hand control to the wallet for sign-in.
    ///
    /// Returns the wallet page to visit. The session is established later by
    /// [`Self::complete_sign_in`].
    pub async fn request_sign_in(&self) -> Result<SignInRedirect, ClientError> {
        let mut session = self.session.write().await;
        if !session.state.is_initialized() {
            return Err(ClientError::NotInitialized);
        }
        let Some(wallet) = session.wallet.as_mut() else {
            return Err(ClientError::NotInitialized);
        };

        let redirect = wallet
            .request_sign_in(&self.config.sign_in_request())
            .map_err(|e| ClientError::Platform(e.to_string()))?;

        session.contract = None;
        session.state = ClientState::AwaitingRedirect;
        tracing::info!(url = %redirect.url, "sign-in requested");
        Ok(redirect)
    }

    /// Process the wallet's redirect parameters and establish the session.
    pub async fn complete_sign_in(&self, params: &RedirectParams) -> Result<AccountId, ClientError> {
        let mut session = self.session.write().await;
        if !session.state.is_initialized() {
            return Err(ClientError::NotInitialized);
        }
        let Some(wallet) = session.wallet.as_mut() else {
            return Err(ClientError::NotInitialized);
        };

        let account_id = wallet.complete_sign_in(params).map_err(|e| match e {
            crate::RemoteError::Rejected(message) => ClientError::InvalidRedirect(message),
            crate::RemoteError::Transport(message) => ClientError::Platform(message),
        })?;

        session.contract = self.open_contract(&session);
        session.state = ClientState::SignedIn { account_id: account_id.clone() };
        tracing::info!(account = %account_id, "signed in");
        Ok(account_id)
    }

    /// Clear the session and drop the contract proxy. Best-effort.
    pub async fn sign_out(&self) {
        let mut session = self.session.write().await;
        if let Some(wallet) = session.wallet.as_mut() {
            wallet.sign_out();
        }
        session.contract = None;
        if session.state.is_initialized() {
            session.state = ClientState::SignedOut;
        }
        tracing::info!("signed out");
    }

    /// Whether a wallet session is active. Never fails.
    pub async fn is_signed_in(&self) -> bool {
        self.session.read().await.signed_in_account().is_some()
    }

    /// Signed-in account. `None` when signed out or uninitialized.
    pub async fn current_account(&self) -> Option<AccountId> {
        self.session.read().await.signed_in_account()
    }

    /// Whether a contract proxy is currently held.
    pub async fn has_contract(&self) -> bool {
        self.session.read().await.contract.is_some()
    }

    /// Register a username for the signed-in account.
    pub async fn register_username(&self, username: &str) -> Result<CallOutcome, ClientError> {
        if username.trim().is_empty() {
            return Err(ClientError::InvalidInput("username must not be empty"));
        }
        let contract = self.signed_in_contract().await?;

        let outcome = contract.register_user(username).await.map_err(ClientError::from)?;
        tracing::info!(%username, "username registered");
        Ok(outcome)
    }

    /// Registered users in contract order. Empty when unavailable.
    pub async fn list_users(&self) -> Vec<User> {
        let contract = match self.contract().await {
            Ok(contract) => contract,
            Err(err) => {
                tracing::debug!(error = %err, "list_users without contract");
                return Vec::new();
            },
        };

        match contract.view_users().await {
            Ok(listing) => listing
                .into_iter()
                .map(|(account_id, username)| User::from_listing(account_id, &username))
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "view_users failed");
                Vec::new()
            },
        }
    }

    /// Every message sent or received by `account`. Empty on any failure.
    pub async fn get_messages(&self, account: &AccountId) -> Vec<Message> {
        let contract = match self.contract().await {
            Ok(contract) => contract,
            Err(err) => {
                tracing::debug!(error = %err, "get_messages without contract");
                return Vec::new();
            },
        };

        match contract.get_messages(account).await {
            Ok(messages) => {
                tracing::debug!(%account, count = messages.len(), "messages fetched");
                messages
            },
            Err(err) => {
                tracing::warn!(%account, error = %err, "get_messages failed");
                Vec::new()
            },
        }
    }

    /// Send `content` to `receiver` from the signed-in account.
    pub async fn send_message(
        &self,
        receiver: &AccountId,
        content: &str,
    ) -> Result<CallOutcome, ClientError> {
        if content.trim().is_empty() {
            return Err(ClientError::InvalidInput("message must not be empty"));
        }
        let contract = self.signed_in_contract().await?;

        let outcome = contract.send_message(receiver, content).await.map_err(ClientError::from)?;
        tracing::debug!(%receiver, "message accepted");
        Ok(outcome)
    }

    /// Contract proxy for a write: connect if needed, require a session.
    async fn signed_in_contract(&self) -> Result<Arc<P::Contract>, ClientError> {
        if let Err(err) = self.initialize().await {
            tracing::warn!(error = %err, "initialization failed before call");
            return Err(ClientError::ProxyUnavailable);
        }
        if !self.is_signed_in().await {
            return Err(ClientError::NotSignedIn);
        }
        self.contract().await
    }

    /// Current contract proxy, with one lazy re-initialization attempt.
    async fn contract(&self) -> Result<Arc<P::Contract>, ClientError> {
        if let Some(contract) = self.session.read().await.contract.clone() {
            return Ok(contract);
        }

        tracing::debug!("contract missing, re-initializing");
        if self.initialize().await.is_err() {
            return Err(ClientError::ProxyUnavailable);
        }

        let mut session = self.session.write().await;
        if session.contract.is_none() {
            session.contract = self.open_contract(&session);
        }
        session.contract.clone().ok_or(ClientError::ProxyUnavailable)
    }

    fn open_contract(&self, session: &Session<P>) -> Option<Arc<P::Contract>> {
        session.signed_in_account()?;
        let wallet = session.wallet.as_ref()?;
        match self.platform.open_contract(wallet, &self.config.contract_name) {
            Ok(contract) => Some(Arc::new(contract)),
            Err(err) => {
                tracing::warn!(contract = %self.config.contract_name, error = %err, "contract unavailable");
                None
            },
        }
    }
}
