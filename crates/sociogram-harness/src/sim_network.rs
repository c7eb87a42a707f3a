//! In-memory contract platform with fault injection.
//!
//! [`SimNetwork`] holds what the chat contract stores (registered users and
//! messages) and the fault switches. Each simulated user gets a
//! [`SimPlatform`] with its own wallet storage over the shared network, so
//! several users can exchange messages through one contract.
//!
//! Rejections reproduce the contract's panic texts, prefixed the way the
//! platform reports them, so error classification runs on realistic input.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use sociogram_client::{
    AccountId, CallOutcome, ContractProxy, Message, Platform, RedirectParams, RemoteError,
    SignInRedirect, SignInRequest, Wallet,
};

use crate::invariants::ContractSnapshot;

/// Prefix the platform puts in front of contract panic messages.
const PANIC_PREFIX: &str = "Smart contract panicked: ";

/// Number of calls each contract method and platform operation received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// Connection attempts.
    pub connect: usize,
    /// Contract proxies built.
    pub open_contract: usize,
    /// `view_users` calls.
    pub view_users: usize,
    /// `get_messages` calls.
    pub get_messages: usize,
    /// `register_user` calls.
    pub register_user: usize,
    /// `send_message` calls.
    pub send_message: usize,
}

impl CallCounts {
    /// Change calls (the ones that would cost gas).
    pub fn changes(&self) -> usize {
        self.register_user + self.send_message
    }
}

#[derive(Debug, Clone, Default)]
struct Faults {
    fail_connect: bool,
    connect_delay: Option<Duration>,
    fail_views: bool,
    refuse_contract: bool,
    expired: HashSet<AccountId>,
}

#[derive(Debug, Default)]
struct NetworkState {
    users: Vec<(AccountId, String)>,
    messages: Vec<Message>,
    faults: Faults,
    calls: CallCounts,
}

/// Shared contract storage and fault switches.
#[derive(Debug, Clone, Default)]
pub struct SimNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl SimNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register `account` with `username`.
    #[must_use]
    pub fn with_user(self, account: &str, username: &str) -> Self {
        self.register(account, username);
        self
    }

    /// Register `account` directly in storage, bypassing the contract.
    pub fn register(&self, account: &str, username: &str) {
        self.with_state(|s| s.users.push((AccountId::from(account), username.to_owned())));
    }

    /// Store a message directly, bypassing the contract.
    pub fn deliver(&self, sender: &str, receiver: &str, content: &str) {
        self.with_state(|s| {
            s.messages.push(Message {
                sender: sender.into(),
                receiver: receiver.into(),
                content: content.into(),
                timestamp: 0,
            });
        });
    }

    /// Registered users in contract order.
    pub fn users(&self) -> Vec<(AccountId, String)> {
        self.with_state(|s| s.users.clone())
    }

    /// Every stored message in contract order.
    pub fn messages(&self) -> Vec<Message> {
        self.with_state(|s| s.messages.clone())
    }

    /// Contract storage for invariant checking.
    pub fn snapshot(&self) -> ContractSnapshot {
        self.with_state(|s| ContractSnapshot {
            users: s.users.iter().map(|(account, _)| account.clone()).collect(),
            messages: s.messages.clone(),
        })
    }

    /// Call counters so far.
    pub fn calls(&self) -> CallCounts {
        self.with_state(|s| s.calls)
    }

    /// Make connection attempts fail.
    pub fn set_fail_connect(&self, fail: bool) {
        self.with_state(|s| s.faults.fail_connect = fail);
    }

    /// Delay every connection attempt.
    pub fn set_connect_delay(&self, delay: Option<Duration>) {
        self.with_state(|s| s.faults.connect_delay = delay);
    }

    /// Make view calls fail with a transport error.
    pub fn set_fail_views(&self, fail: bool) {
        self.with_state(|s| s.faults.fail_views = fail);
    }

    /// Refuse to build contract proxies.
    pub fn set_refuse_contract(&self, refuse: bool) {
        self.with_state(|s| s.faults.refuse_contract = refuse);
    }

    /// Revoke the function-call key of `account`: its change calls fail as
    /// if the wallet session expired.
    pub fn expire_session(&self, account: &str) {
        self.with_state(|s| {
            s.faults.expired.insert(AccountId::from(account));
        });
    }

    /// Give `account` a valid key again.
    pub fn restore_session(&self, account: &str) {
        self.with_state(|s| {
            s.faults.expired.remove(&AccountId::from(account));
        });
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut NetworkState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

/// Redirect query the wallet appends after `account` approves sign-in.
pub fn approve_redirect(account: &str) -> String {
    url::form_urlencoded::Serializer::new(String::from("?"))
        .append_pair("account_id", account)
        .append_pair("public_key", "ed25519:sim")
        .append_pair("all_keys", "ed25519:sim")
        .finish()
}

/// Simulated platform: one user's wallet storage over a shared network.
#[derive(Debug, Clone)]
pub struct SimPlatform {
    network: SimNetwork,
    storage: Arc<Mutex<Option<AccountId>>>,
}

impl SimPlatform {
    /// Platform with no stored session.
    pub fn new(network: &SimNetwork) -> Self {
        Self { network: network.clone(), storage: Arc::new(Mutex::new(None)) }
    }

    /// Platform whose wallet storage already holds a session for `account`.
    pub fn with_session(network: &SimNetwork, account: &str) -> Self {
        Self { network: network.clone(), storage: Arc::new(Mutex::new(Some(account.into()))) }
    }

    /// Account in wallet storage.
    pub fn stored_session(&self) -> Option<AccountId> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Shared network.
    pub fn network(&self) -> &SimNetwork {
        &self.network
    }
}

#[async_trait]
impl Platform for SimPlatform {
    type Wallet = SimWallet;
    type Contract = SimContract;

    async fn connect(&self) -> Result<SimWallet, RemoteError> {
        let (delay, fail) = self.network.with_state(|s| {
            s.calls.connect += 1;
            (s.faults.connect_delay, s.faults.fail_connect)
        });

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(RemoteError::Transport("simulated connection failure".into()));
        }
        Ok(SimWallet { storage: Arc::clone(&self.storage), pending: None })
    }

    fn open_contract(
        &self,
        wallet: &SimWallet,
        contract_id: &AccountId,
    ) -> Result<SimContract, RemoteError> {
        let refuse = self.network.with_state(|s| {
            s.calls.open_contract += 1;
            s.faults.refuse_contract
        });
        if refuse {
            return Err(RemoteError::Transport(format!("contract {contract_id} unavailable")));
        }

        let signer =
            wallet.account_id().ok_or_else(|| RemoteError::Rejected("wallet not signed in".into()))?;
        Ok(SimContract { network: self.network.clone(), signer })
    }
}

/// Simulated wallet over per-user storage.
#[derive(Debug)]
pub struct SimWallet {
    storage: Arc<Mutex<Option<AccountId>>>,
    pending: Option<SignInRequest>,
}

impl SimWallet {
    fn stored(&self) -> Option<AccountId> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn store(&self, account: Option<AccountId>) {
        *self.storage.lock().unwrap_or_else(PoisonError::into_inner) = account;
    }
}

impl Wallet for SimWallet {
    fn is_signed_in(&self) -> bool {
        self.stored().is_some()
    }

    fn account_id(&self) -> Option<AccountId> {
        self.stored()
    }

    fn request_sign_in(&mut self, request: &SignInRequest) -> Result<SignInRedirect, RemoteError> {
        let mut url = url::Url::parse("sim://wallet/login/")
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("success_url", &request.success_url)
            .append_pair("failure_url", &request.failure_url)
            .append_pair("contract_id", request.contract_id.as_str());
        self.pending = Some(request.clone());
        Ok(SignInRedirect { url: url.into() })
    }

    fn complete_sign_in(&mut self, params: &RedirectParams) -> Result<AccountId, RemoteError> {
        let account = params
            .account_id
            .as_deref()
            .map(AccountId::from)
            .ok_or_else(|| RemoteError::Rejected("missing account_id".into()))?;
        if self.pending.take().is_none() {
            tracing::debug!(%account, "redirect without a pending sign-in request");
        }
        self.store(Some(account.clone()));
        Ok(account)
    }

    fn sign_out(&mut self) {
        self.pending = None;
        self.store(None);
    }
}

/// Simulated contract proxy acting as `signer`.
#[derive(Debug)]
pub struct SimContract {
    network: SimNetwork,
    signer: AccountId,
}

impl SimContract {
    fn check_key(&self, faults: &Faults) -> Result<(), RemoteError> {
        if faults.expired.contains(&self.signer) {
            return Err(RemoteError::Rejected(format!(
                "no matching key pair found for {}",
                self.signer
            )));
        }
        Ok(())
    }
}

fn panicked(message: &str) -> RemoteError {
    RemoteError::Rejected(format!("{PANIC_PREFIX}{message}"))
}

fn outcome(calls: &CallCounts) -> CallOutcome {
    CallOutcome { transaction_hash: Some(format!("simtx{}", calls.changes())), return_value: vec![] }
}

#[async_trait]
impl ContractProxy for SimContract {
    async fn view_users(&self) -> Result<Vec<(AccountId, String)>, RemoteError> {
        self.network.with_state(|s| {
            s.calls.view_users += 1;
            if s.faults.fail_views {
                return Err(RemoteError::Transport("simulated view failure".into()));
            }
            Ok(s.users.clone())
        })
    }

    async fn get_messages(&self, user: &AccountId) -> Result<Vec<Message>, RemoteError> {
        self.network.with_state(|s| {
            s.calls.get_messages += 1;
            if s.faults.fail_views {
                return Err(RemoteError::Transport("simulated view failure".into()));
            }
            Ok(s
                .messages
                .iter()
                .filter(|m| m.sender == *user || m.receiver == *user)
                .cloned()
                .collect())
        })
    }

    async fn register_user(&self, username: &str) -> Result<CallOutcome, RemoteError> {
        self.network.with_state(|s| {
            s.calls.register_user += 1;
            self.check_key(&s.faults)?;
            if s.users.iter().any(|(account, _)| *account == self.signer) {
                return Err(panicked("User already registered"));
            }
            s.users.push((self.signer.clone(), username.to_owned()));
            Ok(outcome(&s.calls))
        })
    }

    async fn send_message(
        &self,
        receiver: &AccountId,
        content: &str,
    ) -> Result<CallOutcome, RemoteError> {
        self.network.with_state(|s| {
            s.calls.send_message += 1;
            self.check_key(&s.faults)?;
            let registered = |account: &AccountId| s.users.iter().any(|(a, _)| a == account);
            if !registered(&self.signer) {
                return Err(panicked("Sender not registered"));
            }
            if !registered(receiver) {
                return Err(panicked("Receiver not registered"));
            }
            s.messages.push(Message {
                sender: self.signer.clone(),
                receiver: receiver.clone(),
                content: content.to_owned(),
                timestamp: 0,
            });
            Ok(outcome(&s.calls))
        })
    }
}
