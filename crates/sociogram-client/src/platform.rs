//! Seams to the external contract platform.
//!
//! The client never talks to a network directly. A [`Platform`] establishes
//! the connection and yields a [`Wallet`]; while the wallet holds a session,
//! the platform can open a [`ContractProxy`] for the chat contract.
//!
//! # Implementations
//!
//! - **NEAR JSON-RPC** (`rpc` feature): [`crate::rpc::NearPlatform`]
//! - **Simulation**: `sociogram_harness::SimPlatform`, in-memory with fault
//!   injection

use async_trait::async_trait;
use url::Url;

use crate::{AccountId, CallOutcome, ClientError, Message, RemoteError};

/// Remote procedures of the chat contract.
#[async_trait]
pub trait ContractProxy: Send + Sync {
    /// List registered users as `(account_id, username)` pairs.
    async fn view_users(&self) -> Result<Vec<(AccountId, String)>, RemoteError>;

    /// All messages sent or received by `user`, in contract order.
    async fn get_messages(&self, user: &AccountId) -> Result<Vec<Message>, RemoteError>;

    /// Register a username for the signed-in account.
    async fn register_user(&self, username: &str) -> Result<CallOutcome, RemoteError>;

    /// Send `content` from the signed-in account to `receiver`.
    async fn send_message(
        &self,
        receiver: &AccountId,
        content: &str,
    ) -> Result<CallOutcome, RemoteError>;
}

/// Redirect-based wallet session.
pub trait Wallet: Send + Sync {
    /// Whether a session is active.
    fn is_signed_in(&self) -> bool;

    /// Signed-in account. `None` when signed out.
    fn account_id(&self) -> Option<AccountId>;

    /// Prepare a sign-in and return the wallet page to hand control to.
    ///
    /// There is no synchronous completion: the flow resumes when the wallet
    /// redirects back and [`Wallet::complete_sign_in`] is called with the
    /// redirect parameters.
    fn request_sign_in(&mut self, request: &SignInRequest) -> Result<SignInRedirect, RemoteError>;

    /// Process the parameters the wallet appended to the success URL.
    fn complete_sign_in(&mut self, params: &RedirectParams) -> Result<AccountId, RemoteError>;

    /// Clear the session. Best-effort, never fails.
    fn sign_out(&mut self);
}

/// Connection to a contract platform.
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    /// Wallet session type.
    type Wallet: Wallet + 'static;

    /// Contract proxy type.
    type Contract: ContractProxy + 'static;

    /// Connect to the network and restore any stored wallet session.
    async fn connect(&self) -> Result<Self::Wallet, RemoteError>;

    /// Build a contract proxy acting as the wallet's signed-in account.
    fn open_contract(
        &self,
        wallet: &Self::Wallet,
        contract_id: &AccountId,
    ) -> Result<Self::Contract, RemoteError>;
}

/// Parameters of a sign-in request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRequest {
    /// Contract the function-call key is scoped to.
    pub contract_id: AccountId,
    /// Change methods the key may call.
    pub methods: Vec<String>,
    /// Redirect target on approval.
    pub success_url: String,
    /// Redirect target on rejection.
    pub failure_url: String,
}

/// Wallet page the user must visit to continue signing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRedirect {
    /// Fully built wallet URL.
    pub url: String,
}

/// Parameters the wallet appends to the success URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    /// Approved account.
    pub account_id: Option<String>,
    /// Public key the wallet added as a function-call key.
    pub public_key: Option<String>,
    /// All keys of the account, comma separated by the wallet.
    pub all_keys: Vec<String>,
}

impl RedirectParams {
    /// Parse from a full redirect URL or a bare query string.
    ///
    /// A wallet `errorCode` (user rejected, unknown error) is reported as
    /// [`ClientError::InvalidRedirect`].
    pub fn parse(input: &str) -> Result<Self, ClientError> {
        let input = input.trim();
        let query = if input.contains("://") {
            let url = Url::parse(input).map_err(|e| ClientError::InvalidRedirect(e.to_string()))?;
            url.query().unwrap_or_default().to_owned()
        } else {
            input.trim_start_matches('?').to_owned()
        };

        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "account_id" => params.account_id = Some(value.into_owned()),
                "public_key" => params.public_key = Some(value.into_owned()),
                "all_keys" => {
                    params.all_keys =
                        value.split(',').filter(|k| !k.is_empty()).map(str::to_owned).collect();
                },
                "errorCode" => {
                    return Err(ClientError::InvalidRedirect(format!(
                        "wallet reported {value}"
                    )));
                },
                _ => {},
            }
        }

        match params.account_id.as_deref() {
            None | Some("") => Err(ClientError::InvalidRedirect("missing account_id".into())),
            Some(id) if !AccountId::from(id).is_valid() => {
                Err(ClientError::InvalidRedirect(format!("invalid account_id {id:?}")))
            },
            Some(_) => Ok(params),
        }
    }
}
