//! Redirect-based web wallet session.
//!
//! Sign-in generates a fresh key pair, stores it as pending, and sends the
//! user to the wallet's login page with the public key. When the wallet
//! redirects back, the pending key becomes the account's function-call key
//! and the session is persisted under the app key prefix.

use url::Url;

use super::{
    keys::KeyPair,
    keystore::{AuthData, FileKeyStore},
};
use crate::{
    AccountId, Environment, RemoteError,
    platform::{RedirectParams, SignInRedirect, SignInRequest, Wallet},
};

/// Wallet session backed by a [`FileKeyStore`].
#[derive(Debug)]
pub struct NearWallet<E: Environment> {
    env: E,
    keystore: FileKeyStore,
    wallet_url: String,
    app_key_prefix: String,
    auth: Option<AuthData>,
}

impl<E: Environment> NearWallet<E> {
    /// Restore the session stored under `app_key_prefix`, if any.
    pub fn restore(
        env: E,
        keystore: FileKeyStore,
        wallet_url: impl Into<String>,
        app_key_prefix: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let app_key_prefix = app_key_prefix.into();
        let auth = keystore
            .load_auth(&app_key_prefix)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        if let Some(auth) = &auth {
            tracing::debug!(account = %auth.account_id, "restored wallet session");
        }
        Ok(Self { env, keystore, wallet_url: wallet_url.into(), app_key_prefix, auth })
    }

    fn login_url(&self, request: &SignInRequest, public_key: &str) -> Result<Url, RemoteError> {
        let base = format!("{}/login/", self.wallet_url.trim_end_matches('/'));
        let mut url = Url::parse(&base).map_err(|e| RemoteError::Transport(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("success_url", &request.success_url)
                .append_pair("failure_url", &request.failure_url)
                .append_pair("contract_id", request.contract_id.as_str())
                .append_pair("public_key", public_key);
            for method in &request.methods {
                query.append_pair("methods", method);
            }
        }
        Ok(url)
    }
}

impl<E: Environment> Wallet for NearWallet<E> {
    fn is_signed_in(&self) -> bool {
        self.auth.is_some()
    }

    fn account_id(&self) -> Option<AccountId> {
        self.auth.as_ref().map(|auth| auth.account_id.clone())
    }

    fn request_sign_in(&mut self, request: &SignInRequest) -> Result<SignInRedirect, RemoteError> {
        let key = KeyPair::from_seed(self.env.random_seed());
        self.keystore.set_pending(&key).map_err(|e| RemoteError::Transport(e.to_string()))?;

        let url = self.login_url(request, &key.public_key_string())?;
        Ok(SignInRedirect { url: url.into() })
    }

    fn complete_sign_in(&mut self, params: &RedirectParams) -> Result<AccountId, RemoteError> {
        let account_id = params
            .account_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(AccountId::from)
            .ok_or_else(|| RemoteError::Rejected("missing account_id".into()))?;
        if !account_id.is_valid() {
            return Err(RemoteError::Rejected(format!("invalid account_id {account_id}")));
        }

        if let Some(public_key) = &params.public_key {
            let pending =
                self.keystore.take_pending(public_key).map_err(|e| RemoteError::Transport(e.to_string()))?;
            match pending {
                Some(key) => self
                    .keystore
                    .set_key(&account_id, &key)
                    .map_err(|e| RemoteError::Transport(e.to_string()))?,
                None => tracing::warn!(%public_key, "redirect names a key this client never generated"),
            }
        }

        let auth = AuthData { account_id: account_id.clone(), all_keys: params.all_keys.clone() };
        self.keystore
            .save_auth(&self.app_key_prefix, &auth)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        self.auth = Some(auth);
        Ok(account_id)
    }

    fn sign_out(&mut self) {
        if let Some(auth) = self.auth.take()
            && let Err(err) = self.keystore.remove_key(&auth.account_id)
        {
            tracing::warn!(error = %err, "failed to remove account key");
        }
        if let Err(err) = self.keystore.clear_auth(&self.app_key_prefix) {
            tracing::warn!(error = %err, "failed to clear stored session");
        }
    }
}
