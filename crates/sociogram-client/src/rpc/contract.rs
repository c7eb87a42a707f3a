//! Chat contract proxy over JSON-RPC.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::{Mutex, MutexGuard};

use super::{
    jsonrpc::JsonRpcClient,
    keystore::FileKeyStore,
    transaction::{Action, FunctionCall, PublicKey, Transaction},
};
use crate::{AccountId, CallOutcome, ContractProxy, Message, RemoteError};

/// One-at-a-time gate for change calls signed with the same key.
///
/// A change call holds the gate from the access-key read until its
/// broadcast returns, and remembers the last nonce it handed out, so two
/// sends never sign with the same nonce even when the node's view lags.
#[derive(Debug, Clone, Default)]
pub struct SubmitQueue {
    last_nonce: Arc<Mutex<Option<u64>>>,
}

impl SubmitQueue {
    /// Wait for the gate.
    pub async fn acquire(&self) -> NonceSlot<'_> {
        NonceSlot { last_nonce: self.last_nonce.lock().await }
    }
}

/// Held gate of a [`SubmitQueue`].
#[derive(Debug)]
pub struct NonceSlot<'a> {
    last_nonce: MutexGuard<'a, Option<u64>>,
}

impl NonceSlot<'_> {
    /// Nonce for the next transaction, above both `chain_nonce` and
    /// every nonce handed out before.
    pub fn next(&mut self, chain_nonce: u64) -> u64 {
        let nonce = self.last_nonce.map_or(chain_nonce, |last| last.max(chain_nonce)) + 1;
        *self.last_nonce = Some(nonce);
        nonce
    }
}

/// Contract proxy acting as one signed-in account.
#[derive(Debug, Clone)]
pub struct NearContract {
    rpc: JsonRpcClient,
    keystore: FileKeyStore,
    signer: AccountId,
    contract_id: AccountId,
    gas: u64,
    deposit: u128,
    submit: SubmitQueue,
}

impl NearContract {
    /// Proxy for `contract_id`, signing change calls as `signer`.
    ///
    /// Proxies sharing `submit` take turns submitting.
    pub fn new(
        rpc: JsonRpcClient,
        keystore: FileKeyStore,
        signer: AccountId,
        contract_id: AccountId,
        gas: u64,
        deposit: u128,
        submit: SubmitQueue,
    ) -> Self {
        Self { rpc, keystore, signer, contract_id, gas, deposit, submit }
    }

    async fn view<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T, RemoteError> {
        let bytes = self.rpc.call_function(self.contract_id.as_str(), method, &args).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| RemoteError::Transport(format!("{method} returned malformed JSON: {e}")))
    }

    async fn change(&self, method: &str, args: Value) -> Result<CallOutcome, RemoteError> {
        let key = self
            .keystore
            .get_key(&self.signer)
            .map_err(|e| RemoteError::Transport(e.to_string()))?
            .ok_or_else(|| {
                RemoteError::Rejected(format!("no matching key pair found for {}", self.signer))
            })?;

        let args = serde_json::to_vec(&args).map_err(|e| RemoteError::Transport(e.to_string()))?;
        let public_key = key.public_key_string();

        let mut slot = self.submit.acquire().await;
        let access = self.rpc.view_access_key(self.signer.as_str(), &public_key).await?;
        let transaction = Transaction {
            signer_id: self.signer.as_str().to_owned(),
            public_key: PublicKey::Ed25519(key.public_key_bytes()),
            nonce: slot.next(access.nonce),
            receiver_id: self.contract_id.as_str().to_owned(),
            block_hash: access.block_hash,
            actions: vec![Action::FunctionCall(FunctionCall {
                method_name: method.to_owned(),
                args,
                gas: self.gas,
                deposit: self.deposit,
            })],
        };

        let signed = transaction.sign(&key).map_err(|e| RemoteError::Transport(e.to_string()))?;
        let encoded = signed.encode().map_err(|e| RemoteError::Transport(e.to_string()))?;
        tracing::debug!(
            %method,
            nonce = signed.transaction.nonce,
            tx = %signed.hash_string(),
            "submitting transaction"
        );
        let mut outcome = self.rpc.broadcast_tx_commit(&encoded).await?;
        drop(slot);
        outcome.transaction_hash.get_or_insert_with(|| signed.hash_string());
        Ok(outcome)
    }
}

#[async_trait]
impl ContractProxy for NearContract {
    async fn view_users(&self) -> Result<Vec<(AccountId, String)>, RemoteError> {
        self.view("view_users", json!({})).await
    }

    async fn get_messages(&self, user: &AccountId) -> Result<Vec<Message>, RemoteError> {
        self.view("get_messages", json!({ "user": user })).await
    }

    async fn register_user(&self, username: &str) -> Result<CallOutcome, RemoteError> {
        self.change("register_user", json!({ "username": username })).await
    }

    async fn send_message(
        &self,
        receiver: &AccountId,
        content: &str,
    ) -> Result<CallOutcome, RemoteError> {
        self.change("send_message", json!({ "receiver": receiver, "content": content })).await
    }
}
