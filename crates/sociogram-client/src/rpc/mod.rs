//! NEAR JSON-RPC platform.
//!
//! Connects to a node over JSON-RPC, keeps the wallet session and
//! function-call keys in a [`FileKeyStore`], and signs change calls locally.
//!
//! - [`jsonrpc`]: `query`, `status` and `broadcast_tx_commit` requests
//! - [`keys`]: ed25519 keys in `ed25519:<base58>` form
//! - [`transaction`]: borsh transaction encoding and signing
//! - [`keystore`]: on-disk keys and stored session
//! - [`wallet`]: redirect sign-in against a web wallet
//! - [`contract`]: the chat contract's view and change methods

pub mod contract;
pub mod jsonrpc;
pub mod keys;
pub mod keystore;
pub mod transaction;
pub mod wallet;

use async_trait::async_trait;

pub use self::{
    contract::{NearContract, SubmitQueue}, jsonrpc::JsonRpcClient, keys::KeyPair, keystore::FileKeyStore,
    wallet::NearWallet,
};
use crate::{AccountId, ClientConfig, Environment, Platform, RemoteError, Wallet};

/// Production platform: NEAR JSON-RPC plus a web wallet.
#[derive(Debug, Clone)]
pub struct NearPlatform<E: Environment> {
    env: E,
    rpc: JsonRpcClient,
    keystore: FileKeyStore,
    config: ClientConfig,
    submit: SubmitQueue,
}

impl<E: Environment> NearPlatform<E> {
    /// Platform with the default key store location for the network.
    pub fn new(env: E, config: ClientConfig) -> Result<Self, RemoteError> {
        let keystore = FileKeyStore::for_network(&config.network_id)
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Self::with_keystore(env, config, keystore)
    }

    /// Platform with an explicit key store.
    pub fn with_keystore(
        env: E,
        config: ClientConfig,
        keystore: FileKeyStore,
    ) -> Result<Self, RemoteError> {
        let rpc = JsonRpcClient::new(config.node_url.clone())?;
        Ok(Self { env, rpc, keystore, config, submit: SubmitQueue::default() })
    }

    /// Key store in use.
    pub fn keystore(&self) -> &FileKeyStore {
        &self.keystore
    }
}

#[async_trait]
impl<E: Environment> Platform for NearPlatform<E> {
    type Wallet = NearWallet<E>;
    type Contract = NearContract;

    async fn connect(&self) -> Result<Self::Wallet, RemoteError> {
        let chain_id = self.rpc.chain_id().await.map_err(|e| RemoteError::Transport(e.to_string()))?;
        if chain_id != self.config.network_id {
            tracing::warn!(%chain_id, network = %self.config.network_id, "node serves a different network");
        }

        NearWallet::restore(
            self.env.clone(),
            self.keystore.clone(),
            self.config.wallet_url.clone(),
            self.config.app_key_prefix.clone(),
        )
    }

    fn open_contract(
        &self,
        wallet: &Self::Wallet,
        contract_id: &AccountId,
    ) -> Result<Self::Contract, RemoteError> {
        let signer = wallet
            .account_id()
            .ok_or_else(|| RemoteError::Rejected("wallet has no signed-in account".into()))?;

        Ok(NearContract::new(
            self.rpc.clone(),
            self.keystore.clone(),
            signer,
            contract_id.clone(),
            self.config.gas,
            self.config.deposit,
            self.submit.clone(),
        ))
    }
}
