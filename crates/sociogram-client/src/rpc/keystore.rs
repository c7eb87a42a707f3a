//! File-backed key and session store.
//!
//! ```text
//! <root>/
//!   <account_id>.json              function-call key for the account
//!   pending_<public_key>.json      key generated for an in-flight sign-in
//!   <prefix>_wallet_auth_key.json  stored wallet session
//! ```
//!
//! Account ids and public keys are checked before they become file names,
//! so a hostile redirect cannot point outside the root.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::keys::{KeyError, KeyPair, decode_prefixed};
use crate::AccountId;

/// Stored wallet session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    /// Signed-in account.
    pub account_id: AccountId,
    /// Keys the wallet reported for the account.
    #[serde(default)]
    pub all_keys: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct KeyFile {
    account_id: String,
    public_key: String,
    private_key: String,
}

/// Key store rooted at one directory per network.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    root: PathBuf,
}

impl FileKeyStore {
    /// Store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location: `~/.sociogram/<network_id>`.
    pub fn for_network(network_id: &str) -> Result<Self, KeyError> {
        let home = dirs::home_dir().ok_or(KeyError::NoHomeDir)?;
        Ok(Self::new(home.join(".sociogram").join(network_id)))
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Key for `account`, if stored.
    pub fn get_key(&self, account: &AccountId) -> Result<Option<KeyPair>, KeyError> {
        self.read_key(&self.key_path(account)?)
    }

    /// Store the key for `account`.
    pub fn set_key(&self, account: &AccountId, key: &KeyPair) -> Result<(), KeyError> {
        self.write_key(&self.key_path(account)?, account.as_str(), key)
    }

    /// Delete the key for `account`. Missing keys are not an error.
    pub fn remove_key(&self, account: &AccountId) -> Result<(), KeyError> {
        remove_if_present(&self.key_path(account)?)
    }

    /// Remember a key generated for a sign-in that has not completed.
    pub fn set_pending(&self, key: &KeyPair) -> Result<(), KeyError> {
        self.write_key(&self.pending_path(&key.public_key_string())?, "", key)
    }

    /// Take (read and delete) the pending key with `public_key`.
    pub fn take_pending(&self, public_key: &str) -> Result<Option<KeyPair>, KeyError> {
        let path = self.pending_path(public_key)?;
        let key = self.read_key(&path)?;
        if key.is_some() {
            remove_if_present(&path)?;
        }
        Ok(key)
    }

    /// Stored wallet session under `prefix`.
    pub fn load_auth(&self, prefix: &str) -> Result<Option<AuthData>, KeyError> {
        match fs::read(self.auth_path(prefix)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist the wallet session under `prefix`.
    pub fn save_auth(&self, prefix: &str, auth: &AuthData) -> Result<(), KeyError> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.auth_path(prefix), serde_json::to_vec_pretty(auth)?)?;
        Ok(())
    }

    /// Delete the wallet session under `prefix`.
    pub fn clear_auth(&self, prefix: &str) -> Result<(), KeyError> {
        remove_if_present(&self.auth_path(prefix))
    }

    fn key_path(&self, account: &AccountId) -> Result<PathBuf, KeyError> {
        if !account.is_valid() {
            return Err(KeyError::InvalidAccountId(account.to_string()));
        }
        Ok(self.root.join(format!("{account}.json")))
    }

    fn pending_path(&self, public_key: &str) -> Result<PathBuf, KeyError> {
        let bytes: [u8; 32] = decode_prefixed(public_key)?;
        Ok(self.root.join(format!("pending_{}.json", bs58::encode(bytes).into_string())))
    }

    fn auth_path(&self, prefix: &str) -> PathBuf {
        self.root.join(format!("{prefix}_wallet_auth_key.json"))
    }

    fn read_key(&self, path: &Path) -> Result<Option<KeyPair>, KeyError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file: KeyFile = serde_json::from_slice(&bytes)?;
        let key = KeyPair::from_secret_string(&file.private_key)?;
        if key.public_key_string() != file.public_key {
            return Err(KeyError::Mismatch);
        }
        Ok(Some(key))
    }

    fn write_key(&self, path: &Path, account_id: &str, key: &KeyPair) -> Result<(), KeyError> {
        fs::create_dir_all(&self.root)?;
        let file = KeyFile {
            account_id: account_id.to_owned(),
            public_key: key.public_key_string(),
            private_key: key.secret_key_string(),
        };
        fs::write(path, serde_json::to_vec_pretty(&file)?)?;
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<(), KeyError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_keys_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let alice = AccountId::from("alice.testnet");
        let key = KeyPair::from_seed([1; 32]);

        FileKeyStore::new(dir.path()).set_key(&alice, &key).unwrap();
        let loaded = FileKeyStore::new(dir.path()).get_key(&alice).unwrap().unwrap();

        assert_eq!(loaded.public_key_string(), key.public_key_string());
    }

    #[test]
    fn pending_key_is_taken_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        let key = KeyPair::from_seed([2; 32]);

        store.set_pending(&key).unwrap();
        assert!(store.take_pending(&key.public_key_string()).unwrap().is_some());
        assert!(store.take_pending(&key.public_key_string()).unwrap().is_none());
    }

    #[test]
    fn traversal_account_never_leaves_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("testnet"));
        let escaped = AccountId::from("../escaped");
        let key = KeyPair::from_seed([5; 32]);

        assert!(matches!(store.set_key(&escaped, &key), Err(KeyError::InvalidAccountId(_))));
        assert!(matches!(store.get_key(&escaped), Err(KeyError::InvalidAccountId(_))));
        assert!(matches!(store.remove_key(&escaped), Err(KeyError::InvalidAccountId(_))));
        assert!(!dir.path().join("escaped.json").exists());
    }

    #[test]
    fn pending_lookup_requires_a_real_public_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("testnet"));

        assert!(store.take_pending("ed25519:../../escaped").is_err());
        assert!(store.take_pending("ed25519:sim").is_err());
        assert!(matches!(
            store.take_pending("../escaped"),
            Err(KeyError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn auth_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        let auth = AuthData { account_id: "bob.testnet".into(), all_keys: vec!["ed25519:k".into()] };

        assert_eq!(store.load_auth("sociogram").unwrap(), None);
        store.save_auth("sociogram", &auth).unwrap();
        assert_eq!(store.load_auth("sociogram").unwrap(), Some(auth));

        store.clear_auth("sociogram").unwrap();
        store.clear_auth("sociogram").unwrap();
        assert_eq!(store.load_auth("sociogram").unwrap(), None);
    }

    #[test]
    fn tampered_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        let alice = AccountId::from("alice.testnet");
        let key = KeyPair::from_seed([3; 32]);
        let other = KeyPair::from_seed([4; 32]);

        let file = KeyFile {
            account_id: "alice.testnet".into(),
            public_key: other.public_key_string(),
            private_key: key.secret_key_string(),
        };
        fs::write(dir.path().join("alice.testnet.json"), serde_json::to_vec(&file).unwrap())
            .unwrap();

        assert!(matches!(store.get_key(&alice), Err(KeyError::Mismatch)));
    }
}
