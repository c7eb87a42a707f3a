//! Function-call transactions in the platform's borsh wire layout.
//!
//! # Layout
//!
//! ```text
//! Transaction:
//!   signer_id     u32 len + utf8
//!   public_key    u8 key type + [u8; 32]
//!   nonce         u64 LE
//!   receiver_id   u32 len + utf8
//!   block_hash    [u8; 32]
//!   actions       u32 count + Action*
//!
//! Action::FunctionCall (tag 2):
//!   method_name   u32 len + utf8
//!   args          u32 len + bytes
//!   gas           u64 LE
//!   deposit       u128 LE
//!
//! SignedTransaction:
//!   transaction   (above)
//!   signature     u8 key type + [u8; 64]
//! ```
//!
//! The signature covers the SHA-256 hash of the encoded transaction.

use std::io;

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};

use super::keys::KeyPair;

/// Public key of the access key signing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub enum PublicKey {
    /// Raw ed25519 public key.
    Ed25519([u8; 32]),
}

/// Transaction signature.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub enum Signature {
    /// Ed25519 signature over the transaction hash.
    Ed25519([u8; 64]),
}

/// A single function-call action.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct FunctionCall {
    /// Contract method.
    pub method_name: String,
    /// JSON-encoded arguments.
    pub args: Vec<u8>,
    /// Prepaid gas.
    pub gas: u64,
    /// Attached deposit in yoctoNEAR.
    pub deposit: u128,
}

/// Transaction actions, in the platform's tag order.
///
/// The client only ever submits [`Action::FunctionCall`]; the variants
/// before it exist so its borsh tag comes out as 2.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub enum Action {
    /// Create the receiver account.
    CreateAccount,
    /// Deploy contract code to the receiver.
    DeployContract {
        /// Wasm bytes.
        code: Vec<u8>,
    },
    /// Call a contract method.
    FunctionCall(FunctionCall),
    /// Transfer yoctoNEAR to the receiver.
    Transfer {
        /// Amount in yoctoNEAR.
        deposit: u128,
    },
}

/// Unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct Transaction {
    /// Account signing the transaction.
    pub signer_id: String,
    /// Access key used to sign.
    pub public_key: PublicKey,
    /// Access key nonce, above every nonce the key has used.
    pub nonce: u64,
    /// Contract account.
    pub receiver_id: String,
    /// Recent block hash anchoring the transaction.
    pub block_hash: [u8; 32],
    /// Actions to execute.
    pub actions: Vec<Action>,
}

impl Transaction {
    /// Borsh-encode the transaction.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        borsh::to_vec(self)
    }

    /// SHA-256 of the encoded transaction.
    pub fn hash(&self) -> io::Result<[u8; 32]> {
        Ok(Sha256::digest(self.encode()?).into())
    }

    /// Sign with `key`.
    pub fn sign(self, key: &KeyPair) -> io::Result<SignedTransaction> {
        let hash = self.hash()?;
        let signature = Signature::Ed25519(key.sign(&hash));
        Ok(SignedTransaction { transaction: self, signature, hash })
    }
}

/// Transaction with its signature.
#[derive(Debug, Clone, BorshSerialize)]
pub struct SignedTransaction {
    /// Signed transaction.
    pub transaction: Transaction,
    /// Signature over `hash`.
    pub signature: Signature,
    /// SHA-256 of the encoded transaction.
    #[borsh(skip)]
    pub hash: [u8; 32],
}

impl SignedTransaction {
    /// Borsh-encode transaction and signature.
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        borsh::to_vec(self)
    }

    /// Transaction hash as base58 (explorer format).
    pub fn hash_string(&self) -> String {
        bs58::encode(self.hash).into_string()
    }
}
