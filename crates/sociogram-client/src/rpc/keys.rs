//! Ed25519 access keys in the platform's text encoding.
//!
//! Keys travel as `ed25519:<base58>`: 32 public-key bytes for public keys,
//! 64 bytes (seed followed by public key) for secret keys.

use ed25519_dalek::{Signer, SigningKey};
use thiserror::Error;

/// Curve prefix of every key string.
pub const ED25519_PREFIX: &str = "ed25519:";

/// Key encoding and storage errors.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Malformed base58 text.
    #[error("invalid base58: {0}")]
    InvalidBase58(#[from] bs58::decode::Error),

    /// Key string without the `ed25519:` prefix.
    #[error("unsupported key type in {0:?}")]
    UnsupportedKeyType(String),

    /// Decoded key had the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required length.
        expected: usize,
        /// Decoded length.
        actual: usize,
    },

    /// Account id that breaks the platform's naming rules.
    #[error("invalid account id {0:?}")]
    InvalidAccountId(String),

    /// Seed and public half of a secret key disagree.
    #[error("secret key does not match its public key")]
    Mismatch,

    /// Key file I/O.
    #[error("key store I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Key file contents.
    #[error("key store format: {0}")]
    Format(#[from] serde_json::Error),

    /// No home directory to place the key store in.
    #[error("no home directory for the key store")]
    NoHomeDir,
}

/// Decode an `ed25519:<base58>` string into exactly `N` bytes.
pub fn decode_prefixed<const N: usize>(text: &str) -> Result<[u8; N], KeyError> {
    let body = text
        .strip_prefix(ED25519_PREFIX)
        .ok_or_else(|| KeyError::UnsupportedKeyType(text.to_owned()))?;
    decode_fixed(body)
}

/// Decode a bare base58 string into exactly `N` bytes (block hashes).
pub fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N], KeyError> {
    let bytes = bs58::decode(text).into_vec()?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| KeyError::InvalidLength { expected: N, actual })
}

/// Ed25519 function-call key.
#[derive(Clone)]
pub struct KeyPair {
    signing: SigningKey,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair").field("public_key", &self.public_key_string()).finish()
    }
}

impl KeyPair {
    /// Derive a key pair from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { signing: SigningKey::from_bytes(&seed) }
    }

    /// Parse an `ed25519:<base58>` secret key (seed followed by public key).
    pub fn from_secret_string(text: &str) -> Result<Self, KeyError> {
        let bytes: [u8; 64] = decode_prefixed(text)?;
        let signing = SigningKey::from_keypair_bytes(&bytes).map_err(|_| KeyError::Mismatch)?;
        Ok(Self { signing })
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    /// Public key as `ed25519:<base58>`.
    pub fn public_key_string(&self) -> String {
        format!("{ED25519_PREFIX}{}", bs58::encode(self.public_key_bytes()).into_string())
    }

    /// Secret key as `ed25519:<base58>`.
    pub fn secret_key_string(&self) -> String {
        format!("{ED25519_PREFIX}{}", bs58::encode(self.signing.to_keypair_bytes()).into_string())
    }

    /// Sign `message`, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}
