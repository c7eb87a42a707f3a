//! Error types for the session client.
//!
//! Platforms report failures as [`RemoteError`] carrying the remote message
//! text. The client classifies rejections once, through the
//! [`REJECTION_PATTERNS`] table, into the [`ClientError`] taxonomy the view
//! layer acts on. Nothing else in the workspace inspects error strings.

use std::time::Duration;

use thiserror::Error;

/// Failure reported by a contract platform implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote call executed and was rejected (contract panic, invalid
    /// signature, missing key). Message text is passed through verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The call never reached the contract (network, HTTP, decoding).
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Remote message text.
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected(message) | Self::Transport(message) => message,
        }
    }
}

/// Classified reason for a rejected remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionKind {
    /// Signed-in account (or name) is already registered.
    AlreadyRegistered,
    /// The sending account has not registered a username.
    SenderNotRegistered,
    /// The receiving account has not registered a username.
    ReceiverNotRegistered,
    /// Any other rejection.
    Other,
}

/// What a matched substring means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The wallet session no longer holds a usable key; re-authenticate.
    SessionExpired,
    /// A rejection of the given kind.
    Rejected(RejectionKind),
}

/// Substring → classification mapping, checked in order.
///
/// Matching is case-insensitive. The first matching entry wins; messages that
/// match nothing are [`RejectionKind::Other`].
pub const REJECTION_PATTERNS: &[(&str, Classification)] = &[
    ("no matching key pair found", Classification::SessionExpired),
    ("already registered", Classification::Rejected(RejectionKind::AlreadyRegistered)),
    ("sender not registered", Classification::Rejected(RejectionKind::SenderNotRegistered)),
    ("receiver not registered", Classification::Rejected(RejectionKind::ReceiverNotRegistered)),
];

/// Classify a remote message through [`REJECTION_PATTERNS`].
pub fn classify(message: &str) -> Classification {
    let lowered = message.to_lowercase();
    REJECTION_PATTERNS
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map_or(Classification::Rejected(RejectionKind::Other), |(_, class)| *class)
}

/// Errors returned by [`crate::SessionClient`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Operation requires an initialized client.
    #[error("client not initialized")]
    NotInitialized,

    /// Operation requires an active session.
    #[error("not signed in")]
    NotSignedIn,

    /// Contract proxy could not be constructed.
    #[error("contract unavailable")]
    ProxyUnavailable,

    /// Input rejected locally before any remote call.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// The remote call failed. Message text is the platform's, verbatim.
    #[error("{message}")]
    RemoteRejected {
        /// Remote message text.
        message: String,
        /// Classified reason.
        kind: RejectionKind,
    },

    /// The remote call failed because the wallet session expired.
    #[error("session expired: {message}")]
    SessionExpired {
        /// Remote message text.
        message: String,
    },

    /// Connecting to the platform took longer than the allowed delay.
    #[error("connection attempt timed out after {elapsed:?}")]
    ConnectTimeout {
        /// How long we waited.
        elapsed: Duration,
    },

    /// Redirect parameters from the wallet were missing or malformed.
    #[error("invalid sign-in redirect: {0}")]
    InvalidRedirect(String),

    /// Platform failure outside a contract call (connect, key store).
    #[error("platform error: {0}")]
    Platform(String),
}

impl ClientError {
    /// Returns true if the caller should send the user back through sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Self::SessionExpired { .. } | Self::NotSignedIn)
    }

    /// Rejection kind, if this is a classified remote rejection.
    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            Self::RemoteRejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<RemoteError> for ClientError {
    fn from(err: RemoteError) -> Self {
        let message = err.message().to_owned();
        match classify(&message) {
            Classification::SessionExpired => Self::SessionExpired { message },
            Classification::Rejected(kind) => Self::RemoteRejected { message, kind },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_pair_is_session_expiry() {
        let err = ClientError::from(RemoteError::Rejected(
            "no matching key pair found in InMemorySigner".into(),
        ));
        assert!(matches!(err, ClientError::SessionExpired { .. }));
        assert!(err.requires_sign_in());
    }

    #[test]
    fn contract_panics_are_classified() {
        let cases = [
            ("Smart contract panicked: User already registered", RejectionKind::AlreadyRegistered),
            ("Smart contract panicked: Sender not registered", RejectionKind::SenderNotRegistered),
            (
                "Smart contract panicked: Receiver not registered",
                RejectionKind::ReceiverNotRegistered,
            ),
            ("Exceeded the prepaid gas", RejectionKind::Other),
        ];

        for (message, expected) in cases {
            let err = ClientError::from(RemoteError::Rejected(message.into()));
            assert_eq!(err.rejection_kind(), Some(expected), "{message}");
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn transport_failures_keep_their_text() {
        let err = ClientError::from(RemoteError::Transport("connection refused".into()));
        assert_eq!(err, ClientError::RemoteRejected {
            message: "connection refused".into(),
            kind: RejectionKind::Other,
        });
    }

    #[test]
    fn first_pattern_wins() {
        // Both substrings present: session expiry is checked first.
        assert_eq!(
            classify("no matching key pair found; user already registered"),
            Classification::SessionExpired
        );
    }
}
