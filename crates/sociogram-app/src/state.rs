//! Observable application state types.
//!
//! These structures are the view model: the subset of session and contract
//! state the UI renders, without any of the platform handles behind it.

use sociogram_client::{AccountId, Message};

/// Session state as seen by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected (startup, or the last connection attempt failed).
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Connected without a wallet session.
    SignedOut,
    /// Waiting for the user to approve in the wallet.
    AwaitingRedirect {
        /// Wallet page the user was sent to.
        url: String,
    },
    /// Connected with a wallet session.
    SignedIn {
        /// Signed-in account.
        account_id: AccountId,
    },
}

impl SessionState {
    /// Signed-in account, if any.
    pub fn account(&self) -> Option<&AccountId> {
        match self {
            Self::SignedIn { account_id } => Some(account_id),
            _ => None,
        }
    }

    /// Whether the client finished connecting.
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Disconnected | Self::Connecting)
    }
}

/// Whether a thread entry came from the contract or was appended locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Returned by the contract.
    Confirmed,
    /// Appended after the send call was accepted; replaced by the first
    /// refetch issued after the send.
    Optimistic,
}

/// A message in the open thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    /// Message as sent or stored.
    pub message: Message,
    /// Origin of this entry.
    pub delivery: Delivery,
}

impl ThreadMessage {
    /// Entry returned by the contract.
    pub fn confirmed(message: Message) -> Self {
        Self { message, delivery: Delivery::Confirmed }
    }

    /// Locally appended entry.
    pub fn optimistic(message: Message) -> Self {
        Self { message, delivery: Delivery::Optimistic }
    }
}

/// A remote call the view is waiting on, scoped to its target.
///
/// The view keeps at most one in flight per value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InFlight {
    /// Sign-in request.
    SignIn,
    /// Username registration for the signed-in account.
    Register,
    /// Contact listing.
    LoadUsers,
    /// Message refetch for the thread with `peer`.
    LoadMessages {
        /// Thread peer.
        peer: AccountId,
    },
    /// Message send to `receiver`.
    Send {
        /// Receiving account.
        receiver: AccountId,
    },
}

/// Follow-up queued until the connection is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterConnect {
    /// Start the wallet sign-in.
    SignIn,
    /// Process wallet redirect parameters.
    CompleteSignIn {
        /// Redirect URL or query string.
        redirect: String,
    },
}
