//! Application side-effects and intents.
//!
//! [`AppAction`]s are instructions produced by the [`crate::App`] state
//! machine. Local ones (render, quit, open the wallet page) go to the
//! [`crate::Driver`]; remote ones go to the [`crate::Bridge`].

use sociogram_client::AccountId;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Show the wallet page the user must visit to sign in.
    OpenWallet {
        /// Wallet URL.
        url: String,
    },

    /// Connect to the platform and restore any stored session.
    Initialize,

    /// Start the redirect sign-in.
    RequestSignIn,

    /// Process the wallet's redirect.
    CompleteSignIn {
        /// Redirect URL or bare query string.
        redirect: String,
    },

    /// End the session.
    SignOut,

    /// Register a username for the signed-in account.
    RegisterUsername {
        /// Requested username.
        username: String,
    },

    /// Fetch the contact listing.
    LoadUsers,

    /// Refetch every message of `account` for the thread with `peer`.
    LoadMessages {
        /// Signed-in account whose messages are fetched.
        account: AccountId,
        /// Peer the result is filtered for.
        peer: AccountId,
    },

    /// Send a message.
    SendMessage {
        /// Receiving account.
        receiver: AccountId,
        /// Message text.
        content: String,
    },
}

impl AppAction {
    /// Whether this action is executed by the bridge (a remote call).
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Render | Self::Quit | Self::OpenWallet { .. })
    }
}
