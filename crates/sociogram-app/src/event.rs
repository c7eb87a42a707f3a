//! Application input events.
//!
//! Events originate from two sources:
//! - the driver (keyboard, resize, ticks);
//! - the bridge, reporting the result of a remote call.

use sociogram_client::{AccountId, ClientError, Message, User};

use crate::KeyInput;

/// Events processed by the App state machine.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard input.
    Key(KeyInput),

    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Connection established.
    Initialized {
        /// Restored session, if any.
        account: Option<AccountId>,
    },

    /// Connection attempt failed.
    ConnectFailed {
        /// Error description.
        message: String,
    },

    /// The wallet page is ready for the user.
    SignInStarted {
        /// Wallet URL.
        url: String,
    },

    /// Session established.
    SignedIn {
        /// Signed-in account.
        account: AccountId,
    },

    /// Sign-in could not start or complete.
    SignInFailed {
        /// Error description.
        message: String,
    },

    /// Session ended.
    SignedOut,

    /// Contact listing fetched (empty when unavailable).
    UsersLoaded {
        /// Users in contract order.
        users: Vec<User>,
    },

    /// Full, unfiltered message list fetched for the thread with `peer`.
    MessagesLoaded {
        /// Peer the fetch was made for.
        peer: AccountId,
        /// Every message of the signed-in account.
        messages: Vec<Message>,
    },

    /// A send call was accepted.
    MessageSent {
        /// Receiving account.
        receiver: AccountId,
        /// Message text.
        content: String,
        /// Client-side timestamp in nanoseconds.
        timestamp: u64,
    },

    /// A send call failed.
    SendFailed {
        /// Receiving account.
        receiver: AccountId,
        /// Classified failure.
        error: ClientError,
    },

    /// Registration accepted.
    Registered {
        /// Registered username.
        username: String,
    },

    /// Registration failed.
    RegisterFailed {
        /// Classified failure.
        error: ClientError,
    },

    /// Error with no more specific event.
    Error {
        /// Error description.
        message: String,
    },
}
