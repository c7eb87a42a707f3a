//! Frozen copies of chat views and contract storage.
//!
//! Rules read these instead of a live [`App`], so one check sees one
//! moment of every view.

use sociogram_app::{App, Delivery, InFlight};
use sociogram_client::{AccountId, Message};

/// Every view under test plus, when known, the storage they read from.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-user view snapshots.
    pub views: Vec<ViewSnapshot>,
    /// Contract storage. `None` when checking views in isolation.
    pub contract: Option<ContractSnapshot>,
}

impl SystemSnapshot {
    /// No views.
    pub fn empty() -> Self {
        Self::default()
    }

    /// One view.
    pub fn single(view: ViewSnapshot) -> Self {
        Self { views: vec![view], contract: None }
    }

    /// Several views, e.g. both ends of a conversation.
    pub fn from_views(views: Vec<ViewSnapshot>) -> Self {
        Self { views, contract: None }
    }

    /// Attach contract storage.
    #[must_use]
    pub fn with_contract(mut self, contract: ContractSnapshot) -> Self {
        self.contract = Some(contract);
        self
    }
}

/// Snapshot of one user's chat view.
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    /// Label for error reporting.
    pub label: String,
    /// Signed-in account. `None` if signed out.
    pub account: Option<AccountId>,
    /// Listed contacts in display order.
    pub contacts: Vec<AccountId>,
    /// Selected peer.
    pub selected: Option<AccountId>,
    /// Open thread with each entry's origin.
    pub thread: Vec<(Message, Delivery)>,
    /// Remote calls awaiting a result.
    pub in_flight: Vec<InFlight>,
    /// Compose line.
    pub input: String,
}

impl ViewSnapshot {
    /// Capture the observable state of `app`.
    pub fn from_app(label: impl Into<String>, app: &App) -> Self {
        Self {
            label: label.into(),
            account: app.account().cloned(),
            contacts: app.contacts().iter().map(|user| user.account_id.clone()).collect(),
            selected: app.selected_peer().cloned(),
            thread: app.thread().iter().map(|m| (m.message.clone(), m.delivery)).collect(),
            in_flight: app.in_flight().cloned().collect(),
            input: app.input_buffer().to_owned(),
        }
    }

    /// Whether the snapshot holds any per-session state.
    pub fn has_session_state(&self) -> bool {
        !self.contacts.is_empty()
            || self.selected.is_some()
            || !self.thread.is_empty()
            || !self.in_flight.is_empty()
    }
}

/// Snapshot of the contract's storage.
#[derive(Debug, Clone, Default)]
pub struct ContractSnapshot {
    /// Registered accounts in contract order.
    pub users: Vec<AccountId>,
    /// Stored messages in contract order.
    pub messages: Vec<Message>,
}
