//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use sociogram_app::Delivery;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// The open thread only holds messages between the signed-in account and the
/// selected peer.
///
/// Every entry's unordered `{sender, receiver}` pair must equal
/// `{account, selected}`. With no selection the thread must be empty.
pub struct ThreadMatchesSelection;

impl Invariant for ThreadMatchesSelection {
    fn name(&self) -> &'static str {
        "thread_matches_selection"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for view in &state.views {
            let (Some(me), Some(peer)) = (&view.account, &view.selected) else {
                if !view.thread.is_empty() {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "{}: {} thread entries without a selected peer",
                            view.label,
                            view.thread.len()
                        ),
                    });
                }
                continue;
            };

            if let Some((stray, _)) = view.thread.iter().find(|(m, _)| !m.is_between(me, peer)) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}: thread {me}<->{peer} holds {} -> {} {:?}",
                        view.label, stray.sender, stray.receiver, stray.content
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The selected peer is one of the listed contacts.
pub struct SelectedPeerInContacts;

impl Invariant for SelectedPeerInContacts {
    fn name(&self) -> &'static str {
        "selected_peer_in_contacts"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for view in &state.views {
            if let Some(peer) = &view.selected
                && !view.contacts.contains(peer)
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}: selected {peer} not in contacts {:?}",
                        view.label, view.contacts
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The signed-in account never appears among its own contacts.
pub struct SelfNotInContacts;

impl Invariant for SelfNotInContacts {
    fn name(&self) -> &'static str {
        "self_not_in_contacts"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for view in &state.views {
            if let Some(me) = &view.account
                && view.contacts.contains(me)
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{}: {me} listed as its own contact", view.label),
                });
            }
        }
        Ok(())
    }
}

/// A view without a session holds no contacts, selection, thread or pending
/// calls.
pub struct SignedOutHasEmptyView;

impl Invariant for SignedOutHasEmptyView {
    fn name(&self) -> &'static str {
        "signed_out_has_empty_view"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for view in &state.views {
            if view.account.is_none() && view.has_session_state() {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}: signed out with {} contacts, selection {:?}, {} thread entries, {} pending",
                        view.label,
                        view.contacts.len(),
                        view.selected,
                        view.thread.len(),
                        view.in_flight.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Confirmed thread entries exist in contract storage.
///
/// Only optimistic entries may be missing. Skipped when the snapshot carries
/// no contract storage.
pub struct ConfirmedMessagesStored;

impl Invariant for ConfirmedMessagesStored {
    fn name(&self) -> &'static str {
        "confirmed_messages_stored"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(contract) = &state.contract else {
            return Ok(());
        };

        for view in &state.views {
            let missing = view
                .thread
                .iter()
                .filter(|(_, delivery)| *delivery == Delivery::Confirmed)
                .find(|(m, _)| !contract.messages.contains(m));
            if let Some((m, _)) = missing {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{}: confirmed {} -> {} {:?} not stored",
                        view.label, m.sender, m.receiver, m.content
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sociogram_client::{AccountId, Message};

    use super::*;
    use crate::invariants::{ContractSnapshot, ViewSnapshot};

    fn msg(sender: &str, receiver: &str) -> Message {
        Message { sender: sender.into(), receiver: receiver.into(), content: "x".into(), timestamp: 0 }
    }

    fn view() -> ViewSnapshot {
        ViewSnapshot {
            label: "alice".into(),
            account: Some(AccountId::from("alice")),
            contacts: vec!["bob".into(), "carol".into()],
            selected: Some("bob".into()),
            ..Default::default()
        }
    }

    #[test]
    fn thread_with_third_party_message_violates() {
        let mut v = view();
        v.thread = vec![(msg("alice", "bob"), Delivery::Confirmed), (msg("carol", "bob"), Delivery::Confirmed)];

        let result = ThreadMatchesSelection.check(&SystemSnapshot::single(v));
        assert!(result.is_err());
    }

    #[test]
    fn thread_in_both_directions_passes() {
        let mut v = view();
        v.thread = vec![(msg("alice", "bob"), Delivery::Confirmed), (msg("bob", "alice"), Delivery::Optimistic)];

        assert!(ThreadMatchesSelection.check(&SystemSnapshot::single(v)).is_ok());
    }

    #[test]
    fn selection_outside_contacts_violates() {
        let mut v = view();
        v.selected = Some("mallory".into());
        assert!(SelectedPeerInContacts.check(&SystemSnapshot::single(v)).is_err());
    }

    #[test]
    fn self_in_contacts_violates() {
        let mut v = view();
        v.contacts.push("alice".into());
        assert!(SelfNotInContacts.check(&SystemSnapshot::single(v)).is_err());
    }

    #[test]
    fn leftover_state_after_sign_out_violates() {
        let mut v = view();
        v.account = None;
        assert!(SignedOutHasEmptyView.check(&SystemSnapshot::single(v)).is_err());
    }

    #[test]
    fn optimistic_entries_need_not_be_stored() {
        let mut v = view();
        v.thread = vec![(msg("alice", "bob"), Delivery::Optimistic)];
        let snapshot = SystemSnapshot::single(v.clone()).with_contract(ContractSnapshot::default());
        assert!(ConfirmedMessagesStored.check(&snapshot).is_ok());

        v.thread = vec![(msg("alice", "bob"), Delivery::Confirmed)];
        let snapshot = SystemSnapshot::single(v).with_contract(ContractSnapshot::default());
        assert!(ConfirmedMessagesStored.check(&snapshot).is_err());
    }
}
