//! View properties checked after every step of a simulated session.
//!
//! A [`SystemSnapshot`] captures what the user sees (one [`ViewSnapshot`]
//! per simulated user) and, optionally, what the contract stores. Each
//! [`Invariant`] inspects a snapshot and names what is wrong with it, if
//! anything. [`InvariantRegistry::standard`] bundles the chat view rules.
//!
//! ```ignore
//! let rules = InvariantRegistry::standard();
//! let snapshot = SystemSnapshot::single(ViewSnapshot::from_app("alice", &app));
//! rules.check_all(&snapshot)?;
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    ConfirmedMessagesStored, SelectedPeerInContacts, SelfNotInContacts, SignedOutHasEmptyView,
    ThreadMatchesSelection,
};
pub use snapshot::{ContractSnapshot, SystemSnapshot, ViewSnapshot};
use thiserror::Error;

/// Outcome of one rule against one snapshot.
pub type InvariantResult = Result<(), Violation>;

/// A broken rule and what broke it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{invariant}: {message}")]
pub struct Violation {
    /// Rule name.
    pub invariant: &'static str,
    /// Offending state, in words.
    pub message: String,
}

/// Every rule a snapshot broke, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(pub Vec<Violation>);

impl std::error::Error for Violations {}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// A rule over chat view snapshots.
pub trait Invariant: Send + Sync {
    /// Short name used in failure output.
    fn name(&self) -> &'static str;

    /// Inspect `state`.
    ///
    /// # Errors
    ///
    /// A [`Violation`] naming the offending account, peer, or message.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Ordered set of rules run together.
#[derive(Default)]
pub struct InvariantRegistry {
    rules: Vec<Box<dyn Invariant>>,
}

impl fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|rule| rule.name())).finish()
    }
}

impl InvariantRegistry {
    /// No rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// The chat view rules:
    ///
    /// - [`ThreadMatchesSelection`]
    /// - [`SelectedPeerInContacts`]
    /// - [`SelfNotInContacts`]
    /// - [`SignedOutHasEmptyView`]
    /// - [`ConfirmedMessagesStored`]
    pub fn standard() -> Self {
        Self::new()
            .with(ThreadMatchesSelection)
            .with(SelectedPeerInContacts)
            .with(SelfNotInContacts)
            .with(SignedOutHasEmptyView)
            .with(ConfirmedMessagesStored)
    }

    /// Append `rule`, builder style.
    #[must_use]
    pub fn with(mut self, rule: impl Invariant + 'static) -> Self {
        self.add(rule);
        self
    }

    /// Append `rule`.
    pub fn add(&mut self, rule: impl Invariant + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Run every rule against `state`.
    ///
    /// # Errors
    ///
    /// Every broken rule, not just the first.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Violations> {
        let broken: Vec<_> = self.rules.iter().filter_map(|rule| rule.check(state).err()).collect();
        if broken.is_empty() { Ok(()) } else { Err(Violations(broken)) }
    }

    /// [`check_all`](Self::check_all) for tests: fail loudly, tagged with
    /// `context`.
    ///
    /// # Panics
    ///
    /// When any rule is broken.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            panic!("{context}: {violations}");
        }
    }

    /// Rule count.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True with no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use sociogram_client::AccountId;

    use super::*;

    #[test]
    fn standard_rules_are_registered_in_order() {
        let rules = InvariantRegistry::standard();
        assert_eq!(rules.len(), 5);
        assert_eq!(
            format!("{rules:?}"),
            format!(
                "{:?}",
                [
                    ThreadMatchesSelection.name(),
                    SelectedPeerInContacts.name(),
                    SelfNotInContacts.name(),
                    SignedOutHasEmptyView.name(),
                    ConfirmedMessagesStored.name(),
                ]
            )
        );
    }

    #[test]
    fn nothing_to_see_breaks_nothing() {
        assert!(InvariantRegistry::standard().check_all(&SystemSnapshot::empty()).is_ok());
    }

    #[test]
    fn every_broken_rule_is_reported() {
        let view = ViewSnapshot {
            account: Some(AccountId::from("alice")),
            contacts: vec!["alice".into()],
            selected: Some("mallory".into()),
            ..Default::default()
        };

        let violations =
            InvariantRegistry::standard().check_all(&SystemSnapshot::single(view)).unwrap_err();
        let names: Vec<_> = violations.0.iter().map(|v| v.invariant).collect();
        assert!(names.contains(&SelectedPeerInContacts.name()));
        assert!(names.contains(&SelfNotInContacts.name()));
        assert!(violations.to_string().contains("; "));
    }
}
