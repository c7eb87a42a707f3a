//! Domain types shared by the client and the view layer.
//!
//! All of these are observed from the remote contract and never mutated
//! locally, with one exception: the display-name fallback computed for users
//! that registered without a name.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// External account identifier (e.g. `alice.testnet`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Account identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id follows the platform's account naming rules.
    ///
    /// 2 to 64 characters; dot-separated parts of lowercase letters and
    /// digits, where `-` or `_` may only sit between two of those.
    pub fn is_valid(&self) -> bool {
        (2..=64).contains(&self.0.len()) && self.0.split('.').all(valid_part)
    }

    /// Deterministic short name: everything before the first `.`.
    ///
    /// `alice.testnet` becomes `alice`; an id without a dot is returned whole.
    pub fn short_name(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

fn valid_part(part: &str) -> bool {
    let bytes = part.as_bytes();
    let separator = |b: &u8| matches!(b, b'-' | b'_');
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    bytes.first().is_some_and(alnum)
        && bytes.last().is_some_and(alnum)
        && bytes.iter().all(|b| alnum(b) || separator(b))
        && !bytes.windows(2).any(|pair| separator(&pair[0]) && separator(&pair[1]))
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A registered user as listed by the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique external identity.
    pub account_id: AccountId,
    /// Name shown in the contact list.
    pub display_name: String,
}

impl User {
    /// Build a user from a `(account_id, username)` listing pair.
    ///
    /// An empty or whitespace-only username falls back to the account's
    /// short name.
    pub fn from_listing(account_id: AccountId, username: &str) -> Self {
        let display_name = if username.trim().is_empty() {
            account_id.short_name().to_owned()
        } else {
            username.to_owned()
        };
        Self { account_id, display_name }
    }
}

/// A chat message as stored by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sending account.
    pub sender: AccountId,
    /// Receiving account.
    pub receiver: AccountId,
    /// Message text.
    pub content: String,
    /// Nanoseconds since the Unix epoch. `0` when the contract did not record
    /// one.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: u64,
}

impl Message {
    /// Check whether the unordered `{sender, receiver}` pair equals `{a, b}`.
    pub fn is_between(&self, a: &AccountId, b: &AccountId) -> bool {
        (self.sender == *a && self.receiver == *b) || (self.sender == *b && self.receiver == *a)
    }

    /// Timestamp in milliseconds, `None` if unknown.
    pub fn timestamp_millis(&self) -> Option<u64> {
        (self.timestamp != 0).then(|| self.timestamp / 1_000_000)
    }
}

/// Filter a message list down to the thread between `a` and `b`.
///
/// Keeps the original order. Messages whose unordered pair is anything other
/// than exactly `{a, b}` are dropped, so unrelated conversations never leak
/// into the thread.
pub fn thread_between<'a, I>(messages: I, a: &AccountId, b: &AccountId) -> Vec<Message>
where
    I: IntoIterator<Item = &'a Message>,
{
    messages.into_iter().filter(|m| m.is_between(a, b)).cloned().collect()
}

/// Result of an accepted change call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallOutcome {
    /// Transaction hash, when the platform reports one.
    pub transaction_hash: Option<String>,
    /// Raw return value of the contract method (usually empty).
    pub return_value: Vec<u8>,
}

/// U64 values are JSON strings on some contract platforms; accept both.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Missing(Option<()>),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        Raw::Missing(_) => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: &str, receiver: &str, content: &str, timestamp: u64) -> Message {
        Message {
            sender: sender.into(),
            receiver: receiver.into(),
            content: content.into(),
            timestamp,
        }
    }

    #[test]
    fn short_name_strips_network_suffix() {
        assert_eq!(AccountId::from("alice.testnet").short_name(), "alice");
        assert_eq!(AccountId::from("bob").short_name(), "bob");
        assert_eq!(AccountId::from("a.b.near").short_name(), "a");
    }

    #[test]
    fn account_id_validation_follows_naming_rules() {
        let implicit = "ab".repeat(32);
        for valid in ["alice.testnet", "bo", "a-b_c.near", implicit.as_str()] {
            assert!(AccountId::from(valid).is_valid(), "{valid}");
        }
        let oversized = "a".repeat(65);
        let invalid = [
            "", "a", "../escaped", "Alice.testnet", "a..b", ".alice", "alice.", "a--b", "-a", "a/b",
            "a b", &oversized,
        ];
        for invalid in invalid {
            assert!(!AccountId::from(invalid).is_valid(), "{invalid}");
        }
    }

    #[test]
    fn empty_username_falls_back_to_short_name() {
        let user = User::from_listing("carol.testnet".into(), "");
        assert_eq!(user.display_name, "carol");

        let user = User::from_listing("carol.testnet".into(), "Carol");
        assert_eq!(user.display_name, "Carol");
    }

    #[test]
    fn thread_excludes_third_party_messages() {
        let alice = AccountId::from("alice.testnet");
        let bob = AccountId::from("bob.testnet");
        let history = vec![
            msg("alice.testnet", "bob.testnet", "hi", 1),
            msg("carol.testnet", "bob.testnet", "hey", 2),
            msg("bob.testnet", "alice.testnet", "yo", 3),
        ];

        let thread = thread_between(&history, &alice, &bob);

        assert_eq!(thread, vec![
            msg("alice.testnet", "bob.testnet", "hi", 1),
            msg("bob.testnet", "alice.testnet", "yo", 3),
        ]);
    }

    #[test]
    fn timestamp_decodes_from_number_string_or_absence() {
        let n: Message = serde_json::from_str(
            r#"{"sender":"a","receiver":"b","content":"x","timestamp":1700000000000000000}"#,
        )
        .unwrap();
        assert_eq!(n.timestamp, 1_700_000_000_000_000_000);

        let s: Message = serde_json::from_str(
            r#"{"sender":"a","receiver":"b","content":"x","timestamp":"42"}"#,
        )
        .unwrap();
        assert_eq!(s.timestamp, 42);

        let missing: Message =
            serde_json::from_str(r#"{"sender":"a","receiver":"b","content":"x"}"#).unwrap();
        assert_eq!(missing.timestamp, 0);
        assert_eq!(missing.timestamp_millis(), None);
    }
}
