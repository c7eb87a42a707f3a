//! Seeded in-memory network for `--simulate`.
//!
//! Runs the full client against [`SimNetwork`] so the UI can be exercised
//! without a node or a wallet. The wallet page is a `sim://` URL; paste
//! [`approve_redirect`]'s output after `/callback` to complete sign-in, as
//! [`sign_in_notice`] tells the user on screen.

use sociogram_harness::{SimNetwork, SimPlatform, approve_redirect};

/// Accounts registered in the seeded network, with their usernames.
pub const SEED_USERS: &[(&str, &str)] =
    &[("alice.testnet", "Alice"), ("bob.testnet", "Bob"), ("carol.testnet", "")];

/// Network with a few users and a short conversation between them.
pub fn seeded_network() -> SimNetwork {
    let network = SEED_USERS
        .iter()
        .fold(SimNetwork::new(), |network, (account, name)| network.with_user(account, name));

    network.deliver("bob.testnet", "alice.testnet", "hey, are you on sociogram yet?");
    network.deliver("alice.testnet", "bob.testnet", "just signed in");
    network.deliver("carol.testnet", "alice.testnet", "welcome!");
    network.deliver("carol.testnet", "bob.testnet", "lunch tomorrow?");
    network
}

/// Simulated platform for `account`, or with empty wallet storage.
pub fn platform(network: &SimNetwork, account: Option<&str>) -> SimPlatform {
    match account {
        Some(account) => SimPlatform::with_session(network, account),
        None => SimPlatform::new(network),
    }
}

/// Redirect query that approves sign-in for `account` in the simulation.
pub fn approval_for(account: &str) -> String {
    approve_redirect(account)
}

/// On-screen instructions for signing in as `account` without a wallet.
pub fn sign_in_notice(account: &str) -> String {
    format!("Simulated wallet: /signin, then /callback {}", approval_for(account))
}
