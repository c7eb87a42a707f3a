//! Client configuration.
//!
//! Every value is externally supplied and validated only by presence: a
//! missing or unparsable variable falls back to the testnet default.

use std::time::Duration;

use crate::{AccountId, platform::SignInRequest};

/// View methods exposed by the chat contract.
pub const VIEW_METHODS: &[&str] = &["view_users", "get_messages", "get_methods"];

/// Change methods the function-call key is scoped to.
pub const CHANGE_METHODS: &[&str] = &["register_user", "send_message"];

/// Default gas attached to change calls (30 Tgas).
pub const DEFAULT_GAS: u64 = 30_000_000_000_000;

/// Default connection race delay.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable prefix.
const ENV_PREFIX: &str = "SOCIOGRAM_";

/// Network, wallet and contract settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Network identifier (`testnet`, `mainnet`).
    pub network_id: String,
    /// JSON-RPC endpoint.
    pub node_url: String,
    /// Wallet base URL used for the sign-in redirect.
    pub wallet_url: String,
    /// Helper service URL.
    pub helper_url: String,
    /// Block explorer URL (for transaction links).
    pub explorer_url: String,
    /// Chat contract account.
    pub contract_name: AccountId,
    /// Namespace for locally stored wallet data.
    pub app_key_prefix: String,
    /// Origin the wallet redirects back to.
    pub app_url: String,
    /// Gas attached to change calls.
    pub gas: u64,
    /// Deposit (yoctoNEAR) attached to change calls.
    pub deposit: u128,
    /// Upper bound on the connection attempt.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network_id: "testnet".into(),
            node_url: "https://rpc.testnet.near.org".into(),
            wallet_url: "https://testnet.mynearwallet.com".into(),
            helper_url: "https://helper.testnet.near.org".into(),
            explorer_url: "https://explorer.testnet.near.org".into(),
            contract_name: AccountId::from("swapnilparicha.testnet"),
            app_key_prefix: "sociogram".into(),
            app_url: "http://localhost:5173".into(),
            gas: DEFAULT_GAS,
            deposit: 0,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Load from `SOCIOGRAM_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (environment, tests).
    ///
    /// Keys are looked up with the `SOCIOGRAM_` prefix, e.g.
    /// `SOCIOGRAM_NODE_URL`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.trim().is_empty())
        };
        let defaults = Self::default();

        Self {
            network_id: get("NETWORK_ID").unwrap_or(defaults.network_id),
            node_url: get("NODE_URL").unwrap_or(defaults.node_url),
            wallet_url: get("WALLET_URL").unwrap_or(defaults.wallet_url),
            helper_url: get("HELPER_URL").unwrap_or(defaults.helper_url),
            explorer_url: get("EXPLORER_URL").unwrap_or(defaults.explorer_url),
            contract_name: get("CONTRACT_NAME").map_or(defaults.contract_name, AccountId::from),
            app_key_prefix: get("APP_KEY_PREFIX").unwrap_or(defaults.app_key_prefix),
            app_url: get("APP_URL").unwrap_or(defaults.app_url),
            gas: parse_or("GAS", get("GAS"), defaults.gas),
            deposit: parse_or("DEPOSIT", get("DEPOSIT"), defaults.deposit),
            connect_timeout: get("CONNECT_TIMEOUT_SECS")
                .map_or(defaults.connect_timeout, |raw| {
                    Duration::from_secs(parse_or("CONNECT_TIMEOUT_SECS", Some(raw), 10))
                }),
        }
    }

    /// Where the wallet sends the user after approving sign-in.
    pub fn success_url(&self) -> String {
        format!("{}/chat", self.app_url.trim_end_matches('/'))
    }

    /// Where the wallet sends the user after rejecting sign-in.
    pub fn failure_url(&self) -> String {
        self.app_url.trim_end_matches('/').to_owned()
    }

    /// Sign-in request for the chat contract's change methods.
    pub fn sign_in_request(&self) -> SignInRequest {
        SignInRequest {
            contract_id: self.contract_name.clone(),
            methods: CHANGE_METHODS.iter().map(|m| (*m).to_owned()).collect(),
            success_url: self.success_url(),
            failure_url: self.failure_url(),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = %name, value = %raw, "unparsable setting, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_variables_use_testnet_defaults() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.contract_name.as_str(), "swapnilparicha.testnet");
    }

    #[test]
    fn variables_override_defaults() {
        let vars: HashMap<&str, &str> = [
            ("SOCIOGRAM_NETWORK_ID", "mainnet"),
            ("SOCIOGRAM_CONTRACT_NAME", "chat.near"),
            ("SOCIOGRAM_GAS", "100000000000000"),
            ("SOCIOGRAM_CONNECT_TIMEOUT_SECS", "3"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.network_id, "mainnet");
        assert_eq!(config.contract_name.as_str(), "chat.near");
        assert_eq!(config.gas, 100_000_000_000_000);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
    }

    #[test]
    fn unparsable_numbers_fall_back() {
        let config = ClientConfig::from_lookup(|key| {
            (key == "SOCIOGRAM_DEPOSIT").then(|| "lots".to_owned())
        });
        assert_eq!(config.deposit, 0);
    }

    #[test]
    fn redirect_targets_are_same_origin() {
        let config = ClientConfig { app_url: "http://localhost:3000/".into(), ..Default::default() };
        let request = config.sign_in_request();

        assert_eq!(request.success_url, "http://localhost:3000/chat");
        assert_eq!(request.failure_url, "http://localhost:3000");
        assert_eq!(request.methods, vec!["register_user", "send_message"]);
    }
}
