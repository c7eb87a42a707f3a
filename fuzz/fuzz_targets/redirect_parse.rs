//! Fuzz target for wallet redirect parsing
//!
//! The redirect is pasted by the user (`/callback`) or passed on the command
//! line, so it is fully untrusted.
//!
//! # Invariants
//!
//! - Parsing NEVER panics
//! - Accepted redirects always name a well-formed account
//! - Rejection classification NEVER panics on the same text

#![no_main]

use libfuzzer_sys::fuzz_target;
use sociogram_client::{AccountId, RedirectParams, classify};

fuzz_target!(|input: &str| {
    if let Ok(params) = RedirectParams::parse(input) {
        assert!(params.account_id.as_deref().is_some_and(|id| AccountId::from(id).is_valid()));
    }

    let _ = classify(input);
});
