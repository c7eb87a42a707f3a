//! Fuzz target for contract message decoding
//!
//! `get_messages` results arrive as JSON from the node. Timestamps may be
//! numbers, decimal strings, or missing entirely.
//!
//! # Invariants
//!
//! - Decoding NEVER panics; malformed JSON is an error
//! - A decoded list filtered to any pair keeps only that pair, in order

#![no_main]

use libfuzzer_sys::fuzz_target;
use sociogram_client::{Message, thread_between};

fuzz_target!(|data: &[u8]| {
    let Ok(messages) = serde_json::from_slice::<Vec<Message>>(data) else {
        return;
    };

    let Some(first) = messages.first() else {
        return;
    };
    let (a, b) = (first.sender.clone(), first.receiver.clone());

    let thread = thread_between(&messages, &a, &b);
    assert!(thread.iter().all(|m| m.is_between(&a, &b)));
    assert!(thread.len() <= messages.len());
    assert_eq!(thread_between(&thread, &b, &a), thread);
});
